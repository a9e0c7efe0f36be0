use std::sync::Arc;

use crate::engine::DecoderEngine;
use crate::error::EngineError;

/// A read-only engine blueprint that can stamp out isolated instances.
///
/// The template is loaded once; every instance it produces gets fresh
/// memory, so nothing one decode does can be observed by another.
pub trait EngineTemplate: Send + Sync {
    type Instance: DecoderEngine + 'static;

    /// Create a new, independent engine instance.
    ///
    /// # Errors
    ///
    /// Implementation-defined; typically [`EngineError::Init`].
    fn instantiate(&self) -> Result<Self::Instance, EngineError>;
}

/// Where a decode call gets its engine from.
///
/// The two strategies for sharing an engine across concurrent decodes:
///
/// ```text
/// ┌────────────────┬─────────────────────────────────────────────────────┐
/// │ Source         │ Behaviour                                           │
/// ├────────────────┼─────────────────────────────────────────────────────┤
/// │ SharedEngine   │ Every call gets the same instance (one memory).     │
/// │                │ Calls serialize on the engine's internal lock.      │
/// │ IsolatedEngine │ Every call instantiates a fresh engine from a       │
/// │                │ template. Calls share nothing.                      │
/// └────────────────┴─────────────────────────────────────────────────────┘
/// ```
pub trait EngineSource: Send + Sync + 'static {
    type Engine: DecoderEngine + 'static;

    /// Engine to use for one decode call.
    ///
    /// # Errors
    ///
    /// Propagates instantiation failures of isolated sources.
    fn acquire(&self) -> Result<Arc<Self::Engine>, EngineError>;
}

/// One engine instance shared by every decode.
pub struct SharedEngine<E> {
    engine: Arc<E>,
}

impl<E> SharedEngine<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }
}

impl<E> Clone for SharedEngine<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: DecoderEngine + 'static> EngineSource for SharedEngine<E> {
    type Engine = E;

    fn acquire(&self) -> Result<Arc<E>, EngineError> {
        Ok(Arc::clone(&self.engine))
    }
}

/// A fresh engine per decode, instantiated from a shared template.
pub struct IsolatedEngine<T> {
    template: Arc<T>,
}

impl<T> IsolatedEngine<T> {
    pub fn new(template: Arc<T>) -> Self {
        Self { template }
    }
}

impl<T> Clone for IsolatedEngine<T> {
    fn clone(&self) -> Self {
        Self {
            template: Arc::clone(&self.template),
        }
    }
}

impl<T: EngineTemplate + 'static> EngineSource for IsolatedEngine<T> {
    type Engine = T::Instance;

    fn acquire(&self) -> Result<Arc<T::Instance>, EngineError> {
        self.template.instantiate().map(Arc::new)
    }
}
