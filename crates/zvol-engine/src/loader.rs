use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use log::debug;
use tokio::sync::watch;

use crate::config::EngineConfig;
use crate::error::{EngineError, LoadError};
use crate::zstd_engine::{ZstdEngine, ZstdTemplate};

type InitFuture<T> = Pin<Box<dyn Future<Output = Result<T, EngineError>> + Send>>;
type InitFn<T> = Box<dyn Fn() -> InitFuture<T> + Send + Sync>;
type Outcome<T> = Option<Result<Arc<T>, LoadError>>;

/// Lazily initializes a value once and hands the same `Arc` to every
/// caller.
///
/// The loader moves through three states:
///
/// ```text
///            load()               init Ok
///   Idle ───────────▶ Loading ───────────────▶ Ready
///     ▲                  │
///     └──────────────────┘
///      init Err / panic
/// ```
///
/// - **Idle**: the next `load()` spawns an initialization attempt on the
///   runtime and subscribes to it.
/// - **Loading**: later callers subscribe to the attempt in flight and
///   receive its outcome, success or failure.
/// - **Ready**: callers receive the stored value immediately.
///
/// The attempt runs on its own task, so it completes even if every caller
/// that was waiting on it has been dropped. A failed attempt is reported
/// to everyone who was waiting on it and the loader returns to `Idle`, so
/// the next call retries. If the attempt task panics or is aborted, the
/// waiters receive [`LoadError::Abandoned`] and the loader also returns to
/// `Idle`.
pub struct EngineLoader<T> {
    init: InitFn<T>,
    state: Arc<Mutex<LoadState<T>>>,
}

enum LoadState<T> {
    Idle,
    Loading(watch::Receiver<Outcome<T>>),
    Ready(Arc<T>),
}

impl<T: Send + Sync + 'static> EngineLoader<T> {
    /// Create a loader around an async initializer.
    ///
    /// The initializer runs at most once per attempt; it is not invoked
    /// until the first [`load`](Self::load).
    pub fn new<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, EngineError>> + Send + 'static,
    {
        Self {
            init: Box::new(move || Box::pin(init())),
            state: Arc::new(Mutex::new(LoadState::Idle)),
        }
    }

    /// Return the loaded value, initializing it if needed.
    ///
    /// Must be called from within a Tokio runtime. Dropping the returned
    /// future only stops this caller from waiting; the attempt keeps
    /// running for everyone else.
    ///
    /// # Errors
    ///
    /// - [`LoadError::Failed`] if the attempt this call waited on failed.
    /// - [`LoadError::Abandoned`] if that attempt panicked or was aborted
    ///   before it finished.
    pub async fn load(&self) -> Result<Arc<T>, LoadError> {
        let (mut rx, start) = {
            let mut state = lock(&self.state);
            match std::mem::replace(&mut *state, LoadState::Idle) {
                LoadState::Ready(value) => {
                    *state = LoadState::Ready(Arc::clone(&value));
                    return Ok(value);
                }
                LoadState::Loading(rx) => {
                    *state = LoadState::Loading(rx.clone());
                    (rx, None)
                }
                LoadState::Idle => {
                    let (tx, rx) = watch::channel(None);
                    *state = LoadState::Loading(rx.clone());
                    (rx, Some(tx))
                }
            }
        };

        if let Some(tx) = start {
            self.spawn_attempt(tx);
        }

        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Err(LoadError::Abandoned)),
            Err(_) => Err(LoadError::Abandoned),
        }
    }

    /// The loaded value, if initialization already completed.
    pub fn get(&self) -> Option<Arc<T>> {
        match &*lock(&self.state) {
            LoadState::Ready(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Run one initialization attempt on its own task and publish its
    /// outcome.
    fn spawn_attempt(&self, tx: watch::Sender<Outcome<T>>) {
        let mut attempt = Attempt {
            state: Arc::clone(&self.state),
            tx: Some(tx),
        };
        let init = (self.init)();

        tokio::spawn(async move {
            debug!("engine initialization started");
            let outcome = init.await.map(Arc::new).map_err(LoadError::from);

            match &outcome {
                Ok(_) => debug!("engine initialization finished"),
                Err(err) => debug!("engine initialization failed: {err}"),
            }

            attempt.finish(outcome);
        });
    }
}

fn lock<T>(state: &Mutex<LoadState<T>>) -> MutexGuard<'_, LoadState<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An initialization attempt in flight.
///
/// Dropping it without calling [`finish`](Self::finish) (the attempt task
/// panicked or was aborted) resets the loader to `Idle`; dropping the
/// sender wakes the waiters with an error.
struct Attempt<T> {
    state: Arc<Mutex<LoadState<T>>>,
    tx: Option<watch::Sender<Outcome<T>>>,
}

impl<T> Attempt<T> {
    fn finish(&mut self, outcome: Result<Arc<T>, LoadError>) {
        let Some(tx) = self.tx.take() else {
            return;
        };

        *lock(&self.state) = match &outcome {
            Ok(value) => LoadState::Ready(Arc::clone(value)),
            Err(_) => LoadState::Idle,
        };
        tx.send_replace(Some(outcome));
    }
}

impl<T> Drop for Attempt<T> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            *lock(&self.state) = LoadState::Idle;
        }
    }
}

// ── Process-wide loaders ──────────────────────────────────────────────

static ENGINE: OnceLock<EngineLoader<ZstdEngine>> = OnceLock::new();
static TEMPLATE: OnceLock<EngineLoader<ZstdTemplate>> = OnceLock::new();

/// Load the process-wide shared [`ZstdEngine`].
///
/// Every call returns the same instance. Construction runs on the
/// blocking pool so the caller's runtime is never stalled by it.
///
/// # Errors
///
/// See [`EngineLoader::load`].
pub async fn load_engine() -> Result<Arc<ZstdEngine>, LoadError> {
    ENGINE
        .get_or_init(|| {
            EngineLoader::new(|| async {
                tokio::task::spawn_blocking(|| ZstdEngine::new(EngineConfig::default()))
                    .await
                    .map_err(|e| EngineError::Init(e.to_string()))?
            })
        })
        .load()
        .await
}

/// Load the process-wide [`ZstdTemplate`] for per-call engines.
///
/// # Errors
///
/// See [`EngineLoader::load`].
pub async fn load_template() -> Result<Arc<ZstdTemplate>, LoadError> {
    TEMPLATE
        .get_or_init(|| {
            EngineLoader::new(|| async {
                tokio::task::spawn_blocking(|| ZstdTemplate::new(EngineConfig::default()))
                    .await
                    .map_err(|e| EngineError::Init(e.to_string()))?
            })
        })
        .load()
        .await
}
