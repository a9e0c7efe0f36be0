//! Golden fixture generator for the zvol integration tests.
//!
//! Writes every fixture listed in [`zvol_tests::golden_fixtures`] under
//! `tests/golden/`. The payloads are stored (raw) zstd blocks, so the
//! output is byte-identical across zstd versions and matches the committed
//! files. Run it after changing the container layout:
//!
//! ```bash
//! cargo run --bin generate_golden -p zvol-tests
//! ```

#![allow(clippy::pedantic)]

use zvol_tests::golden_fixtures;

fn main() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let golden_dir = manifest_dir.join("tests/golden");

    for (name, bytes) in golden_fixtures() {
        let path = golden_dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, &bytes).unwrap();
        println!("  {name} ({} bytes)", bytes.len());
    }

    println!("golden fixtures written to {}", golden_dir.display());
}
