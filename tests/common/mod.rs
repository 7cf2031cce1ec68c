#![allow(dead_code)]

pub use backend_launcher_test_utils::builders;
pub use backend_launcher_test_utils::fake_backend;
pub use backend_launcher_test_utils::fake_probe;
pub use backend_launcher_test_utils::{init_tracing, with_timeout, with_timeout_of};

use std::path::PathBuf;

/// Directory holding the sample configs shipped with the crate.
pub fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}
