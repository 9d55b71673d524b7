#![warn(missing_docs)]
//! # aviator-contract-tests
//!
//! Locates the frozen wire contracts under the workspace `contracts/`
//! directory. The validation itself lives in `tests/`.

use std::path::PathBuf;

/// Workspace `contracts/` directory.
pub fn contracts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("contracts")
}

/// Path of a schema or fixture relative to [`contracts_dir`].
pub fn contract_path(name: &str) -> PathBuf {
    contracts_dir().join(name)
}
