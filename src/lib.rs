//! Workspace root package. Exists to host repository tooling hooks
//! (cargo-husky); all functionality lives under `crates/`.
