//! CLI integration tests.
//!
//! Each module drives the compiled `layersync` binary against fixture
//! documents in an isolated temp directory.

mod common;
mod info_tests;
mod plan_tests;
mod run_tests;
