//! Test helpers shared by integration tests

pub mod source;

pub use source::{FakeReleaseSource, FakeUsageSource, create_test_store};
