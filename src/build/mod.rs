//! Build system abstraction
//!
//! The workflow rewrites the project version and verifies the build through the
//! [BuildTool] trait. [maven::Maven] drives a real `mvn` installation; tests use the
//! [crate::git::MockRepository], which also fakes the build descriptor.

pub mod maven;

pub use maven::Maven;

use crate::error::Result;

/// Build operations on the checked-out project tree.
///
/// Each call is treated as atomic: it either completes or fails as a whole.
pub trait BuildTool {
    /// Rewrite the version in the build descriptor
    fn set_version(&self, version: &str) -> Result<()>;

    /// Compile and install the project, optionally without running tests
    fn compile(&self, skip_tests: bool) -> Result<()>;

    /// Version currently written in the build descriptor
    fn current_version(&self) -> Result<String>;
}
