//! Domain logic - version rules, naming and tag discovery, independent of git operations

pub mod branch;
pub mod comparator;
pub mod pattern;
pub mod registry;
pub mod tag;
pub mod version;

pub use branch::{BranchKind, BranchRef, DevBranchName};
pub use comparator::Stage;
pub use pattern::FlowPattern;
pub use registry::TagRegistry;
pub use tag::TagRef;
pub use version::VersionId;
