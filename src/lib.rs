//! Chronicle - a transactional, undoable document model
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use chronicle_model as model;
pub use chronicle_stream as stream;
pub use chronicle_variant as variant;
