//! Metadata type registry and source path construction.

pub mod path_strategy;
pub mod registry;

pub use path_strategy::PathStrategy;
pub use registry::{MetadataDictionary, MetadataInfo, MetadataRegistry};
