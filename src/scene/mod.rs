//! Per-frame scene description: node tree, styles, colours and the frame context that drives
//! scene sources.

/// Colour values and parsing.
pub mod color;
/// Frame context, scene sources and the scene registry.
pub mod context;
/// Scene node tree.
pub mod model;
/// Node style configuration.
pub mod style;
