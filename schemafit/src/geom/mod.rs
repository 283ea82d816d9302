//! Geometric schematic model and derived queries.

pub mod extract;
pub mod model;

// Re-export for convenience
pub use extract::NetlistExtractor;
pub use model::{
    Chip, Facing, Label, ModelError, Passive, PinRef, Point, Rect, Schematic, Wire, PIN_SPACING,
};
