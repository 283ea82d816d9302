//! Netlist data model, normalization and connectivity analysis.

pub mod classify;
pub mod graph;
pub mod normalize;
pub mod schema;
pub mod signature;

// Re-export for convenience
pub use classify::{is_ground_name, is_positive_power_name};
pub use graph::{AttachmentKind, AttachmentProfile, ConnectivityGraph};
pub use signature::{
    box_signature, equivalent_ports, is_two_pin_shape, pin_signature, shape_prefix,
};
pub use normalize::{
    normalize, NetlistError, NetlistTransform, NormalizedBox, NormalizedConnection,
    NormalizedNet, NormalizedNetlist, NormalizedPort,
};
pub use schema::{BoxSpec, Connection, InputNetlist, Net, Port, Side, SidePins};
