//! SchemaFit - netlist-to-template schematic adaptation library
//!
//! Given a target netlist and a library of template schematic models,
//! this crate matches the target's boxes against a template's, plans
//! the edit operations that reshape the template (pins, labels,
//! passives, wires), and applies them to produce an adapted model.
//!
//! # Quick Start
//!
//! ```
//! use schemafit::{AdaptOptions, SchemaFitCore};
//! use schemafit::templates::builtin;
//!
//! let templates = builtin::all();
//! let target = builtin::passthrough().to_netlist();
//!
//! let outcome = SchemaFitCore::adapt_best(
//!     &templates,
//!     &target,
//!     &AdaptOptions::default(),
//! ).unwrap();
//!
//! for op in &outcome.operations {
//!     println!("{op}");
//! }
//! ```
//!
//! # Pipeline
//!
//! - **Normalization**: string-keyed netlists become canonical
//!   index-keyed form, largest box first
//! - **Matching**: greedy largest-first box pairing with rotation
//! - **Planning**: ordered edit operations diffing template vs target
//! - **Application**: in-place model edits with grid-based wire routing

pub mod adapt;
pub mod core;
pub mod geom;
pub mod matcher;
pub mod netlist;
pub mod templates;

// Re-export main types
pub use crate::core::{AdaptError, AdaptOptions, AdaptOutcome, SchemaFitCore};
pub use adapt::{AdaptIssue, EditOperation, EditPlan, RouterConfig};
pub use geom::{PinRef, Point, Schematic};
pub use matcher::{are_compatible, match_netlists, Compatibility, MatchReport, Rotation};
pub use netlist::{normalize, InputNetlist, NetlistError, NormalizedNetlist, Side, SidePins};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AdaptError, AdaptIssue, AdaptOptions, AdaptOutcome, EditOperation, InputNetlist,
        MatchReport, Rotation, SchemaFitCore, Schematic, Side, SidePins,
    };
}
