//! Planning and applying the edits that reshape a template into a
//! target netlist.

pub mod applier;
pub mod ops;
pub mod planner;
pub mod router;

// Re-export for convenience
pub use applier::{apply, apply_all, AdaptIssue};
pub use ops::EditOperation;
pub use planner::{plan, EditPlan};
pub use router::{route, Route, RouteKind, RouterConfig};
