//! Box matching, scoring and compatibility checking.

pub mod compat;
pub mod rotation;
pub mod score;

// Re-export for convenience
pub use compat::{are_compatible, compatibility, Compatibility};
pub use rotation::{aspect_class, valid_rotations, AspectClass, Rotation};
pub use score::{match_netlists, score_pair, BoxMatch, MatchIssue, MatchReport, SCORE_UNMATCHED};
