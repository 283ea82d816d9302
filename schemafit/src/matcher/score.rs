//! Greedy largest-first box matching and mismatch scoring.
//!
//! Target boxes are processed in canonical (largest-first) order; each
//! claims the unused candidate box and rotation with the lowest
//! mismatch score before the next target box is considered. The policy
//! is deliberately greedy and never re-optimized globally: the
//! most-connected boxes anchor the match, even when that costs a
//! smaller box a better pairing. Ties resolve to candidate discovery
//! order, then rotation order.

use serde::{Deserialize, Serialize};

use super::rotation::{valid_rotations, Rotation};
use crate::netlist::{ConnectivityGraph, NormalizedNetlist, Side};

/// Score assigned to a target box with no remaining candidate.
pub const SCORE_UNMATCHED: u32 = 1_000_000;

/// Weight of one pin of per-side count mismatch after rotation.
pub const WEIGHT_SIDE_DELTA: u32 = 10;
/// Weight of one ground/power role-attachment mismatch.
pub const WEIGHT_ROLE_MISMATCH: u32 = 4;
/// Weight of one unit of remaining attachment-profile distance.
pub const WEIGHT_PROFILE_DELTA: u32 = 2;

/// A structural mismatch observed while scoring a pairing. Surfaced as
/// data, never as an error: callers compose scores across candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchIssue {
    /// No unused candidate box was left for this target box.
    Unmatched { target_box: usize },
    /// Side pin counts differ after rotation.
    SideCountMismatch {
        side: Side,
        candidate_pins: u32,
        target_pins: u32,
    },
    /// Ground/power attachment counts differ.
    RoleMismatch {
        candidate_roles: u32,
        target_roles: u32,
    },
    /// The boxes touch a different number of connections.
    ConnectionCountMismatch {
        candidate_connections: u32,
        target_connections: u32,
    },
}

impl std::fmt::Display for MatchIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchIssue::Unmatched { target_box } => {
                write!(f, "target box #{target_box} has no candidate")
            }
            MatchIssue::SideCountMismatch {
                side,
                candidate_pins,
                target_pins,
            } => write!(
                f,
                "{side} side has {candidate_pins} candidate pins, target needs {target_pins}"
            ),
            MatchIssue::RoleMismatch {
                candidate_roles,
                target_roles,
            } => write!(
                f,
                "ground/power attachments differ: candidate {candidate_roles}, target {target_roles}"
            ),
            MatchIssue::ConnectionCountMismatch {
                candidate_connections,
                target_connections,
            } => write!(
                f,
                "connection counts differ: candidate {candidate_connections}, target {target_connections}"
            ),
        }
    }
}

/// One target box's committed pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxMatch {
    /// Target box, by normalized index.
    pub target_box: usize,
    /// Candidate box, by normalized index; `None` when the target box
    /// could not be placed.
    pub candidate_box: Option<usize>,
    /// Rotation applied to the candidate's authored orientation.
    pub rotation: Rotation,
    pub score: u32,
    pub issues: Vec<MatchIssue>,
}

impl BoxMatch {
    pub fn is_exact(&self) -> bool {
        self.candidate_box.is_some() && self.score == 0
    }
}

/// The full result of matching a candidate netlist against a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// One entry per target box, in canonical (largest-first) order.
    pub matches: Vec<BoxMatch>,
    /// Number of boxes in the candidate netlist.
    pub candidate_box_count: usize,
}

impl MatchReport {
    pub fn total_score(&self) -> u32 {
        self.matches.iter().map(|m| m.score).sum()
    }

    pub fn is_exact(&self) -> bool {
        self.matches.iter().all(BoxMatch::is_exact)
            && self.unmatched_candidates().is_empty()
    }

    pub fn candidate_for(&self, target_box: usize) -> Option<&BoxMatch> {
        self.matches.iter().find(|m| m.target_box == target_box)
    }

    pub fn target_for(&self, candidate_box: usize) -> Option<&BoxMatch> {
        self.matches
            .iter()
            .find(|m| m.candidate_box == Some(candidate_box))
    }

    /// Candidate boxes no target box claimed. These become removal
    /// candidates for the planner.
    pub fn unmatched_candidates(&self) -> Vec<usize> {
        (0..self.candidate_box_count)
            .filter(|&c| self.target_for(c).is_none())
            .collect()
    }
}

/// Match every target box to a candidate box, allowing rotation.
///
/// Deterministic: identical inputs always produce an identical report.
pub fn match_netlists(candidate: &NormalizedNetlist, target: &NormalizedNetlist) -> MatchReport {
    let candidate_graph = ConnectivityGraph::build(candidate);
    let target_graph = ConnectivityGraph::build(target);

    let mut used = vec![false; candidate.box_count()];
    let mut matches = Vec::with_capacity(target.box_count());

    // Canonical normalized order is largest-first already.
    for target_box in 0..target.box_count() {
        let mut best: Option<(u32, usize, Rotation, Vec<MatchIssue>)> = None;

        for candidate_box in 0..candidate.box_count() {
            if used[candidate_box] {
                continue;
            }
            let rotations = valid_rotations(
                &candidate.boxes[candidate_box].pins,
                &target.boxes[target_box].pins,
            );
            for rotation in rotations {
                let (score, issues) = score_pair(
                    candidate,
                    &candidate_graph,
                    candidate_box,
                    target,
                    &target_graph,
                    target_box,
                    rotation,
                );
                // Strict less-than keeps the earliest candidate and
                // rotation on ties (discovery-order stability).
                if best.as_ref().map_or(true, |(s, _, _, _)| score < *s) {
                    best = Some((score, candidate_box, rotation, issues));
                }
            }
        }

        match best {
            Some((score, candidate_box, rotation, issues)) => {
                used[candidate_box] = true;
                tracing::debug!(
                    target_box,
                    candidate_box,
                    rotation = %rotation,
                    score,
                    "committed box match"
                );
                matches.push(BoxMatch {
                    target_box,
                    candidate_box: Some(candidate_box),
                    rotation,
                    score,
                    issues,
                });
            }
            None => {
                matches.push(BoxMatch {
                    target_box,
                    candidate_box: None,
                    rotation: Rotation::R0,
                    score: SCORE_UNMATCHED,
                    issues: vec![MatchIssue::Unmatched { target_box }],
                });
            }
        }
    }

    MatchReport {
        matches,
        candidate_box_count: candidate.box_count(),
    }
}

/// Mismatch score for pairing one candidate box (rotated) with one
/// target box. Lower is better; zero means structurally identical as
/// far as the scorer can see.
pub fn score_pair(
    candidate: &NormalizedNetlist,
    candidate_graph: &ConnectivityGraph,
    candidate_box: usize,
    target: &NormalizedNetlist,
    target_graph: &ConnectivityGraph,
    target_box: usize,
    rotation: Rotation,
) -> (u32, Vec<MatchIssue>) {
    let mut issues = Vec::new();
    let mut score = 0;

    let rotated = rotation.apply_sides(candidate.boxes[candidate_box].pins);
    let target_pins = target.boxes[target_box].pins;
    for side in Side::CCW {
        let c = rotated.count(side);
        let t = target_pins.count(side);
        if c != t {
            score += WEIGHT_SIDE_DELTA * c.abs_diff(t);
            issues.push(MatchIssue::SideCountMismatch {
                side,
                candidate_pins: c,
                target_pins: t,
            });
        }
    }

    // Attachment profiles are rotation-invariant.
    let candidate_profile = candidate_graph.profile(candidate, candidate_box);
    let target_profile = target_graph.profile(target, target_box);

    let role_delta = candidate_profile.role_distance(&target_profile);
    if role_delta > 0 {
        score += WEIGHT_ROLE_MISMATCH * role_delta;
        issues.push(MatchIssue::RoleMismatch {
            candidate_roles: candidate_profile.ground_pins + candidate_profile.power_pins,
            target_roles: target_profile.ground_pins + target_profile.power_pins,
        });
    }

    let remaining = candidate_profile.distance(&target_profile) - role_delta;
    if remaining > 0 {
        score += WEIGHT_PROFILE_DELTA * remaining;
        if candidate_profile.connection_count != target_profile.connection_count {
            issues.push(MatchIssue::ConnectionCountMismatch {
                candidate_connections: candidate_profile.connection_count,
                target_connections: target_profile.connection_count,
            });
        }
    }

    (score, issues)
}
