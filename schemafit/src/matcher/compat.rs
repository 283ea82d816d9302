//! Asymmetric netlist compatibility.
//!
//! A candidate (template) netlist is compatible with a target when
//! every target box can be placed at an acceptable score and every
//! target connection is reproducible through the committed mapping.
//! The candidate is allowed to carry additional boxes and connections
//! the target never uses: templates may be richer than any one input.

use serde::{Deserialize, Serialize};

use super::score::{match_netlists, MatchReport};
use crate::netlist::{
    equivalent_ports, normalize, ConnectivityGraph, InputNetlist, NetlistError, NetlistTransform,
    NormalizedNetlist,
};

/// Detailed outcome of a compatibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    pub compatible: bool,
    /// Per-box match report underlying the verdict.
    pub report: MatchReport,
    /// Target connections that could not be reproduced from the
    /// candidate under the committed mapping.
    pub missing_connections: usize,
}

/// Boolean compatibility test used as a fast filter before attempting
/// full adaptation.
pub fn are_compatible(candidate: &InputNetlist, target: &InputNetlist) -> Result<bool, NetlistError> {
    Ok(compatibility(candidate, target, 0)?.compatible)
}

/// Full compatibility check with an acceptable per-box score bound.
pub fn compatibility(
    candidate: &InputNetlist,
    target: &InputNetlist,
    max_box_score: u32,
) -> Result<Compatibility, NetlistError> {
    let (candidate_normalized, candidate_transform) = normalize(candidate)?;
    let (target_normalized, target_transform) = normalize(target)?;

    let report = match_netlists(&candidate_normalized, &target_normalized);

    let every_box_placed = report
        .matches
        .iter()
        .all(|m| m.candidate_box.is_some() && m.score <= max_box_score);

    let missing_connections = count_missing_connections(
        &candidate_normalized,
        &candidate_transform,
        &target_normalized,
        &target_transform,
        &report,
    );

    Ok(Compatibility {
        compatible: every_box_placed && missing_connections == 0,
        report,
        missing_connections,
    })
}

/// Count target connections with no candidate connection covering
/// their mapped port set. A candidate connection may contain extra
/// ports beyond the required ones.
fn count_missing_connections(
    candidate: &NormalizedNetlist,
    candidate_transform: &NetlistTransform,
    target: &NormalizedNetlist,
    target_transform: &NetlistTransform,
    report: &MatchReport,
) -> usize {
    let candidate_graph = &ConnectivityGraph::build(candidate);
    let mut missing = 0;

    'connections: for conn in &target.connections {
        // Translate every target port into candidate space.
        let mut required_pins: Vec<(usize, u32)> = Vec::new();
        let mut required_nets: Vec<usize> = Vec::new();

        for (target_box, target_pin) in conn.pin_ports() {
            let Some(placed) = report.candidate_for(target_box) else {
                missing += 1;
                continue 'connections;
            };
            let Some(candidate_box) = placed.candidate_box else {
                missing += 1;
                continue 'connections;
            };
            let rotated = placed
                .rotation
                .apply_sides(candidate.boxes[candidate_box].pins);
            // Target pin numbers live in the rotated layout; the
            // inverse rotation recovers the authored pin number.
            let Some(candidate_pin) = placed.rotation.inverse().map_pin(rotated, target_pin)
            else {
                missing += 1;
                continue 'connections;
            };
            required_pins.push((candidate_box, candidate_pin));
        }

        for net_index in conn.net_ports() {
            let name = target_transform.net_name(net_index).expect("valid net index");
            let Some(candidate_net) = candidate_transform.net_index(name) else {
                missing += 1;
                continue 'connections;
            };
            required_nets.push(candidate_net);
        }

        // Each required pin may be satisfied through the opposite pin
        // of a symmetric two-pin passive; the planner accepts that
        // orientation swap, so the verdict must too.
        let reproducible = candidate.connections.iter().any(|c| {
            required_pins.iter().all(|&(b, p)| {
                equivalent_ports(candidate_graph, candidate, b, p)
                    .into_iter()
                    .any(|port| c.pin_ports().any(|cp| cp == port))
            }) && required_nets
                .iter()
                .all(|&n| c.net_ports().any(|cn| cn == n))
        });
        if !reproducible {
            missing += 1;
        }
    }

    missing
}
