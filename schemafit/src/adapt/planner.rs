//! Edit-operation planning.
//!
//! The planner diffs a template's extracted netlist against a target
//! netlist, using the matcher's box correspondence, and emits the
//! ordered edits that reshape the template into the target. Ordering
//! matters: chip removals come first, then per-side pin corrections
//! (additions before removals), then label corrections, then passive
//! insertions, then new wires. Pin numbering must settle before any
//! later operation references a pin by number, so every emitted pin
//! number is computed against the numbering that will hold at the
//! moment the operation is applied.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ops::EditOperation;
use crate::geom::{PinRef, Schematic};
use crate::matcher::{match_netlists, MatchReport, Rotation};
use crate::netlist::{
    equivalent_ports, is_two_pin_shape, normalize, ConnectivityGraph, InputNetlist, NetlistError,
    NetlistTransform, NormalizedNetlist, Side, SidePins,
};

/// The ordered edits for one template-to-target adaptation, plus the
/// match report they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditPlan {
    pub operations: Vec<EditOperation>,
    pub report: MatchReport,
}

impl EditPlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Tracks one chip's pin slots as planned edits accumulate, so later
/// operations can be emitted with the pin numbers they will see at
/// application time. Each slot holds the chip's original pin number,
/// or `None` for a planned insertion.
struct PinLedger {
    slots: [Vec<Option<u32>>; 4],
}

impl PinLedger {
    fn new(pins: SidePins) -> Self {
        let mut slots: [Vec<Option<u32>>; 4] = Default::default();
        for (i, side) in Side::CCW.iter().enumerate() {
            slots[i] = pins.pins_on_side(*side).map(Some).collect();
        }
        Self { slots }
    }

    fn side_index(side: Side) -> usize {
        match side {
            Side::Left => 0,
            Side::Top => 1,
            Side::Right => 2,
            Side::Bottom => 3,
        }
    }

    fn layout(&self) -> SidePins {
        SidePins {
            left: self.slots[0].len() as u32,
            top: self.slots[1].len() as u32,
            right: self.slots[2].len() as u32,
            bottom: self.slots[3].len() as u32,
        }
    }

    fn number_at(&self, side: Side, offset: usize) -> u32 {
        let mut n = 1u32;
        for (i, s) in Side::CCW.iter().enumerate() {
            if *s == side {
                return n + offset as u32;
            }
            n += self.slots[i].len() as u32;
        }
        unreachable!("side not in CCW walk")
    }

    /// Record a planned insertion at the end of `side`'s run; returns
    /// the current number of the pin the insertion goes after, if the
    /// side is not empty.
    fn push_new(&mut self, side: Side) -> Option<u32> {
        let i = Self::side_index(side);
        let after = match self.slots[i].len() {
            0 => None,
            len => Some(self.number_at(side, len - 1)),
        };
        self.slots[i].push(None);
        after
    }

    /// Record a planned removal of the last pin on `side`; returns its
    /// current number and its original number.
    fn pop(&mut self, side: Side) -> Option<(u32, Option<u32>)> {
        let i = Self::side_index(side);
        let last = self.slots[i].len().checked_sub(1)?;
        let number = self.number_at(side, last);
        let original = self.slots[i].remove(last);
        Some((number, original))
    }

    /// Current number of an original pin, or `None` if its slot has
    /// been planned away.
    fn current_of_original(&self, original: u32) -> Option<u32> {
        for side in Side::CCW {
            let i = Self::side_index(side);
            for (offset, slot) in self.slots[i].iter().enumerate() {
                if *slot == Some(original) {
                    return Some(self.number_at(side, offset));
                }
            }
        }
        None
    }
}

/// Per-matched-box planning state carried across phases.
struct ChipPlan {
    target_box: usize,
    candidate_box: usize,
    id: String,
    rotation: Rotation,
    authored: SidePins,
    target_pins: SidePins,
    ledger: PinLedger,
}

impl ChipPlan {
    /// Candidate pin number (in post-pin-correction numbering) holding
    /// the role of target pin `pin`. Offsets within a side's CCW run
    /// are preserved by rotation, so the k-th pin of a target side maps
    /// to the k-th pin of the corresponding candidate side.
    fn pin_for_target(&self, pin: u32) -> Option<u32> {
        let (target_side, offset) = self.target_pins.locate(pin)?;
        let side = self.rotation.inverse().map_side(target_side);
        self.ledger.layout().pin_at(side, offset)
    }

    /// Original candidate pin occupying the slot of target pin `pin`,
    /// when that slot is not a planned insertion.
    fn original_for_target(&self, pin: u32) -> Option<u32> {
        let (target_side, offset) = self.target_pins.locate(pin)?;
        let side = self.rotation.inverse().map_side(target_side);
        if offset < self.authored.count(side) {
            self.authored.pin_at(side, offset)
        } else {
            None
        }
    }

    /// Target pin occupying the slot of original candidate pin `pin`.
    fn target_for_original(&self, pin: u32) -> Option<u32> {
        let (side, offset) = self.authored.locate(pin)?;
        let target_side = self.rotation.map_side(side);
        self.target_pins.pin_at(target_side, offset)
    }
}

/// Plan the edits that reshape `template` into `target`.
///
/// Planning against a template that already realizes the target yields
/// an empty operation list.
pub fn plan(template: &Schematic, target: &InputNetlist) -> Result<EditPlan, NetlistError> {
    let candidate_input = template.to_netlist();
    let (candidate, candidate_transform) = normalize(&candidate_input)?;
    let (target_norm, target_transform) = normalize(target)?;
    let report = match_netlists(&candidate, &target_norm);

    let mut operations = Vec::new();

    // Template boxes no target box claimed are torn out first, anchored
    // geometry and all.
    for candidate_box in report.unmatched_candidates() {
        let Some(id) = candidate_transform.box_id(candidate_box) else {
            continue;
        };
        operations.push(EditOperation::RemoveChip {
            box_id: id.to_string(),
        });
    }

    // Per-side pin corrections, per matched box in canonical order.
    let mut chips = Vec::new();
    for m in &report.matches {
        let Some(candidate_box) = m.candidate_box else {
            continue;
        };
        let Some(id) = candidate_transform.box_id(candidate_box) else {
            continue;
        };
        let mut chip = ChipPlan {
            target_box: m.target_box,
            candidate_box,
            id: id.to_string(),
            rotation: m.rotation,
            authored: candidate.boxes[candidate_box].pins,
            target_pins: target_norm.boxes[m.target_box].pins,
            ledger: PinLedger::new(candidate.boxes[candidate_box].pins),
        };
        plan_pin_corrections(template, &mut chip, &mut operations);
        chips.push(chip);
    }

    // Label corrections: additions, then clears, per chip.
    let target_graph = ConnectivityGraph::build(&target_norm);
    for chip in &chips {
        plan_label_corrections(
            template,
            chip,
            &chips,
            &target_norm,
            &target_graph,
            &target_transform,
            &mut operations,
        );
    }

    // Unmatched two-pin target boxes hanging off a matched pin become
    // in-line passive insertions.
    plan_passive_insertions(
        &report,
        &chips,
        &target_norm,
        &target_transform,
        &mut operations,
    );

    // New wires, last: everything they reference by pin number is
    // settled now.
    plan_wires(&candidate, &chips, &target_norm, &mut operations);

    tracing::debug!(
        operations = operations.len(),
        score = report.total_score(),
        "edit plan computed"
    );
    Ok(EditPlan { operations, report })
}

fn plan_pin_corrections(
    template: &Schematic,
    chip: &mut ChipPlan,
    operations: &mut Vec<EditOperation>,
) {
    let inverse = chip.rotation.inverse();

    // Additions before removals, target sides walked in CCW order.
    for target_side in Side::CCW {
        let side = inverse.map_side(target_side);
        let want = chip.target_pins.count(target_side);
        let have = chip.authored.count(side);
        for _ in have..want {
            let after = chip.ledger.push_new(side);
            operations.push(EditOperation::AddPinToSide {
                box_id: chip.id.clone(),
                side,
                after,
                before: None,
            });
        }
    }

    for target_side in Side::CCW {
        let side = inverse.map_side(target_side);
        let want = chip.target_pins.count(target_side);
        let have = chip.authored.count(side);
        for _ in want..have {
            let Some((number, original)) = chip.ledger.pop(side) else {
                break;
            };
            // A surplus pin with geometry attached is cleared before
            // its slot is removed.
            let in_use = original
                .map(|pin| template.pin_in_use(&PinRef::new(chip.id.clone(), pin)))
                .unwrap_or(false);
            if in_use {
                operations.push(EditOperation::ClearPin {
                    box_id: chip.id.clone(),
                    pin: number,
                });
            }
            operations.push(EditOperation::RemovePinFromSide {
                box_id: chip.id.clone(),
                side,
                pin: number,
            });
        }
    }
}

fn plan_label_corrections(
    template: &Schematic,
    chip: &ChipPlan,
    chips: &[ChipPlan],
    target: &NormalizedNetlist,
    target_graph: &ConnectivityGraph,
    target_transform: &NetlistTransform,
    operations: &mut Vec<EditOperation>,
) {
    // Stale geometry first: a surviving template pin whose label the
    // target does not carry, whose wire the target does not require,
    // or whose wiring the target never asks for at all, is cleared.
    let mut stale = Vec::new();
    for original in 1..=chip.authored.total() {
        let Some(current) = chip.ledger.current_of_original(original) else {
            continue;
        };
        let at = PinRef::new(chip.id.clone(), original);
        if !template.pin_in_use(&at) {
            continue;
        }
        let required: Vec<usize> = chip
            .target_for_original(original)
            .map(|pin| target.nets_for_pin(chip.target_box, pin))
            .unwrap_or_default();
        let target_connected = chip.target_for_original(original).is_some_and(|pin| {
            target
                .connections
                .iter()
                .any(|c| c.pin_ports().any(|(b, p)| b == chip.target_box && p == pin))
        });
        let stale_label = template.labels_at(&at).any(|label| {
            !required
                .iter()
                .any(|&n| target_transform.net_name(n) == Some(label.text.as_str()))
        });
        let stale_wire = has_stale_wire(template, chip, chips, original, target, target_graph);
        if stale_label || stale_wire || !target_connected {
            stale.push(current);
        }
    }

    // Missing labels, in target pin order. Clearing a pin wipes its
    // labels along with its wires, so a required label on a cleared
    // pin is added back after the clear.
    let mut readds = Vec::new();
    for pin in 1..=chip.target_pins.total() {
        let Some(current) = chip.pin_for_target(pin) else {
            continue;
        };
        let cleared = stale.contains(&current);
        for net_index in target.nets_for_pin(chip.target_box, pin) {
            let Some(net) = target_transform.net_name(net_index) else {
                continue;
            };
            let already = !cleared
                && chip.original_for_target(pin).is_some_and(|original| {
                    template
                        .labels_at(&PinRef::new(chip.id.clone(), original))
                        .any(|label| label.text == net)
                });
            if already {
                continue;
            }
            let op = EditOperation::AddLabelToPin {
                box_id: chip.id.clone(),
                pin: current,
                net: net.to_string(),
            };
            if cleared {
                readds.push(op);
            } else {
                operations.push(op);
            }
        }
    }

    for pin in stale {
        operations.push(EditOperation::ClearPin {
            box_id: chip.id.clone(),
            pin,
        });
    }
    operations.extend(readds);
}

/// Whether any template wire anchored at original pin `original` of
/// `chip` joins a pin pair the target never connects. Wires into chips
/// slated for removal, or into pin slots already being removed, are
/// left to those operations.
fn has_stale_wire(
    template: &Schematic,
    chip: &ChipPlan,
    chips: &[ChipPlan],
    original: u32,
    target: &NormalizedNetlist,
    target_graph: &ConnectivityGraph,
) -> bool {
    let at = PinRef::new(chip.id.clone(), original);
    for wire in template.wires_at(&at) {
        let other = match (&wire.from, &wire.to) {
            (Some(from), Some(to)) if *from == at => to,
            (Some(from), Some(to)) if *to == at => from,
            _ => continue,
        };
        let Some(other_chip) = chips.iter().find(|c| c.id == other.chip) else {
            continue;
        };
        if other_chip.ledger.current_of_original(other.pin).is_none() {
            continue;
        }
        let required = chip
            .target_for_original(original)
            .zip(other_chip.target_for_original(other.pin))
            .is_some_and(|(a, b)| {
                connection_between(
                    target,
                    target_graph,
                    (chip.target_box, a),
                    (other_chip.target_box, b),
                )
            });
        if !required {
            return true;
        }
    }
    false
}

fn plan_passive_insertions(
    report: &MatchReport,
    chips: &[ChipPlan],
    target: &NormalizedNetlist,
    target_transform: &NetlistTransform,
    operations: &mut Vec<EditOperation>,
) {
    for m in &report.matches {
        if m.candidate_box.is_some() {
            continue;
        }
        let pins = target.boxes[m.target_box].pins;
        if !is_two_pin_shape(&pins) {
            continue;
        }
        // The first connection joining this passive to a matched pin
        // names its host; further attachments are realized by the wire
        // and label phases once the passive exists.
        let host = target.connections.iter().find_map(|c| {
            if !c.touches_box(m.target_box) {
                return None;
            }
            c.pin_ports().find_map(|(b, p)| {
                chips
                    .iter()
                    .find(|chip| chip.target_box == b)
                    .and_then(|chip| chip.pin_for_target(p).map(|pin| (chip.id.clone(), pin)))
            })
        });
        if let Some((box_id, pin)) = host {
            let prefix = passive_prefix(target_transform.box_id(m.target_box));
            operations.push(EditOperation::AddPassiveToPin {
                box_id,
                pin,
                prefix,
            });
        }
    }
}

fn plan_wires(
    candidate: &NormalizedNetlist,
    chips: &[ChipPlan],
    target: &NormalizedNetlist,
    operations: &mut Vec<EditOperation>,
) {
    let candidate_graph = ConnectivityGraph::build(candidate);
    let mut planned: HashSet<(String, u32, String, u32)> = HashSet::new();

    for connection in &target.connections {
        // Net-carrying connections are realized by labels.
        if connection.net_ports().next().is_some() {
            continue;
        }
        let Some(endpoints) = map_endpoints(connection.pin_ports(), chips) else {
            continue;
        };
        if endpoints.len() < 2 {
            continue;
        }

        // Chain from the first port; the connection is equipotential,
        // so a spanning set of lines suffices.
        let anchor = &endpoints[0];
        for other in &endpoints[1..] {
            if anchor.current == other.current {
                continue;
            }
            if candidate_connects(candidate, &candidate_graph, anchor, other) {
                continue;
            }
            let from = PinRef::new(anchor.current.0.clone(), anchor.current.1);
            let to = PinRef::new(other.current.0.clone(), other.current.1);
            let key = wire_key(&from, &to);
            if planned.insert(key) {
                operations.push(EditOperation::DrawLineBetweenPins { from, to });
            }
        }
    }
}

/// A target connection endpoint resolved into candidate space.
struct Endpoint {
    /// Candidate box index plus original pin number, when the slot
    /// existed before pin corrections.
    original: Option<(usize, u32)>,
    /// Chip identifier plus post-correction pin number.
    current: (String, u32),
}

fn map_endpoints<'a>(
    ports: impl Iterator<Item = (usize, u32)>,
    chips: &'a [ChipPlan],
) -> Option<Vec<Endpoint>> {
    let mut endpoints = Vec::new();
    for (box_index, pin) in ports {
        let chip = chips.iter().find(|c| c.target_box == box_index)?;
        let current = chip.pin_for_target(pin)?;
        endpoints.push(Endpoint {
            original: chip
                .original_for_target(pin)
                .map(|p| (chip.candidate_box, p)),
            current: (chip.id.clone(), current),
        });
    }
    Some(endpoints)
}

/// Whether the candidate already realizes a connection between the two
/// endpoints. A two-pin pass-through with interchangeable pin roles
/// satisfies the check through either of its pins: swapping them does
/// not change external connectivity, so re-drawing the line would only
/// duplicate existing topology.
fn candidate_connects(
    candidate: &NormalizedNetlist,
    graph: &ConnectivityGraph,
    a: &Endpoint,
    b: &Endpoint,
) -> bool {
    let (Some(a), Some(b)) = (a.original, b.original) else {
        return false;
    };
    connection_between(candidate, graph, a, b)
}

/// Whether `netlist` carries a connection joining the two ports, each
/// taken up to symmetric two-pin passive swap.
fn connection_between(
    netlist: &NormalizedNetlist,
    graph: &ConnectivityGraph,
    a: (usize, u32),
    b: (usize, u32),
) -> bool {
    for a_port in equivalent_ports(graph, netlist, a.0, a.1) {
        for b_port in equivalent_ports(graph, netlist, b.0, b.1) {
            let hit = netlist.connections.iter().any(|c| {
                c.pin_ports().any(|p| p == a_port) && c.pin_ports().any(|p| p == b_port)
            });
            if hit {
                return true;
            }
        }
    }
    false
}

fn wire_key(from: &PinRef, to: &PinRef) -> (String, u32, String, u32) {
    let a = (from.chip.clone(), from.pin);
    let b = (to.chip.clone(), to.pin);
    if a <= b {
        (a.0, a.1, b.0, b.1)
    } else {
        (b.0, b.1, a.0, a.1)
    }
}

fn passive_prefix(id: Option<&str>) -> String {
    let prefix: String = id
        .unwrap_or("")
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if prefix.is_empty() {
        "R".to_string()
    } else {
        prefix
    }
}
