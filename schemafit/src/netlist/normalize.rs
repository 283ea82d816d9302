//! Netlist normalization.
//!
//! Converts a string-identified [`InputNetlist`] into an index-keyed
//! canonical form with a reproducible ordering: boxes sorted by
//! descending total pin count (ties by discovery order), nets in
//! declaration-then-discovery order. Two structurally equivalent
//! netlists normalize to the same shape regardless of how their boxes
//! were declared, which the largest-first matcher depends on.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::classify;
use super::schema::{InputNetlist, Port, SidePins};

/// Structural-reference errors rejected at the normalization boundary.
#[derive(Debug, Error)]
pub enum NetlistError {
    #[error("duplicate box identifier: {0}")]
    DuplicateBox(String),

    #[error("connection references unknown box: {0}")]
    UnknownBox(String),

    #[error("pin {pin} out of range for box {box_id} ({total} pins)")]
    PinOutOfRange { box_id: String, pin: u32, total: u32 },
}

/// A box in canonical index form. The index is its position in
/// [`NormalizedNetlist::boxes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub pins: SidePins,
}

impl NormalizedBox {
    pub fn total_pins(&self) -> u32 {
        self.pins.total()
    }
}

/// An index-keyed connection port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NormalizedPort {
    Pin { box_index: usize, pin: u32 },
    Net { net_index: usize },
}

impl NormalizedPort {
    pub fn as_pin(&self) -> Option<(usize, u32)> {
        match self {
            NormalizedPort::Pin { box_index, pin } => Some((*box_index, *pin)),
            NormalizedPort::Net { .. } => None,
        }
    }

    pub fn as_net(&self) -> Option<usize> {
        match self {
            NormalizedPort::Net { net_index } => Some(*net_index),
            NormalizedPort::Pin { .. } => None,
        }
    }
}

/// An index-keyed equipotential group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedConnection {
    pub ports: Vec<NormalizedPort>,
}

impl NormalizedConnection {
    pub fn pin_ports(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.ports.iter().filter_map(|p| p.as_pin())
    }

    pub fn net_ports(&self) -> impl Iterator<Item = usize> + '_ {
        self.ports.iter().filter_map(|p| p.as_net())
    }

    pub fn is_complex(&self) -> bool {
        let distinct: HashSet<(usize, u32)> = self.pin_ports().collect();
        distinct.len() >= 3
    }

    pub fn touches_box(&self, box_index: usize) -> bool {
        self.pin_ports().any(|(b, _)| b == box_index)
    }
}

/// A net in canonical index form, with its role flags resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedNet {
    pub name: String,
    pub is_ground: bool,
    pub is_positive_power: bool,
}

/// The canonical, comparison-ready netlist form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedNetlist {
    pub boxes: Vec<NormalizedBox>,
    pub connections: Vec<NormalizedConnection>,
    pub nets: Vec<NormalizedNet>,
}

impl NormalizedNetlist {
    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Connections touching any pin of the box at `box_index`.
    pub fn connections_for_box(
        &self,
        box_index: usize,
    ) -> impl Iterator<Item = &NormalizedConnection> {
        self.connections
            .iter()
            .filter(move |c| c.touches_box(box_index))
    }

    /// Net indices a specific pin is attached to (through net ports of
    /// connections containing that pin).
    pub fn nets_for_pin(&self, box_index: usize, pin: u32) -> Vec<usize> {
        let mut nets = Vec::new();
        for conn in &self.connections {
            if conn.pin_ports().any(|(b, p)| b == box_index && p == pin) {
                for net in conn.net_ports() {
                    if !nets.contains(&net) {
                        nets.push(net);
                    }
                }
            }
        }
        nets
    }
}

/// Records the index <-> identifier mapping in both directions so edit
/// operations computed on normalized indices can be translated back to
/// the original identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetlistTransform {
    box_ids: Vec<String>,
    box_indices: HashMap<String, usize>,
    net_names: Vec<String>,
    net_indices: HashMap<String, usize>,
}

impl NetlistTransform {
    pub fn box_id(&self, index: usize) -> Option<&str> {
        self.box_ids.get(index).map(String::as_str)
    }

    pub fn box_index(&self, id: &str) -> Option<usize> {
        self.box_indices.get(id).copied()
    }

    pub fn net_name(&self, index: usize) -> Option<&str> {
        self.net_names.get(index).map(String::as_str)
    }

    pub fn net_index(&self, name: &str) -> Option<usize> {
        self.net_indices.get(name).copied()
    }

    pub fn box_count(&self) -> usize {
        self.box_ids.len()
    }
}

/// Normalize a netlist into canonical index-keyed form.
///
/// Deterministic and pure: the output is a function of the input alone.
/// Malformed references (unknown box identifiers, pin numbers out of
/// range, duplicate box ids) are rejected here rather than silently
/// dropped. Nets referenced by connections but missing from the
/// declared net list are registered in discovery order.
pub fn normalize(
    input: &InputNetlist,
) -> Result<(NormalizedNetlist, NetlistTransform), NetlistError> {
    // Canonical box order: descending total pin count, stable on ties.
    let mut order: Vec<usize> = (0..input.boxes.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(input.boxes[i].total_pins()));

    let mut transform = NetlistTransform::default();
    let mut boxes = Vec::with_capacity(input.boxes.len());
    for &original in &order {
        let spec = &input.boxes[original];
        if transform.box_indices.contains_key(&spec.id) {
            return Err(NetlistError::DuplicateBox(spec.id.clone()));
        }
        transform
            .box_indices
            .insert(spec.id.clone(), transform.box_ids.len());
        transform.box_ids.push(spec.id.clone());
        boxes.push(NormalizedBox { pins: spec.pins });
    }

    // Declared nets first, then nets discovered through connection ports.
    let mut nets = Vec::new();
    for net in &input.nets {
        if transform.net_indices.contains_key(&net.name) {
            continue;
        }
        register_net(&mut transform, &mut nets, &net.name);
        let registered = nets.last_mut().expect("net just registered");
        registered.is_ground |= net.is_ground;
        registered.is_positive_power |= net.is_positive_power;
    }
    for conn in &input.connections {
        for name in conn.net_ports() {
            if !transform.net_indices.contains_key(name) {
                register_net(&mut transform, &mut nets, name);
            }
        }
    }

    // Rewrite connections into index form, validating every reference.
    let mut connections = Vec::with_capacity(input.connections.len());
    for conn in &input.connections {
        let mut ports = Vec::with_capacity(conn.ports.len());
        for port in &conn.ports {
            let normalized = match port {
                Port::Pin { box_id, pin } => {
                    let box_index = transform
                        .box_index(box_id)
                        .ok_or_else(|| NetlistError::UnknownBox(box_id.clone()))?;
                    let total = boxes[box_index].total_pins();
                    if *pin == 0 || *pin > total {
                        return Err(NetlistError::PinOutOfRange {
                            box_id: box_id.clone(),
                            pin: *pin,
                            total,
                        });
                    }
                    NormalizedPort::Pin { box_index, pin: *pin }
                }
                Port::Net { name } => NormalizedPort::Net {
                    net_index: transform.net_index(name).expect("net registered above"),
                },
            };
            ports.push(normalized);
        }
        connections.push(NormalizedConnection { ports });
    }

    tracing::debug!(
        boxes = boxes.len(),
        connections = connections.len(),
        nets = nets.len(),
        "normalized netlist"
    );

    Ok((
        NormalizedNetlist {
            boxes,
            connections,
            nets,
        },
        transform,
    ))
}

fn register_net(transform: &mut NetlistTransform, nets: &mut Vec<NormalizedNet>, name: &str) {
    transform
        .net_indices
        .insert(name.to_string(), transform.net_names.len());
    transform.net_names.push(name.to_string());
    nets.push(NormalizedNet {
        name: name.to_string(),
        is_ground: classify::is_ground_name(name),
        is_positive_power: classify::is_positive_power_name(name),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::schema::{BoxSpec, Connection, Net};

    fn sample() -> InputNetlist {
        let mut netlist = InputNetlist::new();
        netlist.add_box(BoxSpec::new("R1").with_pins(1, 1, 0, 0));
        netlist.add_box(BoxSpec::new("U1").with_pins(2, 2, 0, 0));
        netlist.add_net(Net::new("GND"));
        netlist.add_connection(Connection::between(Port::pin("U1", 1), Port::pin("R1", 1)));
        netlist.add_connection(Connection::between(Port::pin("U1", 2), Port::net("GND")));
        netlist.add_connection(Connection::between(Port::pin("U1", 3), Port::net("VCC")));
        netlist
    }

    #[test]
    fn largest_box_first() {
        let (normalized, transform) = normalize(&sample()).unwrap();
        // U1 (4 pins) outranks R1 (2 pins) despite declaration order.
        assert_eq!(transform.box_id(0), Some("U1"));
        assert_eq!(transform.box_id(1), Some("R1"));
        assert_eq!(normalized.boxes[0].total_pins(), 4);
        assert_eq!(normalized.boxes[1].total_pins(), 2);
    }

    #[test]
    fn transform_round_trip() {
        let input = sample();
        let (_, transform) = normalize(&input).unwrap();
        for spec in &input.boxes {
            let index = transform.box_index(&spec.id).unwrap();
            assert_eq!(transform.box_id(index), Some(spec.id.as_str()));
        }
    }

    #[test]
    fn net_flags_classified() {
        let (normalized, transform) = normalize(&sample()).unwrap();
        let gnd = transform.net_index("GND").unwrap();
        assert!(normalized.nets[gnd].is_ground);
        assert!(!normalized.nets[gnd].is_positive_power);
        // VCC was never declared, only referenced; discovered and classified.
        let vcc = transform.net_index("VCC").unwrap();
        assert!(normalized.nets[vcc].is_positive_power);
    }

    #[test]
    fn declaration_order_invariance() {
        let a = sample();
        let mut b = InputNetlist::new();
        b.add_box(BoxSpec::new("U1").with_pins(2, 2, 0, 0));
        b.add_box(BoxSpec::new("R1").with_pins(1, 1, 0, 0));
        b.add_net(Net::new("GND"));
        b.add_connection(Connection::between(Port::pin("U1", 1), Port::pin("R1", 1)));
        b.add_connection(Connection::between(Port::pin("U1", 2), Port::net("GND")));
        b.add_connection(Connection::between(Port::pin("U1", 3), Port::net("VCC")));

        let (na, _) = normalize(&a).unwrap();
        let (nb, _) = normalize(&b).unwrap();
        assert_eq!(na, nb);
    }

    #[test]
    fn unknown_box_rejected() {
        let mut netlist = sample();
        netlist.add_connection(Connection::between(Port::pin("U9", 1), Port::net("GND")));
        assert!(matches!(
            normalize(&netlist),
            Err(NetlistError::UnknownBox(id)) if id == "U9"
        ));
    }

    #[test]
    fn pin_out_of_range_rejected() {
        let mut netlist = sample();
        netlist.add_connection(Connection::between(Port::pin("R1", 3), Port::net("GND")));
        assert!(matches!(
            normalize(&netlist),
            Err(NetlistError::PinOutOfRange { pin: 3, .. })
        ));
    }

    #[test]
    fn duplicate_box_rejected() {
        let mut netlist = sample();
        netlist.add_box(BoxSpec::new("U1").with_pins(1, 0, 0, 0));
        assert!(matches!(
            normalize(&netlist),
            Err(NetlistError::DuplicateBox(id)) if id == "U1"
        ));
    }
}
