//! Graph-based connectivity view over a normalized netlist.
//!
//! Boxes and nets are nodes, pin attachments are edges. The matcher and
//! planner query adjacency and per-box attachment profiles through this
//! view instead of rescanning the connection list.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::normalize::NormalizedNetlist;

/// Node type in the connectivity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityNode {
    /// A box, by normalized index.
    Box(usize),
    /// A net, by normalized index.
    Net(usize),
}

/// Edge type in the connectivity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityEdge {
    /// A pin attached to a net, through the connection at `connection`.
    PinToNet { pin: u32, connection: usize },
    /// Two pins wired directly, without a named net in between.
    PinToPin {
        from_pin: u32,
        to_pin: u32,
        connection: usize,
    },
}

/// How one pin of a box is attached to the rest of the circuit.
/// Used by the scorer to compare boxes structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttachmentKind {
    Ground,
    PositivePower,
    NamedNet,
    DirectPin,
}

/// Per-box structural summary: how many pins carry each attachment
/// kind, how many connections touch the box and how many of those are
/// complex (multi-point) nets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentProfile {
    pub ground_pins: u32,
    pub power_pins: u32,
    pub named_net_pins: u32,
    pub direct_pins: u32,
    pub connection_count: u32,
    pub complex_connection_count: u32,
}

impl AttachmentProfile {
    /// Total attachment-count distance between two profiles.
    pub fn distance(&self, other: &AttachmentProfile) -> u32 {
        self.ground_pins.abs_diff(other.ground_pins)
            + self.power_pins.abs_diff(other.power_pins)
            + self.named_net_pins.abs_diff(other.named_net_pins)
            + self.direct_pins.abs_diff(other.direct_pins)
            + self.connection_count.abs_diff(other.connection_count)
            + self.complex_connection_count.abs_diff(other.complex_connection_count)
    }

    /// Mismatch in ground/power role attachments only.
    pub fn role_distance(&self, other: &AttachmentProfile) -> u32 {
        self.ground_pins.abs_diff(other.ground_pins) + self.power_pins.abs_diff(other.power_pins)
    }
}

/// Undirected connectivity graph over a normalized netlist.
pub struct ConnectivityGraph {
    graph: UnGraph<ConnectivityNode, ConnectivityEdge>,
    box_nodes: Vec<NodeIndex>,
    net_nodes: Vec<NodeIndex>,
}

impl ConnectivityGraph {
    /// Build the graph for a normalized netlist.
    pub fn build(netlist: &NormalizedNetlist) -> Self {
        let mut graph = UnGraph::new_undirected();

        let box_nodes: Vec<NodeIndex> = (0..netlist.boxes.len())
            .map(|i| graph.add_node(ConnectivityNode::Box(i)))
            .collect();
        let net_nodes: Vec<NodeIndex> = (0..netlist.nets.len())
            .map(|i| graph.add_node(ConnectivityNode::Net(i)))
            .collect();

        for (conn_index, conn) in netlist.connections.iter().enumerate() {
            let pins: Vec<(usize, u32)> = conn.pin_ports().collect();
            let nets: Vec<usize> = conn.net_ports().collect();

            for &(box_index, pin) in &pins {
                for &net_index in &nets {
                    graph.add_edge(
                        box_nodes[box_index],
                        net_nodes[net_index],
                        ConnectivityEdge::PinToNet {
                            pin,
                            connection: conn_index,
                        },
                    );
                }
            }

            // Pins in a net-less connection are linked pairwise.
            if nets.is_empty() {
                for i in 0..pins.len() {
                    for j in (i + 1)..pins.len() {
                        let (box_a, pin_a) = pins[i];
                        let (box_b, pin_b) = pins[j];
                        graph.add_edge(
                            box_nodes[box_a],
                            box_nodes[box_b],
                            ConnectivityEdge::PinToPin {
                                from_pin: pin_a,
                                to_pin: pin_b,
                                connection: conn_index,
                            },
                        );
                    }
                }
            }
        }

        Self {
            graph,
            box_nodes,
            net_nodes,
        }
    }

    /// Net indices attached to any pin of `box_index`.
    pub fn nets_for_box(&self, box_index: usize) -> Vec<usize> {
        let Some(&node) = self.box_nodes.get(box_index) else {
            return Vec::new();
        };
        let mut nets = Vec::new();
        for edge in self.graph.edges(node) {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            if let Some(ConnectivityNode::Net(net)) = self.graph.node_weight(other) {
                if !nets.contains(net) {
                    nets.push(*net);
                }
            }
        }
        nets
    }

    /// Box indices connected to `box_index` directly or through a net.
    pub fn neighbor_boxes(&self, box_index: usize) -> Vec<usize> {
        let Some(&node) = self.box_nodes.get(box_index) else {
            return Vec::new();
        };
        let mut boxes = Vec::new();
        let visit = |other: NodeIndex, boxes: &mut Vec<usize>| {
            match self.graph.node_weight(other) {
                Some(ConnectivityNode::Box(b)) if *b != box_index => {
                    if !boxes.contains(b) {
                        boxes.push(*b);
                    }
                }
                Some(ConnectivityNode::Net(_)) => {
                    for edge in self.graph.edges(other) {
                        let far = if edge.source() == other {
                            edge.target()
                        } else {
                            edge.source()
                        };
                        if let Some(ConnectivityNode::Box(b)) = self.graph.node_weight(far) {
                            if *b != box_index && !boxes.contains(b) {
                                boxes.push(*b);
                            }
                        }
                    }
                }
                _ => {}
            }
        };
        for edge in self.graph.edges(node) {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            visit(other, &mut boxes);
        }
        boxes
    }

    /// Attachment kinds per pin of a box, in ascending pin order.
    pub fn pin_attachments(
        &self,
        netlist: &NormalizedNetlist,
        box_index: usize,
    ) -> HashMap<u32, Vec<AttachmentKind>> {
        let mut attachments: HashMap<u32, Vec<AttachmentKind>> = HashMap::new();
        let Some(&node) = self.box_nodes.get(box_index) else {
            return attachments;
        };
        for edge in self.graph.edges(node) {
            match edge.weight() {
                ConnectivityEdge::PinToNet { pin, .. } => {
                    let other = if edge.source() == node {
                        edge.target()
                    } else {
                        edge.source()
                    };
                    if let Some(ConnectivityNode::Net(net)) = self.graph.node_weight(other) {
                        let kind = match &netlist.nets[*net] {
                            n if n.is_ground => AttachmentKind::Ground,
                            n if n.is_positive_power => AttachmentKind::PositivePower,
                            _ => AttachmentKind::NamedNet,
                        };
                        attachments.entry(*pin).or_default().push(kind);
                    }
                }
                ConnectivityEdge::PinToPin {
                    from_pin, to_pin, ..
                } => {
                    // `edges(node)` re-orients incident edges so that
                    // `source()` is the query node; the stored endpoints
                    // say which pin belongs to this box.
                    let Some((stored_source, stored_target)) =
                        self.graph.edge_endpoints(edge.id())
                    else {
                        continue;
                    };
                    if stored_source == node {
                        attachments
                            .entry(*from_pin)
                            .or_default()
                            .push(AttachmentKind::DirectPin);
                    }
                    if stored_target == node {
                        attachments
                            .entry(*to_pin)
                            .or_default()
                            .push(AttachmentKind::DirectPin);
                    }
                }
            }
        }
        for kinds in attachments.values_mut() {
            kinds.sort();
        }
        attachments
    }

    /// Structural summary of a box, independent of any candidate mapping.
    pub fn profile(&self, netlist: &NormalizedNetlist, box_index: usize) -> AttachmentProfile {
        let mut profile = AttachmentProfile::default();
        for kinds in self.pin_attachments(netlist, box_index).values() {
            for kind in kinds {
                match kind {
                    AttachmentKind::Ground => profile.ground_pins += 1,
                    AttachmentKind::PositivePower => profile.power_pins += 1,
                    AttachmentKind::NamedNet => profile.named_net_pins += 1,
                    AttachmentKind::DirectPin => profile.direct_pins += 1,
                }
            }
        }
        for conn in netlist.connections_for_box(box_index) {
            profile.connection_count += 1;
            if conn.is_complex() {
                profile.complex_connection_count += 1;
            }
        }
        profile
    }

    pub fn net_node_count(&self) -> usize {
        self.net_nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::normalize::normalize;
    use crate::netlist::schema::{BoxSpec, Connection, InputNetlist, Port};

    fn sample() -> (NormalizedNetlist, crate::netlist::NetlistTransform) {
        let mut netlist = InputNetlist::new();
        netlist.add_box(BoxSpec::new("U1").with_pins(2, 2, 0, 0));
        netlist.add_box(BoxSpec::new("R1").with_pins(1, 1, 0, 0));
        netlist.add_connection(Connection::between(Port::pin("U1", 1), Port::pin("R1", 1)));
        netlist.add_connection(Connection::between(Port::pin("U1", 2), Port::net("GND")));
        netlist.add_connection(Connection::between(Port::pin("R1", 2), Port::net("VCC")));
        normalize(&netlist).unwrap()
    }

    #[test]
    fn nets_and_neighbors() {
        let (normalized, transform) = sample();
        let graph = ConnectivityGraph::build(&normalized);
        let u1 = transform.box_index("U1").unwrap();
        let r1 = transform.box_index("R1").unwrap();

        assert_eq!(graph.nets_for_box(u1).len(), 1); // GND
        assert_eq!(graph.neighbor_boxes(u1), vec![r1]);
        assert_eq!(graph.neighbor_boxes(r1), vec![u1]);
    }

    #[test]
    fn profiles_count_roles() {
        let (normalized, transform) = sample();
        let graph = ConnectivityGraph::build(&normalized);
        let u1 = transform.box_index("U1").unwrap();
        let profile = graph.profile(&normalized, u1);

        assert_eq!(profile.ground_pins, 1);
        assert_eq!(profile.power_pins, 0);
        assert_eq!(profile.direct_pins, 1);
        assert_eq!(profile.connection_count, 2);
    }

    #[test]
    fn direct_pin_attribution_uses_stored_endpoints() {
        // Distinct pin numbers on each end of the wire make any
        // cross-attribution between the two boxes visible.
        let mut netlist = InputNetlist::new();
        netlist.add_box(BoxSpec::new("U1").with_pins(2, 2, 0, 0));
        netlist.add_box(BoxSpec::new("R1").with_pins(1, 1, 0, 0));
        netlist.add_connection(Connection::between(Port::pin("U1", 3), Port::pin("R1", 2)));
        let (normalized, transform) = normalize(&netlist).unwrap();
        let graph = ConnectivityGraph::build(&normalized);
        let u1 = transform.box_index("U1").unwrap();
        let r1 = transform.box_index("R1").unwrap();

        let u1_pins = graph.pin_attachments(&normalized, u1);
        assert_eq!(u1_pins.keys().copied().collect::<Vec<_>>(), vec![3]);
        assert_eq!(u1_pins[&3], vec![AttachmentKind::DirectPin]);

        let r1_pins = graph.pin_attachments(&normalized, r1);
        assert_eq!(r1_pins.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(r1_pins[&2], vec![AttachmentKind::DirectPin]);
    }

    #[test]
    fn profile_distance_symmetric() {
        let (normalized, transform) = sample();
        let graph = ConnectivityGraph::build(&normalized);
        let u1 = transform.box_index("U1").unwrap();
        let r1 = transform.box_index("R1").unwrap();
        let a = graph.profile(&normalized, u1);
        let b = graph.profile(&normalized, r1);
        assert_eq!(a.distance(&b), b.distance(&a));
        assert_eq!(a.distance(&a), 0);
    }
}
