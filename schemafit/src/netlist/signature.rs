//! Pin-shape signatures.
//!
//! A signature is a structural fingerprint of a box: its side pin
//! counts plus the attachment topology of each pin, encoded as a
//! string. Two boxes with equal signatures are structurally
//! interchangeable regardless of their identifiers, which is how the
//! planner recognises "this is a resistor/capacitor-like two-pin
//! pass-through" without caring about its label.

use super::graph::{AttachmentKind, ConnectivityGraph};
use super::normalize::NormalizedNetlist;
use super::schema::SidePins;

fn kind_char(kind: AttachmentKind) -> char {
    match kind {
        AttachmentKind::Ground => 'g',
        AttachmentKind::PositivePower => 'p',
        AttachmentKind::NamedNet => 'n',
        AttachmentKind::DirectPin => 'w',
    }
}

/// Signature of a single pin: its attachment kinds in sorted order, or
/// `-` for an unconnected pin.
pub fn pin_signature(
    graph: &ConnectivityGraph,
    netlist: &NormalizedNetlist,
    box_index: usize,
    pin: u32,
) -> String {
    let attachments = graph.pin_attachments(netlist, box_index);
    match attachments.get(&pin) {
        Some(kinds) if !kinds.is_empty() => kinds.iter().map(|k| kind_char(*k)).collect(),
        _ => "-".to_string(),
    }
}

/// Signature of a whole box: side pin counts, then one segment per pin
/// in CCW order.
///
/// Example: a resistor with both ends wired encodes as `l1t0r1b0:w.w`.
pub fn box_signature(
    graph: &ConnectivityGraph,
    netlist: &NormalizedNetlist,
    box_index: usize,
) -> String {
    let pins = netlist.boxes[box_index].pins;
    let mut signature = shape_prefix(&pins);
    signature.push(':');
    let attachments = graph.pin_attachments(netlist, box_index);
    for pin in 1..=pins.total() {
        if pin > 1 {
            signature.push('.');
        }
        match attachments.get(&pin) {
            Some(kinds) if !kinds.is_empty() => {
                signature.extend(kinds.iter().map(|k| kind_char(*k)));
            }
            _ => signature.push('-'),
        }
    }
    signature
}

/// The side-count half of a signature, without connection topology.
pub fn shape_prefix(pins: &SidePins) -> String {
    format!(
        "l{}t{}r{}b{}",
        pins.left, pins.top, pins.right, pins.bottom
    )
}

/// True for a generic two-pin pass-through shape: exactly two pins.
/// The orientation (left/right vs top/bottom) is irrelevant.
pub fn is_two_pin_shape(pins: &SidePins) -> bool {
    pins.total() == 2
}

/// The port itself, plus its opposite pin when it sits on a two-pin
/// box whose pins carry identical signatures. Swapping the pins of
/// such a box does not change external connectivity, so a connection
/// requirement at one pin is satisfiable through either.
pub fn equivalent_ports(
    graph: &ConnectivityGraph,
    netlist: &NormalizedNetlist,
    box_index: usize,
    pin: u32,
) -> Vec<(usize, u32)> {
    let mut ports = vec![(box_index, pin)];
    let pins = netlist.boxes[box_index].pins;
    if is_two_pin_shape(&pins) {
        let other = 3 - pin;
        if pin_signature(graph, netlist, box_index, pin)
            == pin_signature(graph, netlist, box_index, other)
        {
            ports.push((box_index, other));
        }
    }
    ports
}
