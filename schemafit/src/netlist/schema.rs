//! String-identified netlist data model.
//!
//! This is the external-facing form of a circuit: boxes with four-sided
//! pin counts, connections (equipotential port groups) and named nets,
//! all keyed by string identifiers. It is produced by an upstream
//! netlist extractor and treated as immutable input by this crate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::geom::Point;

/// One of the four sides of a box, in canonical CCW walk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Top,
    Right,
    Bottom,
}

impl Side {
    /// The canonical CCW pin-numbering walk: left bottom-to-top, top
    /// left-to-right, right top-to-bottom, bottom right-to-left.
    pub const CCW: [Side; 4] = [Side::Left, Side::Top, Side::Right, Side::Bottom];
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Side::Left => "left",
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
        };
        f.write_str(s)
    }
}

/// Per-side pin counts for a box.
///
/// Pin numbers are assigned contiguously starting at 1 along the CCW
/// walk, so the counts fully determine which side a pin number lives on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SidePins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl SidePins {
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn count(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
        }
    }

    pub fn count_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Left => &mut self.left,
            Side::Top => &mut self.top,
            Side::Right => &mut self.right,
            Side::Bottom => &mut self.bottom,
        }
    }

    pub fn total(&self) -> u32 {
        self.left + self.top + self.right + self.bottom
    }

    /// Pins on the left and right sides combined.
    pub fn vertical(&self) -> u32 {
        self.left + self.right
    }

    /// Pins on the top and bottom sides combined.
    pub fn horizontal(&self) -> u32 {
        self.top + self.bottom
    }

    /// First pin number on `side` along the CCW walk, if the side has pins.
    pub fn first_pin(&self, side: Side) -> Option<u32> {
        if self.count(side) == 0 {
            return None;
        }
        let mut start = 1;
        for s in Side::CCW {
            if s == side {
                return Some(start);
            }
            start += self.count(s);
        }
        unreachable!("side not in CCW walk")
    }

    /// Last pin number on `side`, if the side has pins.
    pub fn last_pin(&self, side: Side) -> Option<u32> {
        self.first_pin(side).map(|f| f + self.count(side) - 1)
    }

    /// All pin numbers on `side`, in CCW walk order.
    pub fn pins_on_side(&self, side: Side) -> std::ops::RangeInclusive<u32> {
        match self.first_pin(side) {
            Some(first) => first..=first + self.count(side) - 1,
            // Empty range for a pinless side.
            None => 1..=0,
        }
    }

    /// Which side pin number `pin` lives on, plus its 0-based offset
    /// within that side's CCW run. `None` when the number is out of range.
    pub fn locate(&self, pin: u32) -> Option<(Side, u32)> {
        if pin == 0 {
            return None;
        }
        let mut start = 1;
        for side in Side::CCW {
            let count = self.count(side);
            if pin < start + count {
                return Some((side, pin - start));
            }
            start += count;
        }
        None
    }

    /// Pin number at a 0-based offset along `side`'s CCW run.
    pub fn pin_at(&self, side: Side, offset: u32) -> Option<u32> {
        if offset >= self.count(side) {
            return None;
        }
        self.first_pin(side).map(|f| f + offset)
    }
}

/// A component with pins on up to four sides (chip, passive, connector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpec {
    /// Identifier, e.g. `U1` or `R3`.
    pub id: String,

    /// Per-side pin counts.
    pub pins: SidePins,

    /// Optional 2D anchor position.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub position: Option<Point>,
}

impl BoxSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pins: SidePins::default(),
            position: None,
        }
    }

    pub fn with_pins(mut self, left: u32, right: u32, top: u32, bottom: u32) -> Self {
        self.pins = SidePins::new(left, right, top, bottom);
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    pub fn total_pins(&self) -> u32 {
        self.pins.total()
    }
}

/// One endpoint of a connection: either a specific box pin or a named net.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Port {
    Pin { box_id: String, pin: u32 },
    Net { name: String },
}

impl Port {
    pub fn pin(box_id: impl Into<String>, pin: u32) -> Self {
        Port::Pin {
            box_id: box_id.into(),
            pin,
        }
    }

    pub fn net(name: impl Into<String>) -> Self {
        Port::Net { name: name.into() }
    }

    pub fn as_pin(&self) -> Option<(&str, u32)> {
        match self {
            Port::Pin { box_id, pin } => Some((box_id.as_str(), *pin)),
            Port::Net { .. } => None,
        }
    }

    pub fn as_net(&self) -> Option<&str> {
        match self {
            Port::Net { name } => Some(name.as_str()),
            Port::Pin { .. } => None,
        }
    }
}

/// A set of ports forming one equipotential group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub ports: Vec<Port>,
}

impl Connection {
    pub fn new(ports: Vec<Port>) -> Self {
        Self { ports }
    }

    /// Convenience: a two-port connection between box pins.
    pub fn between(a: Port, b: Port) -> Self {
        Self { ports: vec![a, b] }
    }

    /// Iterate the box-pin ports only.
    pub fn pin_ports(&self) -> impl Iterator<Item = (&str, u32)> {
        self.ports.iter().filter_map(|p| p.as_pin())
    }

    /// Iterate the net ports only.
    pub fn net_ports(&self) -> impl Iterator<Item = &str> {
        self.ports.iter().filter_map(|p| p.as_net())
    }

    /// A connection with three or more distinct box-pin ports is a
    /// multi-point net and is treated specially by scoring and layout.
    pub fn is_complex(&self) -> bool {
        let distinct: HashSet<(&str, u32)> = self.pin_ports().collect();
        distinct.len() >= 3
    }

    /// True when the connection touches any pin of `box_id`.
    pub fn touches_box(&self, box_id: &str) -> bool {
        self.pin_ports().any(|(b, _)| b == box_id)
    }
}

/// A named equipotential group with semantic role flags.
///
/// The `is_ground`/`is_positive_power` flags are inferred from
/// conventional net names at normalization time; input producers may
/// leave them false.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Net {
    pub name: String,

    #[serde(default)]
    pub is_ground: bool,

    #[serde(default)]
    pub is_positive_power: bool,
}

impl Net {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_ground: false,
            is_positive_power: false,
        }
    }
}

/// The external-facing netlist: boxes, connections and nets, all
/// string-identified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputNetlist {
    pub boxes: Vec<BoxSpec>,
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub nets: Vec<Net>,
}

impl InputNetlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_box(&mut self, spec: BoxSpec) -> &mut Self {
        self.boxes.push(spec);
        self
    }

    pub fn add_connection(&mut self, connection: Connection) -> &mut Self {
        self.connections.push(connection);
        self
    }

    pub fn add_net(&mut self, net: Net) -> &mut Self {
        self.nets.push(net);
        self
    }

    pub fn get_box(&self, id: &str) -> Option<&BoxSpec> {
        self.boxes.iter().find(|b| b.id == id)
    }

    /// Connections touching any pin of `box_id`.
    pub fn connections_for_box<'a>(&'a self, box_id: &'a str) -> impl Iterator<Item = &'a Connection> {
        self.connections.iter().filter(move |c| c.touches_box(box_id))
    }
}
