//! Mutable geometric schematic model.
//!
//! A [`Schematic`] exclusively owns its chips, wires, labels and
//! passives. Wires and labels refer to the pin they hang off as a
//! `(chip id, pin number)` value pair resolved through the model, never
//! as a direct reference, so pin renumbering can re-anchor them to the
//! same logical pin.
//!
//! Coordinates are integer diagram units, y growing downward. Pin
//! positions derive from the chip's bounding box and the canonical CCW
//! numbering: left bottom-to-top, top left-to-right, right
//! top-to-bottom, bottom right-to-left.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::netlist::{Side, SidePins};

/// Distance between adjacent pins on a chip edge, in diagram units.
pub const PIN_SPACING: i32 = 2;

/// A point in diagram units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan_distance(&self, other: &Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned bounding rectangle, inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// The rectangle grown by `margin` units on every side.
    pub fn expanded(&self, margin: i32) -> Rect {
        Rect {
            min: self.min.offset(-margin, -margin),
            max: self.max.offset(margin, margin),
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// The outward direction a pin points, away from its chip body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
    Up,
    Down,
}

impl Facing {
    pub fn from_side(side: Side) -> Facing {
        match side {
            Side::Left => Facing::Left,
            Side::Right => Facing::Right,
            Side::Top => Facing::Up,
            Side::Bottom => Facing::Down,
        }
    }

    /// Unit step in this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Facing::Left => (-1, 0),
            Facing::Right => (1, 0),
            Facing::Up => (0, -1),
            Facing::Down => (0, 1),
        }
    }

    pub fn opposite(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
            Facing::Up => Facing::Down,
            Facing::Down => Facing::Up,
        }
    }
}

/// Value-based back-reference to a chip pin. Resolved through the
/// owning [`Schematic`], never held as a pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub chip: String,
    pub pin: u32,
}

impl PinRef {
    pub fn new(chip: impl Into<String>, pin: u32) -> Self {
        Self {
            chip: chip.into(),
            pin,
        }
    }
}

impl std::fmt::Display for PinRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.chip, self.pin)
    }
}

/// A placed box with four-sided pin counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chip {
    pub id: String,
    pub pins: SidePins,
    /// Top-left corner of the chip body.
    pub origin: Point,
}

impl Chip {
    pub fn width(&self) -> i32 {
        (self.pins.top.max(self.pins.bottom).max(1) as i32 + 1) * PIN_SPACING
    }

    pub fn height(&self) -> i32 {
        (self.pins.left.max(self.pins.right).max(1) as i32 + 1) * PIN_SPACING
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            min: self.origin,
            max: self.origin.offset(self.width(), self.height()),
        }
    }

    /// Screen position of pin `pin`, on the chip border.
    pub fn pin_position(&self, pin: u32) -> Option<Point> {
        let (side, offset) = self.pins.locate(pin)?;
        let step = (offset as i32 + 1) * PIN_SPACING;
        let p = match side {
            // Left pins run bottom-to-top.
            Side::Left => self.origin.offset(0, self.height() - step),
            // Top pins run left-to-right.
            Side::Top => self.origin.offset(step, 0),
            // Right pins run top-to-bottom.
            Side::Right => self.origin.offset(self.width(), step),
            // Bottom pins run right-to-left.
            Side::Bottom => self.origin.offset(self.width() - step, self.height()),
        };
        Some(p)
    }

    pub fn pin_facing(&self, pin: u32) -> Option<Facing> {
        self.pins.locate(pin).map(|(side, _)| Facing::from_side(side))
    }
}

/// An orthogonal polyline, optionally anchored to a pin at each end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub from: Option<PinRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub to: Option<PinRef>,
    /// Net name, when the wire realizes a named net.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub net: Option<String>,
}

impl Wire {
    pub fn anchored_to(&self, pin: &PinRef) -> bool {
        self.from.as_ref() == Some(pin) || self.to.as_ref() == Some(pin)
    }

    pub fn anchored_to_chip(&self, chip: &str) -> bool {
        self.from.as_ref().map(|p| p.chip == chip).unwrap_or(false)
            || self.to.as_ref().map(|p| p.chip == chip).unwrap_or(false)
    }
}

/// A net label attached to a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Net name the label carries.
    pub text: String,
    /// Diagram-unique lowercase letter used by renderers.
    pub letter: char,
    pub at: PinRef,
    pub position: Point,
}

/// A two-pin passive inserted in-line at a host pin. Its body is a
/// regular two-pin [`Chip`] registered in the model under `chip_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passive {
    pub id: String,
    /// The chip entry realizing this passive's body.
    pub chip_id: String,
    /// The host pin the passive hangs off.
    pub at: PinRef,
}

/// Hard failures at the model boundary: the caller referenced
/// something that does not exist, or asked for a mutation whose
/// preconditions do not hold. The model is never partially mutated on
/// failure.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown chip: {0}")]
    UnknownChip(String),

    #[error("chip {chip} has no pin {pin}")]
    UnknownPin { chip: String, pin: u32 },

    #[error("duplicate chip identifier: {0}")]
    DuplicateChip(String),

    #[error("pin {pin} of chip {chip} still has geometry attached")]
    PinInUse { chip: String, pin: u32 },

    #[error("chip {chip} has no pins on its {side} side")]
    EmptySide { chip: String, side: Side },
}

/// The mutable geometric model of one schematic diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schematic {
    pub chips: Vec<Chip>,
    #[serde(default)]
    pub wires: Vec<Wire>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub passives: Vec<Passive>,

    /// Diagram-scoped label lettering counter (`a`, `b`, ...).
    #[serde(default)]
    label_counter: u32,
    /// Per-prefix passive numbering counters (`R` -> 3 means R1..R3 taken).
    #[serde(default)]
    passive_counters: HashMap<String, u32>,
}

impl Schematic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chip(&self, id: &str) -> Option<&Chip> {
        self.chips.iter().find(|c| c.id == id)
    }

    pub fn chip_mut(&mut self, id: &str) -> Option<&mut Chip> {
        self.chips.iter_mut().find(|c| c.id == id)
    }

    fn require_chip(&self, id: &str) -> Result<&Chip, ModelError> {
        self.chip(id).ok_or_else(|| ModelError::UnknownChip(id.to_string()))
    }

    /// Add a chip. Fails on a duplicate identifier.
    pub fn add_chip(
        &mut self,
        id: impl Into<String>,
        pins: SidePins,
        origin: Point,
    ) -> Result<(), ModelError> {
        let id = id.into();
        if self.chip(&id).is_some() {
            return Err(ModelError::DuplicateChip(id));
        }
        self.chips.push(Chip { id, pins, origin });
        Ok(())
    }

    /// Resolve a pin reference to its screen position.
    pub fn pin_position(&self, at: &PinRef) -> Result<Point, ModelError> {
        let chip = self.require_chip(&at.chip)?;
        chip.pin_position(at.pin).ok_or_else(|| ModelError::UnknownPin {
            chip: at.chip.clone(),
            pin: at.pin,
        })
    }

    /// Resolve a pin reference to its outward facing direction.
    pub fn pin_facing(&self, at: &PinRef) -> Result<Facing, ModelError> {
        let chip = self.require_chip(&at.chip)?;
        chip.pin_facing(at.pin).ok_or_else(|| ModelError::UnknownPin {
            chip: at.chip.clone(),
            pin: at.pin,
        })
    }

    /// Next unused label letter. Wraps within the alphabet; diagrams do
    /// not reach hundreds of labels in practice.
    pub fn next_label_letter(&mut self) -> char {
        let letter = (b'a' + (self.label_counter % 26) as u8) as char;
        self.label_counter += 1;
        letter
    }

    /// Next unused passive identifier for a type prefix, e.g. `R3`.
    pub fn next_passive_id(&mut self, prefix: &str) -> String {
        let counter = self.passive_counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}{counter}")
    }

    /// Labels attached to a pin.
    pub fn labels_at(&self, at: &PinRef) -> impl Iterator<Item = &Label> {
        let at = at.clone();
        self.labels.iter().filter(move |l| l.at == at)
    }

    /// Wires with a terminus at a pin.
    pub fn wires_at(&self, at: &PinRef) -> impl Iterator<Item = &Wire> {
        let at = at.clone();
        self.wires.iter().filter(move |w| w.anchored_to(&at))
    }

    /// Passive hanging off a host pin, if any.
    pub fn passive_at(&self, at: &PinRef) -> Option<&Passive> {
        self.passives.iter().find(|p| &p.at == at)
    }

    /// True when any wire, label or passive is anchored at the pin.
    pub fn pin_in_use(&self, at: &PinRef) -> bool {
        self.labels_at(at).next().is_some()
            || self.wires_at(at).next().is_some()
            || self.passive_at(at).is_some()
    }

    /// Insert a new pin on a chip side at `offset` (0-based position
    /// within the side's CCW run; equal to the side count appends).
    /// Renumbers every pin of the chip and re-anchors all geometry.
    pub fn insert_pin(
        &mut self,
        chip_id: &str,
        side: Side,
        offset: u32,
    ) -> Result<(), ModelError> {
        let chip = self.require_chip(chip_id)?;
        let old = chip.pins;
        let offset = offset.min(old.count(side));

        let mut new = old;
        *new.count_mut(side) += 1;

        // Surviving pins keep their (side, offset) slot, shifted past
        // the insertion point.
        let mut map = HashMap::new();
        for pin in 1..=old.total() {
            let (s, o) = old.locate(pin).expect("pin in range");
            let o = if s == side && o >= offset { o + 1 } else { o };
            let renumbered = new.pin_at(s, o).expect("slot in enlarged layout");
            map.insert(pin, renumbered);
        }

        self.chip_mut(chip_id).expect("chip exists").pins = new;
        self.renumber_chip_pins(chip_id, &map);
        Ok(())
    }

    /// Remove the pin at `offset` on a chip side. The pin must have no
    /// geometry attached; callers clear it first. Renumbers every pin
    /// of the chip and re-anchors all geometry.
    pub fn remove_pin(
        &mut self,
        chip_id: &str,
        side: Side,
        offset: u32,
    ) -> Result<(), ModelError> {
        let chip = self.require_chip(chip_id)?;
        let old = chip.pins;
        if old.count(side) == 0 {
            return Err(ModelError::EmptySide {
                chip: chip_id.to_string(),
                side,
            });
        }
        let offset = offset.min(old.count(side) - 1);
        let removed = old.pin_at(side, offset).expect("offset in range");

        let removed_ref = PinRef::new(chip_id, removed);
        if self.pin_in_use(&removed_ref) {
            return Err(ModelError::PinInUse {
                chip: chip_id.to_string(),
                pin: removed,
            });
        }

        let mut new = old;
        *new.count_mut(side) -= 1;

        let mut map = HashMap::new();
        for pin in 1..=old.total() {
            if pin == removed {
                continue;
            }
            let (s, o) = old.locate(pin).expect("pin in range");
            let o = if s == side && o > offset { o - 1 } else { o };
            let renumbered = new.pin_at(s, o).expect("slot in shrunk layout");
            map.insert(pin, renumbered);
        }

        self.chip_mut(chip_id).expect("chip exists").pins = new;
        self.renumber_chip_pins(chip_id, &map);
        Ok(())
    }

    /// Rewrite every pin reference into a chip according to `map`
    /// (old pin number -> new pin number), then re-derive the screen
    /// geometry of everything anchored to the chip.
    fn renumber_chip_pins(&mut self, chip_id: &str, map: &HashMap<u32, u32>) {
        for wire in &mut self.wires {
            if let Some(from) = &mut wire.from {
                if from.chip == chip_id {
                    if let Some(&renumbered) = map.get(&from.pin) {
                        from.pin = renumbered;
                    }
                }
            }
            if let Some(to) = &mut wire.to {
                if to.chip == chip_id {
                    if let Some(&renumbered) = map.get(&to.pin) {
                        to.pin = renumbered;
                    }
                }
            }
        }
        for label in &mut self.labels {
            if label.at.chip == chip_id {
                if let Some(&renumbered) = map.get(&label.at.pin) {
                    label.at.pin = renumbered;
                }
            }
        }
        for passive in &mut self.passives {
            if passive.at.chip == chip_id {
                if let Some(&renumbered) = map.get(&passive.at.pin) {
                    passive.at.pin = renumbered;
                }
            }
        }
        self.refresh_anchored_geometry(chip_id);
    }

    /// Snap wire termini and label positions back onto their
    /// (possibly moved) pins after a chip's layout changed.
    fn refresh_anchored_geometry(&mut self, chip_id: &str) {
        let Some(chip) = self.chip(chip_id).cloned() else {
            return;
        };
        for wire in &mut self.wires {
            if let Some(from) = &wire.from {
                if from.chip == chip_id {
                    if let Some(p) = chip.pin_position(from.pin) {
                        if let Some(first) = wire.points.first_mut() {
                            *first = p;
                        }
                    }
                }
            }
            if let Some(to) = &wire.to {
                if to.chip == chip_id {
                    if let Some(p) = chip.pin_position(to.pin) {
                        if let Some(last) = wire.points.last_mut() {
                            *last = p;
                        }
                    }
                }
            }
        }
        for label in &mut self.labels {
            if label.at.chip == chip_id {
                if let (Some(p), Some(facing)) =
                    (chip.pin_position(label.at.pin), chip.pin_facing(label.at.pin))
                {
                    let (dx, dy) = facing.delta();
                    label.position = p.offset(dx, dy);
                }
            }
        }
    }

    /// Attach a label to a pin, taking the next unused letter.
    pub fn attach_label(&mut self, at: PinRef, text: impl Into<String>) -> Result<(), ModelError> {
        let position = self.pin_position(&at)?;
        let facing = self.pin_facing(&at)?;
        let (dx, dy) = facing.delta();
        let letter = self.next_label_letter();
        self.labels.push(Label {
            text: text.into(),
            letter,
            at,
            position: position.offset(dx, dy),
        });
        Ok(())
    }

    /// Detach every label and wire terminus at a pin. The pin itself
    /// remains. Returns how many items were removed.
    pub fn clear_pin(&mut self, at: &PinRef) -> Result<usize, ModelError> {
        // Validate the reference before touching anything.
        self.pin_position(at)?;
        let before = self.labels.len() + self.wires.len();
        self.labels.retain(|l| &l.at != at);
        self.wires.retain(|w| !w.anchored_to(at));
        Ok(before - self.labels.len() - self.wires.len())
    }

    /// Delete a chip and every wire, label and passive transitively
    /// anchored to any of its pins. Nothing dangling survives.
    pub fn remove_chip(&mut self, chip_id: &str) -> Result<(), ModelError> {
        self.require_chip(chip_id)?;

        let mut doomed: HashSet<String> = HashSet::new();
        doomed.insert(chip_id.to_string());

        // Passives hosted by a doomed chip die with it, and their own
        // body chips become doomed in turn.
        loop {
            let mut grew = false;
            for passive in &self.passives {
                if doomed.contains(&passive.at.chip) && !doomed.contains(&passive.chip_id) {
                    doomed.insert(passive.chip_id.clone());
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }

        self.chips.retain(|c| !doomed.contains(&c.id));
        self.passives
            .retain(|p| !doomed.contains(&p.at.chip) && !doomed.contains(&p.chip_id));
        self.wires.retain(|w| {
            !w.from.as_ref().map(|p| doomed.contains(&p.chip)).unwrap_or(false)
                && !w.to.as_ref().map(|p| doomed.contains(&p.chip)).unwrap_or(false)
        });
        self.labels.retain(|l| !doomed.contains(&l.at.chip));
        Ok(())
    }

    /// Bounding rectangle of everything in the model.
    pub fn bounds(&self) -> Rect {
        let mut rect: Option<Rect> = None;
        for chip in &self.chips {
            let b = chip.bounds();
            rect = Some(match rect {
                Some(r) => r.union(&b),
                None => b,
            });
        }
        for wire in &self.wires {
            for p in &wire.points {
                let b = Rect { min: *p, max: *p };
                rect = Some(match rect {
                    Some(r) => r.union(&b),
                    None => b,
                });
            }
        }
        rect.unwrap_or(Rect {
            min: Point::default(),
            max: Point::default(),
        })
    }

    /// Grid cells blocked for routing: chip bodies (borders included)
    /// and every point along existing wires.
    pub fn blocked_cells(&self) -> HashSet<Point> {
        let mut blocked = HashSet::new();
        for chip in &self.chips {
            let b = chip.bounds();
            for x in b.min.x..=b.max.x {
                for y in b.min.y..=b.max.y {
                    blocked.insert(Point::new(x, y));
                }
            }
        }
        for wire in &self.wires {
            for pair in wire.points.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let dx = (b.x - a.x).signum();
                let dy = (b.y - a.y).signum();
                let mut p = a;
                blocked.insert(p);
                while p != b {
                    p = p.offset(dx, dy);
                    blocked.insert(p);
                }
            }
        }
        blocked
    }
}
