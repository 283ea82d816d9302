//! Quarter-turn rotation of box pin layouts.
//!
//! The CCW pin-numbering convention is a single cyclic walk around the
//! box perimeter (left bottom-to-top, top left-to-right, right
//! top-to-bottom, bottom right-to-left), so rotating a box by a quarter
//! turn is a cyclic shift of both the side counts and the pin numbers:
//! one CCW turn maps the old top side onto the new left side and pin
//! `k` to `((k - 1 - left) mod total) + 1`.

use serde::{Deserialize, Serialize};

use crate::netlist::{Side, SidePins};

/// A box rotation, in counter-clockwise quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// All rotations, in the deterministic order the matcher tries them.
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn quarter_turns(self) -> u32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    pub fn degrees(self) -> u32 {
        self.quarter_turns() * 90
    }

    pub fn inverse(self) -> Rotation {
        match self {
            Rotation::R0 => Rotation::R0,
            Rotation::R90 => Rotation::R270,
            Rotation::R180 => Rotation::R180,
            Rotation::R270 => Rotation::R90,
        }
    }

    /// Side counts of the box after rotation.
    pub fn apply_sides(self, pins: SidePins) -> SidePins {
        let mut rotated = pins;
        for _ in 0..self.quarter_turns() {
            rotated = quarter_turn_sides(rotated);
        }
        rotated
    }

    /// Which side the pins of unrotated `side` occupy after rotation.
    pub fn map_side(self, side: Side) -> Side {
        let mut current = side;
        for _ in 0..self.quarter_turns() {
            current = match current {
                Side::Top => Side::Left,
                Side::Right => Side::Top,
                Side::Bottom => Side::Right,
                Side::Left => Side::Bottom,
            };
        }
        current
    }

    /// Where pin `pin` of the unrotated layout `pins` ends up after
    /// rotation. `None` when the pin number is out of range.
    pub fn map_pin(self, pins: SidePins, pin: u32) -> Option<u32> {
        let total = pins.total();
        if pin == 0 || pin > total {
            return None;
        }
        let mut layout = pins;
        let mut current = pin;
        for _ in 0..self.quarter_turns() {
            current = (current - 1 + total - layout.left) % total + 1;
            layout = quarter_turn_sides(layout);
        }
        Some(current)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// One CCW quarter turn: new (left, top, right, bottom) = old (top,
/// right, bottom, left).
fn quarter_turn_sides(pins: SidePins) -> SidePins {
    SidePins {
        left: pins.top,
        top: pins.right,
        right: pins.bottom,
        bottom: pins.left,
    }
}

/// Aspect class of a pin layout: whether more pins stack along the
/// vertical (left/right) sides, the horizontal (top/bottom) sides, or
/// neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectClass {
    Square,
    Tall,
    Wide,
}

pub fn aspect_class(pins: &SidePins) -> AspectClass {
    use std::cmp::Ordering;
    match pins.vertical().cmp(&pins.horizontal()) {
        Ordering::Equal => AspectClass::Square,
        Ordering::Greater => AspectClass::Tall,
        Ordering::Less => AspectClass::Wide,
    }
}

/// Rotations worth attempting when matching `candidate` against
/// `target`. Half turns never change a layout's aspect class and are
/// always tried; quarter turns are tried only for square layouts or
/// when the quarter-turned candidate lands in the target's aspect
/// class (a genuinely rotated chip).
pub fn valid_rotations(candidate: &SidePins, target: &SidePins) -> Vec<Rotation> {
    let target_class = aspect_class(target);
    Rotation::ALL
        .iter()
        .copied()
        .filter(|r| match r.quarter_turns() % 2 {
            0 => true,
            _ => {
                aspect_class(candidate) == AspectClass::Square
                    || aspect_class(&r.apply_sides(*candidate)) == target_class
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_counts_cycle() {
        let pins = SidePins::new(2, 3, 1, 4); // l=2 r=3 t=1 b=4
        let r90 = Rotation::R90.apply_sides(pins);
        assert_eq!((r90.left, r90.top, r90.right, r90.bottom), (1, 3, 4, 2));

        let full = Rotation::R270.apply_sides(Rotation::R90.apply_sides(pins));
        assert_eq!(Rotation::R180.apply_sides(Rotation::R180.apply_sides(pins)), pins);
        assert_eq!(full, Rotation::R0.apply_sides(pins));
    }

    #[test]
    fn pin_map_is_cyclic_shift() {
        // l=1 t=1 r=1 b=1: pins 1 (left) 2 (top) 3 (right) 4 (bottom).
        let pins = SidePins::new(1, 1, 1, 1);
        // One CCW turn: old top becomes new left, so pin 2 -> 1.
        assert_eq!(Rotation::R90.map_pin(pins, 2), Some(1));
        assert_eq!(Rotation::R90.map_pin(pins, 1), Some(4));
        assert_eq!(Rotation::R180.map_pin(pins, 1), Some(3));
        assert_eq!(Rotation::R0.map_pin(pins, 3), Some(3));
        assert_eq!(Rotation::R90.map_pin(pins, 5), None);
    }

    #[test]
    fn pin_map_is_a_permutation() {
        let pins = SidePins::new(3, 2, 4, 1);
        for rotation in Rotation::ALL {
            let mut seen: Vec<u32> = (1..=pins.total())
                .map(|p| rotation.map_pin(pins, p).unwrap())
                .collect();
            seen.sort_unstable();
            let expected: Vec<u32> = (1..=pins.total()).collect();
            assert_eq!(seen, expected, "{rotation} must permute pin numbers");
        }
    }

    #[test]
    fn side_map_matches_side_counts() {
        let pins = SidePins::new(2, 3, 1, 4);
        for rotation in Rotation::ALL {
            let rotated = rotation.apply_sides(pins);
            for side in Side::CCW {
                assert_eq!(rotated.count(rotation.map_side(side)), pins.count(side));
            }
            // The inverse side map undoes the forward one.
            for side in Side::CCW {
                assert_eq!(rotation.inverse().map_side(rotation.map_side(side)), side);
            }
        }
    }

    #[test]
    fn inverse_round_trips() {
        let pins = SidePins::new(2, 1, 3, 0);
        for rotation in Rotation::ALL {
            let rotated = rotation.apply_sides(pins);
            for pin in 1..=pins.total() {
                let mapped = rotation.map_pin(pins, pin).unwrap();
                let back = rotation.inverse().map_pin(rotated, mapped).unwrap();
                assert_eq!(back, pin);
            }
        }
    }

    #[test]
    fn quarter_turns_gated_by_aspect() {
        let tall = SidePins::new(4, 4, 0, 0);
        let square = SidePins::new(1, 1, 1, 1);
        let wide = SidePins::new(0, 0, 4, 4);

        // Tall candidate vs tall target: no quarter turns.
        assert_eq!(
            valid_rotations(&tall, &tall),
            vec![Rotation::R0, Rotation::R180]
        );
        // Tall candidate vs wide target: quarter turns make the aspects match.
        assert!(valid_rotations(&tall, &wide).contains(&Rotation::R90));
        // Square candidates may always rotate.
        assert_eq!(valid_rotations(&square, &tall), Rotation::ALL.to_vec());
    }
}
