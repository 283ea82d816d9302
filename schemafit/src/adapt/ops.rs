//! Edit operations.
//!
//! One atomic structural change applied to a template to move it toward
//! a target netlist. Operations are created by the planner, applied
//! exactly once by the applier, and kept only as an audit trail. Each
//! variant carries exactly the fields needed to apply it, and every
//! consumption site matches exhaustively.

use serde::{Deserialize, Serialize};

use crate::geom::PinRef;
use crate::netlist::Side;

/// A single planned structural edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOperation {
    /// Insert a pin on a chip side. The insertion point is the gap
    /// between two existing pin numbers on that side; `None` on either
    /// end is the sentinel for the start or end of the side's run.
    AddPinToSide {
        box_id: String,
        side: Side,
        after: Option<u32>,
        before: Option<u32>,
    },

    /// Remove a specific pin from a chip side.
    RemovePinFromSide {
        box_id: String,
        side: Side,
        pin: u32,
    },

    /// Attach a net label to a pin.
    AddLabelToPin {
        box_id: String,
        pin: u32,
        net: String,
    },

    /// Detach every label and wire terminus from a pin.
    ClearPin { box_id: String, pin: u32 },

    /// Insert a two-pin passive in-line at a pin. `prefix` picks the
    /// identifier family (`R`, `C`, ...); the applier assigns the next
    /// free number.
    AddPassiveToPin {
        box_id: String,
        pin: u32,
        prefix: String,
    },

    /// Delete a chip and everything transitively anchored to it.
    RemoveChip { box_id: String },

    /// Route a new wire between two pins.
    DrawLineBetweenPins { from: PinRef, to: PinRef },
}

impl std::fmt::Display for EditOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditOperation::AddPinToSide {
                box_id,
                side,
                after,
                before,
            } => {
                write!(f, "add pin to {box_id} {side} side (")?;
                match (after, before) {
                    (Some(a), Some(b)) => write!(f, "between pins {a} and {b})"),
                    (Some(a), None) => write!(f, "after pin {a})"),
                    (None, Some(b)) => write!(f, "before pin {b})"),
                    (None, None) => write!(f, "only pin on side)"),
                }
            }
            EditOperation::RemovePinFromSide { box_id, side, pin } => {
                write!(f, "remove pin {pin} from {box_id} {side} side")
            }
            EditOperation::AddLabelToPin { box_id, pin, net } => {
                write!(f, "label {box_id}.{pin} as {net}")
            }
            EditOperation::ClearPin { box_id, pin } => write!(f, "clear {box_id}.{pin}"),
            EditOperation::AddPassiveToPin { box_id, pin, prefix } => {
                write!(f, "insert {prefix}-passive at {box_id}.{pin}")
            }
            EditOperation::RemoveChip { box_id } => write!(f, "remove chip {box_id}"),
            EditOperation::DrawLineBetweenPins { from, to } => {
                write!(f, "draw line {from} -> {to}")
            }
        }
    }
}
