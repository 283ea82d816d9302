//! Edit-operation application.
//!
//! Each operation is validated against the model before anything is
//! mutated: structural-reference failures (unknown chip or pin) are
//! hard errors and leave the model untouched. Routing outcomes such as
//! a degenerate or fallback route are returned as issues, not errors.

use serde::{Deserialize, Serialize};

use super::ops::EditOperation;
use super::router::{route, RouteKind, RouterConfig};
use crate::geom::{Facing, ModelError, Passive, PinRef, Point, Schematic, Wire};
use crate::netlist::{Side, SidePins};

/// A non-fatal outcome recorded while applying an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdaptIssue {
    /// A requested wire had coincident endpoints; the edit was a no-op.
    DegenerateRoute { from: PinRef, to: PinRef },
    /// A wire was routed with the straight/elbow heuristic instead of
    /// the obstacle-avoiding grid search.
    FallbackRoute { from: PinRef, to: PinRef },
}

impl std::fmt::Display for AdaptIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdaptIssue::DegenerateRoute { from, to } => {
                write!(f, "skipped zero-length wire {from} -> {to}")
            }
            AdaptIssue::FallbackRoute { from, to } => {
                write!(f, "wire {from} -> {to} used the heuristic fallback route")
            }
        }
    }
}

/// Apply one edit to the model.
pub fn apply(
    model: &mut Schematic,
    op: &EditOperation,
    router: &RouterConfig,
) -> Result<Option<AdaptIssue>, ModelError> {
    match op {
        EditOperation::AddPinToSide {
            box_id,
            side,
            after,
            before,
        } => {
            let offset = insertion_offset(model, box_id, *side, *after, *before)?;
            model.insert_pin(box_id, *side, offset)?;
            Ok(None)
        }

        EditOperation::RemovePinFromSide { box_id, side, pin } => {
            let chip = model
                .chip(box_id)
                .ok_or_else(|| ModelError::UnknownChip(box_id.clone()))?;
            let located = chip.pins.locate(*pin);
            match located {
                Some((s, offset)) if s == *side => {
                    model.remove_pin(box_id, *side, offset)?;
                    Ok(None)
                }
                _ => Err(ModelError::UnknownPin {
                    chip: box_id.clone(),
                    pin: *pin,
                }),
            }
        }

        EditOperation::AddLabelToPin { box_id, pin, net } => {
            model.attach_label(PinRef::new(box_id.clone(), *pin), net.clone())?;
            Ok(None)
        }

        EditOperation::ClearPin { box_id, pin } => {
            model.clear_pin(&PinRef::new(box_id.clone(), *pin))?;
            Ok(None)
        }

        EditOperation::AddPassiveToPin { box_id, pin, prefix } => {
            insert_passive(model, box_id, *pin, prefix)?;
            Ok(None)
        }

        EditOperation::RemoveChip { box_id } => {
            model.remove_chip(box_id)?;
            Ok(None)
        }

        EditOperation::DrawLineBetweenPins { from, to } => {
            match route(model, from, to, router)? {
                None => Ok(Some(AdaptIssue::DegenerateRoute {
                    from: from.clone(),
                    to: to.clone(),
                })),
                Some(routed) => {
                    let fallback = routed.kind == RouteKind::Fallback;
                    model.wires.push(Wire {
                        points: routed.points,
                        from: Some(from.clone()),
                        to: Some(to.clone()),
                        net: None,
                    });
                    Ok(fallback.then(|| AdaptIssue::FallbackRoute {
                        from: from.clone(),
                        to: to.clone(),
                    }))
                }
            }
        }
    }
}

/// Apply a whole plan in order, collecting issues.
pub fn apply_all(
    model: &mut Schematic,
    ops: &[EditOperation],
    router: &RouterConfig,
) -> Result<Vec<AdaptIssue>, ModelError> {
    let mut issues = Vec::new();
    for op in ops {
        tracing::debug!(op = %op, "applying edit");
        if let Some(issue) = apply(model, op, router)? {
            tracing::warn!(issue = %issue, "edit raised an issue");
            issues.push(issue);
        }
    }
    Ok(issues)
}

/// Resolve an `(after, before)` pin-number pair into a 0-based offset
/// on the side's CCW run. Both anchors, when present, must exist on
/// the named side.
fn insertion_offset(
    model: &Schematic,
    box_id: &str,
    side: Side,
    after: Option<u32>,
    before: Option<u32>,
) -> Result<u32, ModelError> {
    let chip = model
        .chip(box_id)
        .ok_or_else(|| ModelError::UnknownChip(box_id.to_string()))?;

    let locate_on_side = |pin: u32| -> Result<u32, ModelError> {
        match chip.pins.locate(pin) {
            Some((s, offset)) if s == side => Ok(offset),
            _ => Err(ModelError::UnknownPin {
                chip: box_id.to_string(),
                pin,
            }),
        }
    };

    match (after, before) {
        (Some(a), _) => Ok(locate_on_side(a)? + 1),
        (None, Some(b)) => Ok(locate_on_side(b)?),
        // Empty gap sentinel: append at the end of the side.
        (None, None) => Ok(chip.pins.count(side)),
    }
}

/// Insert a two-pin passive in-line at a host pin: place its body one
/// gap out along the pin's facing, re-anchor every existing wire at
/// the host pin onto the passive's far pin, and wire the host pin to
/// the passive's near pin.
fn insert_passive(
    model: &mut Schematic,
    box_id: &str,
    pin: u32,
    prefix: &str,
) -> Result<(), ModelError> {
    let host = PinRef::new(box_id, pin);
    let host_pos = model.pin_position(&host)?;
    let facing = model.pin_facing(&host)?;

    // Two pins across the facing axis.
    let pins = match facing {
        Facing::Left | Facing::Right => SidePins::new(1, 1, 0, 0),
        Facing::Up | Facing::Down => SidePins::new(0, 0, 1, 1),
    };

    // Body placement: the near pin sits one wire gap out from the host
    // pin. Body is 4x4 units (one pin per side).
    let gap = crate::geom::PIN_SPACING;
    let (origin, near_pin, far_pin) = match facing {
        Facing::Right => (host_pos.offset(gap, -2), 1, 2),
        Facing::Left => (host_pos.offset(-gap - 4, -2), 2, 1),
        Facing::Down => (host_pos.offset(-2, gap), 1, 2),
        Facing::Up => (host_pos.offset(-2, -gap - 4), 2, 1),
    };

    // Pick an identifier not already used by a chip in this model;
    // authored templates may own low numbers of the same prefix.
    let id = loop {
        let candidate = model.next_passive_id(prefix);
        if model.chip(&candidate).is_none() {
            break candidate;
        }
    };

    model.add_chip(id.clone(), pins, origin)?;

    // Re-anchor every wire leaving the host pin onto the far pin of
    // the passive, so the passive sits in-line even when the host pin
    // carries a multi-point connection.
    let far_ref = PinRef::new(id.clone(), far_pin);
    let far_pos = model.pin_position(&far_ref)?;
    for wire in model.wires.iter_mut().filter(|w| w.anchored_to(&host)) {
        if wire.from.as_ref() == Some(&host) {
            wire.from = Some(far_ref.clone());
            if let Some(first) = wire.points.first_mut() {
                *first = far_pos;
            }
        }
        if wire.to.as_ref() == Some(&host) {
            wire.to = Some(far_ref.clone());
            if let Some(last) = wire.points.last_mut() {
                *last = far_pos;
            }
        }
    }

    // Short connecting stub from the host pin to the passive.
    let near_ref = PinRef::new(id.clone(), near_pin);
    let near_pos = model.pin_position(&near_ref)?;
    model.wires.push(Wire {
        points: vec![host_pos, near_pos],
        from: Some(host.clone()),
        to: Some(near_ref),
        net: None,
    });

    model.passives.push(Passive {
        id: id.clone(),
        chip_id: id,
        at: host,
    });
    Ok(())
}
