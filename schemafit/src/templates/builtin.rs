//! Built-in template models compiled into the crate.

use super::Template;
use crate::geom::{ModelError, PinRef, Point, Schematic};
use crate::netlist::SidePins;

/// Every built-in template, in registry order.
pub fn all() -> Vec<Template> {
    vec![
        Template::new("passthrough", passthrough),
        Template::new("series-passive", series_passive),
        Template::new("decoupled-chip", decoupled_chip),
    ]
}

/// One chip with a single pin per side, input labeled `IN`, output
/// labeled `OUT`.
pub fn passthrough() -> Schematic {
    build_passthrough().expect("builtin template is well formed")
}

fn build_passthrough() -> Result<Schematic, ModelError> {
    let mut model = Schematic::new();
    model.add_chip("U1", SidePins::new(1, 1, 0, 0), Point::new(0, 0))?;
    model.attach_label(PinRef::new("U1", 1), "IN")?;
    model.attach_label(PinRef::new("U1", 2), "OUT")?;
    Ok(model)
}

/// A source chip wired through a series two-pin passive into a load
/// chip.
pub fn series_passive() -> Schematic {
    build_series_passive().expect("builtin template is well formed")
}

fn build_series_passive() -> Result<Schematic, ModelError> {
    let mut model = Schematic::new();
    model.add_chip("U1", SidePins::new(0, 1, 0, 0), Point::new(0, 0))?;
    model.add_chip("R1", SidePins::new(1, 1, 0, 0), Point::new(8, 0))?;
    model.add_chip("U2", SidePins::new(1, 0, 0, 0), Point::new(16, 0))?;
    wire(&mut model, PinRef::new("U1", 1), PinRef::new("R1", 1))?;
    wire(&mut model, PinRef::new("R1", 2), PinRef::new("U2", 1))?;
    Ok(model)
}

/// One chip with two pins per vertical side: ground and input on the
/// left, output and supply on the right.
pub fn decoupled_chip() -> Schematic {
    build_decoupled_chip().expect("builtin template is well formed")
}

fn build_decoupled_chip() -> Result<Schematic, ModelError> {
    let mut model = Schematic::new();
    model.add_chip("U1", SidePins::new(2, 2, 0, 0), Point::new(0, 0))?;
    model.attach_label(PinRef::new("U1", 1), "GND")?;
    model.attach_label(PinRef::new("U1", 2), "IN")?;
    model.attach_label(PinRef::new("U1", 3), "OUT")?;
    model.attach_label(PinRef::new("U1", 4), "VCC")?;
    Ok(model)
}

fn wire(model: &mut Schematic, from: PinRef, to: PinRef) -> Result<(), ModelError> {
    let points = vec![model.pin_position(&from)?, model.pin_position(&to)?];
    model.wires.push(crate::geom::Wire {
        points,
        from: Some(from),
        to: Some(to),
        net: None,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_builds_and_extracts() {
        for template in all() {
            let model = (template.build)();
            let netlist = model.to_netlist();
            assert!(!netlist.boxes.is_empty(), "{} has no boxes", template.name);
        }
    }

    #[test]
    fn series_passive_realizes_its_wiring() {
        let netlist = series_passive().to_netlist();
        assert_eq!(netlist.boxes.len(), 3);
        assert_eq!(netlist.connections.len(), 2);
    }

    #[test]
    fn builtin_templates_are_self_compatible() {
        use crate::matcher::are_compatible;
        for template in all() {
            let netlist = (template.build)().to_netlist();
            assert!(
                are_compatible(&netlist, &netlist).unwrap(),
                "{} is not self-compatible",
                template.name
            );
        }
    }
}
