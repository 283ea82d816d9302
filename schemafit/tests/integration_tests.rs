//! Integration tests for the SchemaFit library

use schemafit::adapt::{apply, apply_all, RouterConfig};
use schemafit::netlist::{BoxSpec, Connection, Net, Port};
use schemafit::prelude::*;
use schemafit::templates::builtin;
use schemafit::{match_netlists, normalize, PinRef, Point};

fn chip_template(left: u32, right: u32) -> Schematic {
    let mut model = Schematic::new();
    model
        .add_chip("U1", SidePins::new(left, right, 0, 0), Point::new(0, 0))
        .unwrap();
    model
}

#[test]
fn test_grow_both_sides_end_to_end() {
    // A 1-pin-per-side template adapted to a 2-pins-per-side target:
    // exactly one pin addition per side, then contiguous renumbering.
    let template = chip_template(1, 1);
    let mut target = InputNetlist::new();
    target.add_box(BoxSpec::new("X").with_pins(2, 2, 0, 0));

    let outcome =
        SchemaFitCore::adapt_model("t", &template, &target, &AdaptOptions::default()).unwrap();

    let additions = outcome
        .operations
        .iter()
        .filter(|op| matches!(op, EditOperation::AddPinToSide { .. }))
        .count();
    assert_eq!(additions, 2);
    assert_eq!(outcome.operations.len(), 2);

    let pins = outcome.model.chip("U1").unwrap().pins;
    assert_eq!(pins, SidePins::new(2, 2, 0, 0));
    for pin in 1..=4 {
        assert!(pins.locate(pin).is_some(), "pin {pin} must exist");
    }
    assert!(pins.locate(5).is_none());
}

#[test]
fn test_label_addition_precedes_clear_end_to_end() {
    let mut template = chip_template(2, 2);
    template
        .attach_label(PinRef::new("U1", 4), "STALE")
        .unwrap();

    let mut target = InputNetlist::new();
    target.add_box(BoxSpec::new("X").with_pins(2, 2, 0, 0));
    target.add_net(Net::new("IN"));
    target.add_connection(Connection::between(Port::pin("X", 1), Port::net("IN")));

    let outcome =
        SchemaFitCore::adapt_model("t", &template, &target, &AdaptOptions::default()).unwrap();

    assert_eq!(
        outcome.operations,
        vec![
            EditOperation::AddLabelToPin {
                box_id: "U1".to_string(),
                pin: 1,
                net: "IN".to_string(),
            },
            EditOperation::ClearPin {
                box_id: "U1".to_string(),
                pin: 4,
            },
        ]
    );

    let added: Vec<_> = outcome.model.labels_at(&PinRef::new("U1", 1)).collect();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].text, "IN");
    assert_eq!(outcome.model.labels_at(&PinRef::new("U1", 4)).count(), 0);
}

#[test]
fn test_long_haul_connection_takes_fallback_route() {
    // Pins 16 units apart: past the grid search bound, so the wire is
    // a single straight run instead of a searched path.
    let mut template = Schematic::new();
    template
        .add_chip("U1", SidePins::new(0, 1, 0, 0), Point::new(0, 0))
        .unwrap();
    template
        .add_chip("U2", SidePins::new(1, 0, 0, 0), Point::new(20, 0))
        .unwrap();

    let mut target = InputNetlist::new();
    target.add_box(BoxSpec::new("A").with_pins(0, 1, 0, 0));
    target.add_box(BoxSpec::new("B").with_pins(1, 0, 0, 0));
    target.add_connection(Connection::between(Port::pin("A", 1), Port::pin("B", 1)));

    let outcome =
        SchemaFitCore::adapt_model("t", &template, &target, &AdaptOptions::default()).unwrap();

    assert!(outcome
        .operations
        .iter()
        .any(|op| matches!(op, EditOperation::DrawLineBetweenPins { .. })));
    assert!(matches!(
        outcome.issues.as_slice(),
        [AdaptIssue::FallbackRoute { .. }]
    ));

    assert_eq!(outcome.model.wires.len(), 1);
    let wire = &outcome.model.wires[0];
    assert_eq!(wire.points.len(), 2, "straight run, no turns: {:?}", wire.points);
    assert_eq!(wire.points[0].y, wire.points[1].y);
}

#[test]
fn test_adapting_an_exact_target_is_an_empty_plan() {
    for template in builtin::all() {
        let model = (template.build)();
        let target = model.to_netlist();
        let outcome =
            SchemaFitCore::adapt_model(template.name, &model, &target, &AdaptOptions::default())
                .unwrap();
        assert!(
            outcome.operations.is_empty(),
            "{} produced {:?}",
            template.name,
            outcome.operations
        );
        assert_eq!(outcome.model, model);
    }
}

#[test]
fn test_pin_insertion_reanchors_labels() {
    let mut model = chip_template(1, 1);
    model.attach_label(PinRef::new("U1", 2), "OUT").unwrap();

    // Inserting on the left shifts the right-side pin from 2 to 3; the
    // label must follow the logical pin, not the number.
    let op = EditOperation::AddPinToSide {
        box_id: "U1".to_string(),
        side: Side::Left,
        after: Some(1),
        before: None,
    };
    apply(&mut model, &op, &RouterConfig::default()).unwrap();

    assert_eq!(model.labels.len(), 1);
    assert_eq!(model.labels[0].at, PinRef::new("U1", 3));
    let at_new_number: Vec<_> = model.labels_at(&PinRef::new("U1", 3)).collect();
    assert_eq!(at_new_number.len(), 1);
    assert_eq!(at_new_number[0].text, "OUT");
}

#[test]
fn test_remove_chip_leaves_nothing_dangling() {
    let mut model = chip_template(1, 1);
    model
        .add_chip("U2", SidePins::new(1, 0, 0, 0), Point::new(30, 0))
        .unwrap();
    model.attach_label(PinRef::new("U1", 1), "IN").unwrap();

    let ops = vec![
        EditOperation::DrawLineBetweenPins {
            from: PinRef::new("U1", 2),
            to: PinRef::new("U2", 1),
        },
        EditOperation::AddPassiveToPin {
            box_id: "U1".to_string(),
            pin: 2,
            prefix: "R".to_string(),
        },
        EditOperation::RemoveChip {
            box_id: "U1".to_string(),
        },
    ];
    apply_all(&mut model, &ops, &RouterConfig::default()).unwrap();

    assert!(model.chip("U1").is_none());
    assert!(model.chip("R1").is_none(), "hosted passive body must go too");
    for wire in &model.wires {
        for anchor in wire.from.iter().chain(wire.to.iter()) {
            assert_ne!(anchor.chip, "U1");
            assert_ne!(anchor.chip, "R1");
        }
    }
    assert!(model.labels.iter().all(|l| l.at.chip != "U1"));
    assert!(model.passives.is_empty());
}

#[test]
fn test_matcher_is_deterministic() {
    let mut netlist = InputNetlist::new();
    netlist.add_box(BoxSpec::new("U1").with_pins(2, 2, 1, 1));
    netlist.add_box(BoxSpec::new("U2").with_pins(1, 1, 0, 0));
    netlist.add_box(BoxSpec::new("R1").with_pins(1, 1, 0, 0));
    netlist.add_net(Net::new("GND"));
    netlist.add_connection(Connection::between(Port::pin("U1", 1), Port::net("GND")));
    netlist.add_connection(Connection::between(Port::pin("U1", 4), Port::pin("R1", 1)));
    netlist.add_connection(Connection::between(Port::pin("R1", 2), Port::pin("U2", 1)));

    let (normalized, _) = normalize(&netlist).unwrap();
    let first = match_netlists(&normalized, &normalized);
    let second = match_netlists(&normalized, &normalized);
    assert_eq!(first, second);
    assert!(first.is_exact());
}

#[test]
fn test_largest_target_box_claims_the_only_candidate() {
    // T2 (2 pins) and T1 (1 pin) compete for the single 1-pin
    // candidate; largest-first means T2 wins even though T1 fits
    // equally well.
    let mut candidate = InputNetlist::new();
    candidate.add_box(BoxSpec::new("C1").with_pins(1, 0, 0, 0));

    let mut target = InputNetlist::new();
    target.add_box(BoxSpec::new("T1").with_pins(1, 0, 0, 0));
    target.add_box(BoxSpec::new("T2").with_pins(1, 1, 0, 0));

    let (candidate_norm, candidate_transform) = normalize(&candidate).unwrap();
    let (target_norm, target_transform) = normalize(&target).unwrap();
    let report = match_netlists(&candidate_norm, &target_norm);

    let t2 = target_transform.box_index("T2").unwrap();
    let t1 = target_transform.box_index("T1").unwrap();
    let c1 = candidate_transform.box_index("C1").unwrap();

    assert_eq!(report.candidate_for(t2).unwrap().candidate_box, Some(c1));
    assert_eq!(report.candidate_for(t1).unwrap().candidate_box, None);
}

#[test]
fn test_normalize_round_trips_identifiers() {
    let mut netlist = InputNetlist::new();
    netlist.add_box(BoxSpec::new("U1").with_pins(2, 2, 0, 0));
    netlist.add_box(BoxSpec::new("R1").with_pins(1, 1, 0, 0));
    netlist.add_box(BoxSpec::new("BIG").with_pins(4, 4, 2, 2));
    netlist.add_net(Net::new("VCC"));
    netlist.add_net(Net::new("GND"));

    let (_, transform) = normalize(&netlist).unwrap();
    for id in ["U1", "R1", "BIG"] {
        let index = transform.box_index(id).unwrap();
        assert_eq!(transform.box_id(index), Some(id));
    }
    for name in ["VCC", "GND"] {
        let index = transform.net_index(name).unwrap();
        assert_eq!(transform.net_name(index), Some(name));
    }
}

#[test]
fn test_passive_insertion_end_to_end() {
    let template = chip_template(1, 1);

    let mut target = InputNetlist::new();
    target.add_box(BoxSpec::new("X").with_pins(1, 1, 0, 0));
    target.add_box(BoxSpec::new("C3").with_pins(1, 1, 0, 0));
    target.add_connection(Connection::between(Port::pin("X", 2), Port::pin("C3", 1)));

    let outcome =
        SchemaFitCore::adapt_model("t", &template, &target, &AdaptOptions::default()).unwrap();

    assert_eq!(outcome.model.passives.len(), 1);
    let passive = &outcome.model.passives[0];
    assert_eq!(passive.id, "C1");
    assert_eq!(passive.at, PinRef::new("U1", 2));
    assert!(outcome.model.chip("C1").is_some());
    // The host pin is wired into the new passive.
    assert!(outcome.model.pin_in_use(&PinRef::new("U1", 2)));
}

#[test]
fn test_stale_template_wire_is_replaced_by_labels() {
    // The template wires its two chips together; the target puts each
    // pin on its own net instead. Adaptation must drop the wire, land
    // the labels, and converge in one pass.
    let mut template = Schematic::new();
    template
        .add_chip("U1", SidePins::new(0, 1, 0, 0), Point::new(0, 0))
        .unwrap();
    template
        .add_chip("U2", SidePins::new(1, 0, 0, 0), Point::new(12, 0))
        .unwrap();
    apply(
        &mut template,
        &EditOperation::DrawLineBetweenPins {
            from: PinRef::new("U1", 1),
            to: PinRef::new("U2", 1),
        },
        &RouterConfig::default(),
    )
    .unwrap();
    assert_eq!(template.wires.len(), 1);

    let mut target = InputNetlist::new();
    target.add_box(BoxSpec::new("A").with_pins(0, 1, 0, 0));
    target.add_box(BoxSpec::new("B").with_pins(1, 0, 0, 0));
    target.add_connection(Connection::between(Port::pin("A", 1), Port::net("NA")));
    target.add_connection(Connection::between(Port::pin("B", 1), Port::net("NB")));

    let outcome =
        SchemaFitCore::adapt_model("t", &template, &target, &AdaptOptions::default()).unwrap();

    assert!(outcome.model.wires.is_empty(), "wire must not survive");
    let extracted = outcome.model.to_netlist();
    assert!(
        extracted
            .connections
            .iter()
            .all(|c| c.pin_ports().count() < 2),
        "no pin-to-pin connection may remain: {:?}",
        extracted.connections
    );

    let second =
        SchemaFitCore::adapt_model("t", &outcome.model, &target, &AdaptOptions::default()).unwrap();
    assert!(
        second.operations.is_empty(),
        "second pass still wants {:?}",
        second.operations
    );
}

#[test]
fn test_adapted_model_round_trips_through_extraction() {
    // Adapting a template to its own extracted netlist, after a label
    // edit, converges: the adapted model's netlist needs no further
    // edits.
    let mut template = chip_template(1, 1);
    template.attach_label(PinRef::new("U1", 1), "IN").unwrap();

    let mut altered = template.clone();
    altered.attach_label(PinRef::new("U1", 2), "OUT").unwrap();
    let target = altered.to_netlist();

    let first =
        SchemaFitCore::adapt_model("t", &template, &target, &AdaptOptions::default()).unwrap();
    assert!(!first.operations.is_empty());

    let second =
        SchemaFitCore::adapt_model("t", &first.model, &target, &AdaptOptions::default()).unwrap();
    assert!(
        second.operations.is_empty(),
        "second pass still wants {:?}",
        second.operations
    );
}
