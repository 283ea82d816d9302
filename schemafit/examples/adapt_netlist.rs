//! Adapt the builtin templates to a netlist and print the edit plan.
//!
//! Pass a JSON netlist file as the first argument, or run without
//! arguments to use a small built-in demo netlist.

use schemafit::netlist::{BoxSpec, Connection, Net, Port};
use schemafit::prelude::*;
use schemafit::templates::builtin;

fn demo_netlist() -> InputNetlist {
    // One 2x2 chip with a label on each pin plus a decoupling cap.
    let mut netlist = InputNetlist::new();
    netlist.add_box(BoxSpec::new("U1").with_pins(2, 2, 0, 0));
    netlist.add_box(BoxSpec::new("C1").with_pins(1, 1, 0, 0));
    netlist.add_net(Net::new("GND"));
    netlist.add_net(Net::new("VCC"));
    netlist.add_connection(Connection::between(Port::pin("U1", 1), Port::net("GND")));
    netlist.add_connection(Connection::between(Port::pin("U1", 2), Port::net("IN")));
    netlist.add_connection(Connection::between(Port::pin("U1", 3), Port::net("OUT")));
    netlist.add_connection(Connection::new(vec![
        Port::pin("U1", 4),
        Port::pin("C1", 1),
        Port::net("VCC"),
    ]));
    netlist
}

fn main() -> Result<(), AdaptError> {
    let target = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path).unwrap_or_else(|e| {
                eprintln!("Cannot read {path}: {e}");
                eprintln!("Usage: cargo run --example adapt_netlist [netlist.json]");
                std::process::exit(1);
            });
            serde_json::from_str(&text).unwrap_or_else(|e| {
                eprintln!("Invalid netlist JSON in {path}: {e}");
                std::process::exit(1);
            })
        }
        None => demo_netlist(),
    };

    let templates = builtin::all();
    let outcome = SchemaFitCore::adapt_best(&templates, &target, &AdaptOptions::default())?;

    println!("Chose template: {} (score {})", outcome.template, outcome.score());
    println!("Box matches:");
    for m in &outcome.report.matches {
        match m.candidate_box {
            Some(c) => println!(
                "  target #{} <- candidate #{} ({}, score {})",
                m.target_box, c, m.rotation, m.score
            ),
            None => println!("  target #{} unmatched", m.target_box),
        }
    }

    if outcome.operations.is_empty() {
        println!("No edits required; the template already fits.");
    } else {
        println!("Edits ({}):", outcome.operations.len());
        for op in &outcome.operations {
            println!("  {op}");
        }
    }

    for issue in &outcome.issues {
        println!("note: {issue}");
    }

    println!(
        "Adapted model: {} chips, {} wires, {} labels, {} passives",
        outcome.model.chips.len(),
        outcome.model.wires.len(),
        outcome.model.labels.len(),
        outcome.model.passives.len()
    );
    Ok(())
}
