//! Netlist extraction from geometry.
//!
//! Derives a template's netlist from its geometric model: wire-linked
//! pins are grouped into equipotential sets with a union-find, and
//! labels contribute named net ports to the group their pin belongs
//! to. The planner diffs the extracted netlist against the target.

use std::collections::HashMap;

use super::model::{PinRef, Schematic};
use crate::netlist::{BoxSpec, Connection, InputNetlist, Net, Port};

/// Extracts an [`InputNetlist`] from a geometric model.
pub struct NetlistExtractor;

impl NetlistExtractor {
    pub fn extract(model: &Schematic) -> InputNetlist {
        let mut netlist = InputNetlist::new();

        for chip in &model.chips {
            let mut spec = BoxSpec::new(chip.id.clone());
            spec.pins = chip.pins;
            spec.position = Some(chip.origin);
            netlist.add_box(spec);
        }

        // Union-find over every pin that appears as a wire terminus or
        // a label anchor.
        let mut pins: Vec<PinRef> = Vec::new();
        let mut index: HashMap<PinRef, usize> = HashMap::new();
        let mut intern = |pin: &PinRef, pins: &mut Vec<PinRef>, index: &mut HashMap<PinRef, usize>| {
            *index.entry(pin.clone()).or_insert_with(|| {
                pins.push(pin.clone());
                pins.len() - 1
            })
        };

        let mut links: Vec<(usize, usize)> = Vec::new();
        for wire in &model.wires {
            if let (Some(from), Some(to)) = (&wire.from, &wire.to) {
                let a = intern(from, &mut pins, &mut index);
                let b = intern(to, &mut pins, &mut index);
                links.push((a, b));
            }
        }
        for label in &model.labels {
            intern(&label.at, &mut pins, &mut index);
        }

        let mut parent: Vec<usize> = (0..pins.len()).collect();
        for (a, b) in links {
            unite(&mut parent, a, b);
        }

        // Net names per group, in label order; net declarations in
        // first-appearance order.
        let mut group_nets: HashMap<usize, Vec<String>> = HashMap::new();
        for label in &model.labels {
            let g = find(&mut parent, index[&label.at]);
            let names = group_nets.entry(g).or_default();
            if !names.contains(&label.text) {
                names.push(label.text.clone());
            }
            if !netlist.nets.iter().any(|n| n.name == label.text) {
                netlist.add_net(Net::new(label.text.clone()));
            }
        }

        // Emit one connection per group, in order of each group's
        // first interned pin, so extraction is deterministic.
        let mut emitted: HashMap<usize, ()> = HashMap::new();
        for i in 0..pins.len() {
            let g = find(&mut parent, i);
            if emitted.contains_key(&g) {
                continue;
            }
            emitted.insert(g, ());

            let mut members: Vec<usize> = (0..pins.len())
                .filter(|&j| find(&mut parent, j) == g)
                .collect();
            members.sort_unstable();

            let mut ports: Vec<Port> = members
                .iter()
                .map(|&j| Port::pin(pins[j].chip.clone(), pins[j].pin))
                .collect();
            for name in group_nets.get(&g).into_iter().flatten() {
                ports.push(Port::net(name.clone()));
            }

            // A lone unlabeled pin is not a connection.
            if ports.len() >= 2 {
                netlist.add_connection(Connection::new(ports));
            }
        }

        netlist
    }
}

impl Schematic {
    /// The netlist this model realizes. See [`NetlistExtractor`].
    pub fn to_netlist(&self) -> InputNetlist {
        NetlistExtractor::extract(self)
    }
}

fn find(parent: &mut [usize], i: usize) -> usize {
    if parent[i] != i {
        parent[i] = find(parent, parent[i]);
    }
    parent[i]
}

fn unite(parent: &mut [usize], i: usize, j: usize) {
    let pi = find(parent, i);
    let pj = find(parent, j);
    if pi != pj {
        parent[pi] = pj;
    }
}
