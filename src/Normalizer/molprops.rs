//! Module to calculate the molecular formula and the [M+H] monoisotopic mass
//! of a parsed structure. Implicit hydrogens are filled from default
//! valences minus the bond-order sum around each atom (aromatic bonds count
//! as 1.5); bracket atoms carry their hydrogen count explicitly.

use crate::Normalizer::structure::{Structure, StructureError, Token};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// sentinel recorded for both derived fields when a structure coming out of
/// an upstream tool cannot be parsed; kept because several prediction tools
/// emit SMILES without properly assigned charges
pub const INCOMPATIBLE_STRUCTURE: &str = "Incompatible structure";

/// mass added for the [M+H] adduct
pub const MASS_MH_PROTON: f64 = 1.00782503207;

// Define a struct to hold element data
pub struct Element {
    name: &'static str,
    monoisotopic_mass: f64,
    valence: u8,
}

// Define a list of elements, their monoisotopic masses and default valences
const ELEMENTS: &[Element] = &[
    Element {
        name: "H",
        monoisotopic_mass: 1.00782503207,
        valence: 1,
    },
    Element {
        name: "B",
        monoisotopic_mass: 11.0093054,
        valence: 3,
    },
    Element {
        name: "C",
        monoisotopic_mass: 12.0,
        valence: 4,
    },
    Element {
        name: "N",
        monoisotopic_mass: 14.0030740048,
        valence: 3,
    },
    Element {
        name: "O",
        monoisotopic_mass: 15.9949146196,
        valence: 2,
    },
    Element {
        name: "F",
        monoisotopic_mass: 18.99840322,
        valence: 1,
    },
    Element {
        name: "Na",
        monoisotopic_mass: 22.9897692809,
        valence: 1,
    },
    Element {
        name: "Mg",
        monoisotopic_mass: 23.9850417,
        valence: 2,
    },
    Element {
        name: "Si",
        monoisotopic_mass: 27.9769265325,
        valence: 4,
    },
    Element {
        name: "P",
        monoisotopic_mass: 30.97376163,
        valence: 3,
    },
    Element {
        name: "S",
        monoisotopic_mass: 31.97207100,
        valence: 2,
    },
    Element {
        name: "Cl",
        monoisotopic_mass: 34.96885268,
        valence: 1,
    },
    Element {
        name: "K",
        monoisotopic_mass: 38.96370668,
        valence: 1,
    },
    Element {
        name: "Ca",
        monoisotopic_mass: 39.96259098,
        valence: 2,
    },
    Element {
        name: "Fe",
        monoisotopic_mass: 55.9349375,
        valence: 2,
    },
    Element {
        name: "Cu",
        monoisotopic_mass: 62.9295975,
        valence: 2,
    },
    Element {
        name: "Zn",
        monoisotopic_mass: 63.9291422,
        valence: 2,
    },
    Element {
        name: "Se",
        monoisotopic_mass: 79.9165213,
        valence: 2,
    },
    Element {
        name: "Br",
        monoisotopic_mass: 78.9183371,
        valence: 1,
    },
    Element {
        name: "I",
        monoisotopic_mass: 126.904473,
        valence: 1,
    },
    // Add more elements here...
];

fn element_data(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.name == symbol)
}

/// Molecular formula (Hill order) and monoisotopic [M+H] mass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolProps {
    pub formula: String,
    pub mass_mh: f64,
}

/// Compute formula and [M+H] for a structure string. Fails with
/// `InvalidStructure` on unparseable input and `UnknownElement` when the
/// structure carries an element outside the supported table; callers record
/// both as the `"Incompatible structure"` sentinel instead of aborting.
pub fn molecular_properties(smiles: &str) -> Result<MolProps, StructureError> {
    let structure = Structure::parse(smiles)?;
    properties_of(&structure)
}

pub fn properties_of(structure: &Structure) -> Result<MolProps, StructureError> {
    struct Acc {
        element: String,
        aromatic: bool,
        bracket: bool,
        h_explicit: u8,
        bond_sum: f64,
    }
    let mut atoms: Vec<Acc> = Vec::new();
    let mut branch_stack: Vec<Option<usize>> = Vec::new();
    let mut prev: Option<usize> = None;
    let mut pending: Option<char> = None;
    let mut ring_open: HashMap<String, (usize, Option<char>)> = HashMap::new();
    for token in structure.tokens() {
        match token {
            Token::Atom(a) => {
                let idx = atoms.len();
                atoms.push(Acc {
                    element: a.element.clone(),
                    aromatic: a.aromatic,
                    bracket: a.bracket,
                    h_explicit: a.h_count,
                    bond_sum: 0.0,
                });
                if let Some(p) = prev {
                    let order = bond_order(pending.take(), atoms[p].aromatic && a.aromatic);
                    atoms[p].bond_sum += order;
                    atoms[idx].bond_sum += order;
                }
                pending = None;
                prev = Some(idx);
            }
            Token::Bond(b) => pending = Some(*b),
            Token::Open => branch_stack.push(prev),
            Token::Close => {
                prev = branch_stack.pop().flatten();
                pending = None;
            }
            Token::Ring(id) => {
                // the parser guarantees ring tokens follow an atom
                if let Some(cur) = prev {
                    if let Some((other, stored)) = ring_open.remove(id) {
                        let order = bond_order(
                            pending.take().or(stored),
                            atoms[other].aromatic && atoms[cur].aromatic,
                        );
                        atoms[other].bond_sum += order;
                        atoms[cur].bond_sum += order;
                    } else {
                        ring_open.insert(id.clone(), (cur, pending.take()));
                    }
                }
            }
            Token::Dot => {
                prev = None;
                pending = None;
            }
        }
    }

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut h_total: u64 = 0;
    for atom in &atoms {
        let element = element_data(&atom.element).ok_or_else(|| StructureError::UnknownElement {
            element: atom.element.clone(),
            structure: structure.canonical_smiles(),
        })?;
        *counts.entry(atom.element.clone()).or_insert(0) += 1;
        if atom.bracket {
            h_total += atom.h_explicit as u64;
        } else {
            let free = element.valence as f64 - atom.bond_sum;
            if free > 0.0 {
                h_total += free.floor() as u64;
            }
        }
    }
    if h_total > 0 {
        *counts.entry("H".to_string()).or_insert(0) += h_total;
    }

    let mut mass = 0.0;
    for (symbol, n) in &counts {
        let element = element_data(symbol).ok_or_else(|| StructureError::UnknownElement {
            element: symbol.clone(),
            structure: structure.canonical_smiles(),
        })?;
        mass += element.monoisotopic_mass * *n as f64;
    }
    Ok(MolProps {
        formula: hill_formula(&counts),
        mass_mh: mass + MASS_MH_PROTON,
    })
}

/// Display pair (formula, mass) with the documented sentinel on failure.
pub fn properties_or_sentinel(smiles: &str) -> (String, String) {
    match molecular_properties(smiles) {
        Ok(props) => (props.formula, format!("{:.5}", props.mass_mh)),
        Err(e) => {
            warn!("molecular properties unavailable: {}", e);
            (
                INCOMPATIBLE_STRUCTURE.to_string(),
                INCOMPATIBLE_STRUCTURE.to_string(),
            )
        }
    }
}

fn bond_order(bond: Option<char>, aromatic_pair: bool) -> f64 {
    match bond {
        Some('=') => 2.0,
        Some('#') => 3.0,
        Some('$') => 4.0,
        Some(':') => 1.5,
        Some('-') | Some('/') | Some('\\') => 1.0,
        Some(_) => 1.0,
        None => {
            if aromatic_pair {
                1.5
            } else {
                1.0
            }
        }
    }
}

fn hill_formula(counts: &BTreeMap<String, u64>) -> String {
    let mut out = String::new();
    if counts.contains_key("C") {
        write_element(&mut out, "C", counts["C"]);
        if let Some(h) = counts.get("H") {
            write_element(&mut out, "H", *h);
        }
        for (symbol, n) in counts {
            if symbol != "C" && symbol != "H" {
                write_element(&mut out, symbol, *n);
            }
        }
    } else {
        for (symbol, n) in counts {
            write_element(&mut out, symbol, *n);
        }
    }
    out
}

fn write_element(out: &mut String, symbol: &str, n: u64) {
    out.push_str(symbol);
    if n > 1 {
        out.push_str(&n.to_string());
    }
}
