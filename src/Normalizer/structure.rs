//! # Structure Canonicalizer Module
//!
//! ## Aim
//! This module parses structure strings (SMILES notation) and turns them into
//! the two things the comparison pipeline actually keys on: a canonical
//! serialization with all stereochemical annotation removed, and a
//! standardized 27-character identifier derived from a content hash of the
//! chosen identity basis.
//!
//! ## Main Data Structures and Logic
//! - `Structure`: token stream produced by the parser, re-serializable with
//!   or without stereochemistry
//! - `AtomToken` / `Token`: atoms (organic subset, aromatic subset, bracket
//!   atoms with isotope/stereo/H-count/charge), bonds, branches, ring
//!   closures and dot separators
//! - `standard_key`: identifier in the `AAAAAAAAAAAAAA-BBBBBBBBSA-N` shape;
//!   with `reduce_specificity` the hash is taken over the stereo-stripped
//!   serialization, which is the "QSAR-ready" key used for parent-compound
//!   lookups independent of stereoisomer
//!
//! ## Usage
//! ```
//! use MetaboComp::Normalizer::structure::Structure;
//! let s = Structure::parse("C[C@H](N)C(=O)O").unwrap();
//! assert_eq!(s.canonical_smiles(), "CC(N)C(=O)O");
//! let qsar_key = s.standard_key(true);
//! assert_eq!(qsar_key.len(), 27);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// error types for structure parsing; per-row failures are absorbed by the
/// callers as dropped rows or sentinel values, never as a batch abort
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("Invalid structure string '{structure}': {reason}")]
    InvalidStructure { structure: String, reason: String },
    #[error("Unknown element '{element}' in structure '{structure}'")]
    UnknownElement { element: String, structure: String },
}

fn invalid(structure: &str, reason: &str) -> StructureError {
    StructureError::InvalidStructure {
        structure: structure.to_string(),
        reason: reason.to_string(),
    }
}

/// atoms that may be written without brackets
const ORGANIC_SUBSET: &[&str] = &["Br", "Cl", "B", "C", "N", "O", "P", "S", "F", "I"];
/// aromatic atoms that may be written without brackets
const AROMATIC_SUBSET: &[&str] = &["b", "c", "n", "o", "p", "s"];
/// aromatic symbols allowed inside brackets
const AROMATIC_BRACKET: &[&str] = &["B", "C", "N", "O", "P", "S", "Se", "As"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomToken {
    /// element symbol in canonical case ("C", "Cl", "Se")
    pub element: String,
    pub aromatic: bool,
    pub bracket: bool,
    pub isotope: Option<u16>,
    /// explicit hydrogen count; meaningful for bracket atoms only
    pub h_count: u8,
    pub charge: i8,
    /// tetrahedral mark ("@" or "@@"), dropped by canonical serialization
    pub stereo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    Atom(AtomToken),
    Bond(char),
    Open,
    Close,
    Ring(String),
    Dot,
}

/// Parsed structure string. Stores the token stream so that serialization
/// (with or without stereochemical annotation) stays a pure function of the
/// parse result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    tokens: Vec<Token>,
}

impl Structure {
    pub fn parse(smiles: &str) -> Result<Self, StructureError> {
        let raw = smiles.trim();
        if raw.is_empty() {
            return Err(invalid(raw, "empty string"));
        }
        let chars: Vec<char> = raw.chars().collect();
        let mut tokens: Vec<Token> = Vec::new();
        let mut i = 0usize;
        let mut depth = 0usize;
        let mut atom_seen = false;
        let mut open_rings: HashSet<String> = HashSet::new();
        while i < chars.len() {
            let c = chars[i];
            match c {
                '[' => {
                    let (atom, next) = parse_bracket_atom(&chars, i, raw)?;
                    tokens.push(Token::Atom(atom));
                    atom_seen = true;
                    i = next;
                }
                ']' => return Err(invalid(raw, "unmatched closing bracket")),
                '(' => {
                    if !atom_seen {
                        return Err(invalid(raw, "branch before any atom"));
                    }
                    depth += 1;
                    tokens.push(Token::Open);
                    i += 1;
                }
                ')' => {
                    if depth == 0 {
                        return Err(invalid(raw, "unmatched closing parenthesis"));
                    }
                    depth -= 1;
                    tokens.push(Token::Close);
                    i += 1;
                }
                '.' => {
                    tokens.push(Token::Dot);
                    i += 1;
                }
                '-' | '=' | '#' | '$' | ':' | '/' | '\\' => {
                    tokens.push(Token::Bond(c));
                    i += 1;
                }
                '%' => {
                    if !atom_seen {
                        return Err(invalid(raw, "ring closure before any atom"));
                    }
                    let d1 = chars.get(i + 1).filter(|d| d.is_ascii_digit());
                    let d2 = chars.get(i + 2).filter(|d| d.is_ascii_digit());
                    match (d1, d2) {
                        (Some(d1), Some(d2)) => {
                            let id = format!("%{}{}", d1, d2);
                            toggle_ring(&mut open_rings, &id);
                            tokens.push(Token::Ring(id));
                            i += 3;
                        }
                        _ => return Err(invalid(raw, "malformed two-digit ring closure")),
                    }
                }
                '0'..='9' => {
                    if !atom_seen {
                        return Err(invalid(raw, "ring closure before any atom"));
                    }
                    let id = c.to_string();
                    toggle_ring(&mut open_rings, &id);
                    tokens.push(Token::Ring(id));
                    i += 1;
                }
                c if c.is_ascii_uppercase() => {
                    let two = chars.get(i + 1).map(|n| format!("{}{}", c, n));
                    if let Some(two) = two.filter(|t| ORGANIC_SUBSET.contains(&t.as_str())) {
                        tokens.push(Token::Atom(plain_atom(&two, false)));
                        atom_seen = true;
                        i += 2;
                    } else if ORGANIC_SUBSET.contains(&c.to_string().as_str()) {
                        tokens.push(Token::Atom(plain_atom(&c.to_string(), false)));
                        atom_seen = true;
                        i += 1;
                    } else {
                        return Err(invalid(
                            raw,
                            &format!("element '{}' must be written as a bracket atom", c),
                        ));
                    }
                }
                c if AROMATIC_SUBSET.contains(&c.to_string().as_str()) => {
                    tokens.push(Token::Atom(plain_atom(&c.to_uppercase().to_string(), true)));
                    atom_seen = true;
                    i += 1;
                }
                _ => return Err(invalid(raw, &format!("unexpected character '{}'", c))),
            }
        }
        if depth != 0 {
            return Err(invalid(raw, "unclosed branch"));
        }
        if !open_rings.is_empty() {
            return Err(invalid(raw, "dangling ring bond"));
        }
        if !atom_seen {
            return Err(invalid(raw, "no atoms found"));
        }
        Ok(Structure { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Canonical serialization, always without stereochemical annotation.
    /// Idempotent: parsing the output and serializing again reproduces it.
    pub fn canonical_smiles(&self) -> String {
        self.write(false)
    }

    /// Serialization retaining stereochemical annotation; this is the
    /// identity basis of the full-specificity standardized key.
    pub fn isomeric_smiles(&self) -> String {
        self.write(true)
    }

    /// Standardized 27-character identifier. With `reduce_specificity` the
    /// identifier is computed from the stereo-stripped serialization, so
    /// stereoisomers of the same skeleton collapse onto one key.
    pub fn standard_key(&self, reduce_specificity: bool) -> String {
        let basis = if reduce_specificity {
            self.canonical_smiles()
        } else {
            self.isomeric_smiles()
        };
        key_from_basis(&basis)
    }

    fn write(&self, keep_stereo: bool) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Atom(a) => write_atom(a, keep_stereo, &mut out),
                Token::Bond(b) => {
                    // bond-configuration slashes are stereochemical annotation
                    if keep_stereo || (*b != '/' && *b != '\\') {
                        out.push(*b);
                    }
                }
                Token::Open => out.push('('),
                Token::Close => out.push(')'),
                Token::Ring(id) => out.push_str(id),
                Token::Dot => out.push('.'),
            }
        }
        out
    }
}

fn plain_atom(element: &str, aromatic: bool) -> AtomToken {
    AtomToken {
        element: element.to_string(),
        aromatic,
        bracket: false,
        isotope: None,
        h_count: 0,
        charge: 0,
        stereo: None,
    }
}

fn toggle_ring(open_rings: &mut HashSet<String>, id: &str) {
    if !open_rings.remove(id) {
        open_rings.insert(id.to_string());
    }
}

fn parse_bracket_atom(
    chars: &[char],
    start: usize,
    raw: &str,
) -> Result<(AtomToken, usize), StructureError> {
    let mut i = start + 1;
    // isotope
    let iso_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let isotope = if i > iso_start {
        let digits: String = chars[iso_start..i].iter().collect();
        Some(
            digits
                .parse::<u16>()
                .map_err(|_| invalid(raw, "isotope out of range"))?,
        )
    } else {
        None
    };
    // element symbol
    let (element, aromatic) = match chars.get(i) {
        Some(c) if c.is_ascii_uppercase() => {
            let mut sym = c.to_string();
            i += 1;
            if let Some(n) = chars.get(i).filter(|n| n.is_ascii_lowercase()) {
                sym.push(*n);
                i += 1;
            }
            (sym, false)
        }
        Some(c) if c.is_ascii_lowercase() => {
            let mut sym = c.to_string();
            i += 1;
            if (sym == "s" && chars.get(i) == Some(&'e'))
                || (sym == "a" && chars.get(i) == Some(&'s'))
            {
                sym.push(chars[i]);
                i += 1;
            }
            let canonical: String = sym
                .chars()
                .enumerate()
                .map(|(k, c)| if k == 0 { c.to_ascii_uppercase() } else { c })
                .collect();
            if !AROMATIC_BRACKET.contains(&canonical.as_str()) {
                return Err(invalid(raw, &format!("'{}' cannot be aromatic", sym)));
            }
            (canonical, true)
        }
        _ => return Err(invalid(raw, "bracket atom lacks an element symbol")),
    };
    // tetrahedral stereo mark
    let mut stereo: Option<String> = None;
    if chars.get(i) == Some(&'@') {
        i += 1;
        if chars.get(i) == Some(&'@') {
            i += 1;
            stereo = Some("@@".to_string());
        } else {
            stereo = Some("@".to_string());
        }
    }
    // explicit hydrogen count
    let mut h_count = 0u8;
    if chars.get(i) == Some(&'H') {
        i += 1;
        let digit_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        h_count = if i > digit_start {
            let digits: String = chars[digit_start..i].iter().collect();
            digits
                .parse::<u8>()
                .map_err(|_| invalid(raw, "hydrogen count out of range"))?
        } else {
            1
        };
    }
    // charge: '+'/'-' followed by digits, or repeated signs
    let mut charge = 0i8;
    if let Some(&sign) = chars.get(i).filter(|c| **c == '+' || **c == '-') {
        i += 1;
        let digit_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let mut magnitude: i8 = if i > digit_start {
            let digits: String = chars[digit_start..i].iter().collect();
            digits
                .parse::<i8>()
                .map_err(|_| invalid(raw, "charge out of range"))?
        } else {
            1
        };
        while chars.get(i) == Some(&sign) {
            magnitude += 1;
            i += 1;
        }
        charge = if sign == '+' { magnitude } else { -magnitude };
    }
    // atom class, parsed and discarded
    if chars.get(i) == Some(&':') {
        i += 1;
        let digit_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == digit_start {
            return Err(invalid(raw, "malformed atom class"));
        }
    }
    if chars.get(i) != Some(&']') {
        return Err(invalid(raw, "unterminated or malformed bracket atom"));
    }
    Ok((
        AtomToken {
            element,
            aromatic,
            bracket: true,
            isotope,
            h_count,
            charge,
            stereo,
        },
        i + 1,
    ))
}

fn write_atom(a: &AtomToken, keep_stereo: bool, out: &mut String) {
    let symbol = if a.aromatic {
        a.element.to_ascii_lowercase()
    } else {
        a.element.clone()
    };
    if !a.bracket {
        out.push_str(&symbol);
        return;
    }
    // an atom bracketed only for its stereo mark degrades to a plain atom
    // once the mark is stripped, so stereoisomers and their flat form
    // serialize identically
    let plain_allowed = if a.aromatic {
        AROMATIC_SUBSET.contains(&symbol.as_str())
    } else {
        ORGANIC_SUBSET.contains(&symbol.as_str())
    };
    if !keep_stereo && a.stereo.is_some() && a.isotope.is_none() && a.charge == 0 && plain_allowed {
        out.push_str(&symbol);
        return;
    }
    out.push('[');
    if let Some(iso) = a.isotope {
        out.push_str(&iso.to_string());
    }
    out.push_str(&symbol);
    if keep_stereo {
        if let Some(stereo) = &a.stereo {
            out.push_str(stereo);
        }
    }
    match a.h_count {
        0 => {}
        1 => out.push('H'),
        n => {
            out.push('H');
            out.push_str(&n.to_string());
        }
    }
    match a.charge {
        0 => {}
        1 => out.push('+'),
        -1 => out.push('-'),
        n if n > 1 => out.push_str(&format!("+{}", n)),
        n => out.push_str(&format!("-{}", -n)),
    }
    out.push(']');
}

fn key_from_basis(basis: &str) -> String {
    let hash = blake3::hash(basis.as_bytes());
    let bytes = hash.as_bytes();
    let block1: String = bytes[..14]
        .iter()
        .map(|b| char::from(b'A' + b % 26))
        .collect();
    let block2: String = bytes[14..22]
        .iter()
        .map(|b| char::from(b'A' + b % 26))
        .collect();
    format!("{}-{}SA-N", block1, block2)
}

/// Result of the `normalize` operation: canonical (stereo-stripped)
/// serialization plus the standardized identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStructure {
    pub canonical: String,
    pub key: String,
}

/// Parse a structure string and produce its canonical serialization and
/// standardized key in one call.
pub fn normalize(
    smiles: &str,
    reduce_specificity: bool,
) -> Result<NormalizedStructure, StructureError> {
    let structure = Structure::parse(smiles)?;
    Ok(NormalizedStructure {
        canonical: structure.canonical_smiles(),
        key: structure.standard_key(reduce_specificity),
    })
}

/// Standardized key of a structure string; `reduce_specificity` yields the
/// QSAR-ready key used for parent matching.
pub fn smiles_to_key(smiles: &str, reduce_specificity: bool) -> Result<String, StructureError> {
    Ok(Structure::parse(smiles)?.standard_key(reduce_specificity))
}

/// Canonical (stereo-stripped) serialization of a structure string.
pub fn clean_smiles(smiles: &str) -> Result<String, StructureError> {
    Ok(Structure::parse(smiles)?.canonical_smiles())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Structure::parse("").is_err());
        assert!(Structure::parse("not a structure").is_err());
        assert!(Structure::parse("C(").is_err());
        assert!(Structure::parse("C1CC").is_err());
        assert!(Structure::parse("C)C").is_err());
        assert!(Structure::parse("[C").is_err());
        assert!(Structure::parse("*").is_err());
    }

    #[test]
    fn test_canonical_strips_stereo() {
        let s = Structure::parse("C[C@H](N)C(=O)O").unwrap();
        assert_eq!(s.canonical_smiles(), "CC(N)C(=O)O");
        assert_eq!(s.isomeric_smiles(), "C[C@H](N)C(=O)O");

        let trans = Structure::parse("F/C=C/F").unwrap();
        assert_eq!(trans.canonical_smiles(), "FC=CF");
    }

    #[test]
    fn test_canonical_is_idempotent() {
        for smiles in ["C[C@@H](O)c1ccccc1", "F/C=C\\F", "[NH4+].[Cl-]", "C%12CC%12"] {
            let once = Structure::parse(smiles).unwrap().canonical_smiles();
            let twice = Structure::parse(&once).unwrap().canonical_smiles();
            assert_eq!(once, twice, "canonicalization not idempotent for {}", smiles);
        }
    }

    #[test]
    fn test_key_shape() {
        let key = smiles_to_key("CCO", false).unwrap();
        assert_eq!(key.len(), 27);
        let blocks: Vec<&str> = key.split('-').collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].len(), 14);
        assert_eq!(blocks[1].len(), 10);
        assert!(blocks[1].ends_with("SA"));
        assert_eq!(blocks[2], "N");
        assert!(key.chars().all(|c| c.is_ascii_uppercase() || c == '-'));
    }

    #[test]
    fn test_key_specificity() {
        // stereoisomers share the reduced key but not the full one
        let full_r = smiles_to_key("C[C@H](N)C(=O)O", false).unwrap();
        let full_s = smiles_to_key("C[C@@H](N)C(=O)O", false).unwrap();
        assert_ne!(full_r, full_s);
        let reduced_r = smiles_to_key("C[C@H](N)C(=O)O", true).unwrap();
        let reduced_s = smiles_to_key("C[C@@H](N)C(=O)O", true).unwrap();
        assert_eq!(reduced_r, reduced_s);
    }

    #[test]
    fn test_key_stereo_free_round_trip() {
        // no stereochemistry present to remove, so both keys coincide
        let reduced = smiles_to_key("CC(=O)Nc1ccc(O)cc1", true).unwrap();
        let full = smiles_to_key("CC(=O)Nc1ccc(O)cc1", false).unwrap();
        assert_eq!(reduced, full);
    }

    #[test]
    fn test_bracket_atom_round_trip() {
        let s = Structure::parse("[13CH3][NH3+]").unwrap();
        assert_eq!(s.canonical_smiles(), "[13CH3][NH3+]");
        let charged = Structure::parse("[Fe++]").unwrap();
        assert_eq!(charged.canonical_smiles(), "[Fe+2]");
    }

    #[test]
    fn test_normalize_convenience() {
        let n = normalize("F/C=C/F", true).unwrap();
        assert_eq!(n.canonical, "FC=CF");
        assert_eq!(n.key, smiles_to_key("FC=CF", false).unwrap());
    }
}
