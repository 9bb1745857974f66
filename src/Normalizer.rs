/// Module to parse structure strings (SMILES), strip stereochemical
/// annotation, and produce canonical serializations and standardized
/// 27-character identifiers. The reduced-specificity ("QSAR-ready") key is
/// used to match parent compounds independent of stereoisomer.
///
/// # Examples
/// ```
/// use MetaboComp::Normalizer::structure::normalize;
/// let n = normalize("C[C@H](N)C(=O)O", true).unwrap();
/// println!("canonical: {}, key: {}", n.canonical, n.key);
/// ```
pub mod structure;
/// Module to calculate the molecular formula and the monoisotopic [M+H]
/// mass of a structure; unparseable structures are recorded with the
/// "Incompatible structure" sentinel instead of failing the batch.
///
/// # Examples
/// ```
/// use MetaboComp::Normalizer::molprops::molecular_properties;
/// let props = molecular_properties("CCO").unwrap();
/// println!("{} [M+H] {}", props.formula, props.mass_mh);
/// ```
pub mod molprops;
