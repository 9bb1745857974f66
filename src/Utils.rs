/// Loading of delimited tool exports into in-memory tables with required
/// column validation
pub mod load_from_file;
