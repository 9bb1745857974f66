/// end-to-end pipeline demonstrations on small in-memory exports:
/// normalize, aggregate, score
pub mod pipeline_examples;
