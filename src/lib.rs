#[allow(non_snake_case)]
pub mod Adapters;
#[allow(non_snake_case)]
pub mod Aggregation;
#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Metrics;
#[allow(non_snake_case)]
pub mod Normalizer;
#[allow(non_snake_case)]
pub mod Utils;
