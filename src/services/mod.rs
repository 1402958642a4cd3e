pub mod inference;
pub mod labels;
pub mod normalizer;
pub mod processor;
pub mod store;
