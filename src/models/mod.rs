pub mod job;
pub mod prediction;
