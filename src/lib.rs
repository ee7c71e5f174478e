pub mod constants;
pub mod engine;
pub mod grid;
pub mod types;
