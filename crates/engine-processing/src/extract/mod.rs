pub mod classify;
pub mod engine;
