pub mod core;
pub mod extraction;
pub mod records;
