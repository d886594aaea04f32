pub mod error;
pub mod extract;
pub mod transform;
pub mod validation;
