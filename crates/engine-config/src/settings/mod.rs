pub mod quality;
pub mod source;
pub mod validated;
