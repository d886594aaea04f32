pub mod mode;
pub mod window;
