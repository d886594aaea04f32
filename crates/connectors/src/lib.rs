pub mod csv_sink;
pub mod error;
pub mod executor;
pub mod postgres;
pub mod query;
pub mod sink;
