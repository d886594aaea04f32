pub mod batch;
pub mod dataset;
pub mod row;
