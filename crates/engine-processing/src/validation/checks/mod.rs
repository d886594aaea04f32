pub mod date_range;
pub mod duplicates;
pub mod null_rate;
pub mod referential;
pub mod row_count;
pub mod type_conformance;
pub mod value_range;
