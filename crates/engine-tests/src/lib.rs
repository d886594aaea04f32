#![allow(dead_code)]

pub mod extraction;
pub mod utils;
