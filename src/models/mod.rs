// src/models/mod.rs

pub mod category;
pub mod quiz;
pub mod quiz_result;
