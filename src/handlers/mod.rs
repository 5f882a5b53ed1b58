// src/handlers/mod.rs

pub mod category;
pub mod quiz;
