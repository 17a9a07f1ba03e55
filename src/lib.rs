// src/lib.rs

//! tourwatch Library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod utils;
