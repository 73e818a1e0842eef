// src/lib.rs

//! Town event poster library.
//!
//! Scrapes a municipal event calendar and a few event-listing pages, reads a
//! weather forecast, and posts short texts about today to X.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
