//! HTTP request handlers
//!
//! Author: hephaex@gmail.com

pub mod health;
pub mod sessions;

pub use health::{health_check, metrics, readiness_check};
