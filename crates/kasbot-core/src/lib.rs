//! # kasbot-core
//!
//! Core types, traits, configuration, and error handling for kasbot.

pub mod amount;
pub mod config;
pub mod error;
pub mod message;
pub mod traits;
