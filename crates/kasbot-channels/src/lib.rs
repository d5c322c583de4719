//! # kasbot-channels
//!
//! Messaging platform adapters for kasbot.

pub mod bridge;
pub mod qr;
