//! Library interface for dynamic-gatt.
//!
//! Everything here is pure application logic over the [`stack::BtStack`]
//! command trait, so it can be tested on the host (no embedded hardware
//! required).
//!
//! Usage: `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and provides the SoftDevice implementation of the stack trait.

#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible to every module.
mod fmt;

pub mod adv_data;
pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod gatt;
pub mod stack;

pub use app::{App, AppState};
pub use error::{Command, Error, Status};
pub use event::{BootInfo, Event};
pub use gatt::GattDatabase;
pub use stack::BtStack;
