//! # Plan Reminder Bot
//!
//! A Telegram bot that keeps personal plans and reminds their owners when
//! they are due.
//!
//! ## Features
//! - Add plans through a short dialog: `/addplan`, then the text, then `dd.mm.yyyy HH:MM`
//! - List plans with `/myplans`
//! - Delete plans with `/deleteplan` and an inline confirmation
//! - A once-a-minute reminder with a decorative picture when a plan is due
//! - Persistent storage with SQLite

/// Bot commands, dialog state machine and Telegram wiring
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and the plan repository
pub mod database;
/// Error types shared across the crate
pub mod error;
/// Background services: reminders, images and health checks
pub mod services;
/// Utility functions for datetime, validation, and logging
pub mod utils;
