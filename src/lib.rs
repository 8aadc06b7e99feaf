//! # Konkur Countdown Bot
//!
//! A Telegram bot that counts down to the Iranian university entrance exams.
//!
//! ## Features
//! - Time left until each exam, with dates shown in the Persian calendar
//! - A preferred exam per user for one-tap countdowns
//! - Daily or weekday reminders at a chosen time of day
//! - A simple study time log
//! - Persistent storage with SQLite

/// Bot command handlers and message processing
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// The exam catalog
pub mod exams;
/// Countdown, reminder scheduling and health services
pub mod services;
/// Utility functions for calendars, validation, and formatting
pub mod utils;
