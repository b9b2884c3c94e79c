//! Shared types, error model, and configuration for gradesync.
//!
//! This crate is the foundation depended on by all other gradesync crates.
//! It provides:
//! - [`GradesyncError`] — the unified error type
//! - Domain types ([`CourseRecord`], [`AssignmentRecord`], [`DueDate`], [`CalendarEvent`])
//! - Configuration ([`AppConfig`], [`Credentials`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CalendarConfig, Credentials, ENV_CALENDAR_NAME, ENV_EMAIL, ENV_GOOGLE_TOKEN,
    ENV_PASSWORD, GradescopeConfig, OutputConfig, config_dir, config_file_path,
    decode_google_token, load_config, load_config_from, materialize_google_token,
    resolve_calendar_name,
};
pub use error::{GradesyncError, Result};
pub use types::{AssignmentRecord, CalendarEvent, CourseRecord, DueDate};
