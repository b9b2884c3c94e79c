//! Calendar-event projection and ICS serialization.
//!
//! This crate provides:
//! - [`project`] — join a course, an assignment, and a normalized due date
//!   into a [`gradesync_shared::CalendarEvent`] with a stable uid
//! - [`generate_ics`] — serialize events into RFC 5545 calendar text

pub mod ics;
pub mod projector;

pub use ics::generate_ics;
pub use projector::project;
