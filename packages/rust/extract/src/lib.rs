//! Record extraction from Gradescope HTML trees.
//!
//! This crate provides:
//! - [`extract_courses`] — course records from the account page
//! - [`extract_assignments`] — assignment records from a course page
//!
//! Both are pure functions over an already-parsed [`scraper::Html`] tree;
//! fetching and parsing belong to the session collaborator. Extraction
//! degrades gracefully field-by-field and row-by-row — a malformed row is
//! dropped, never aborts the batch.

pub mod assignments;
pub mod courses;

pub use assignments::extract_assignments;
pub use courses::extract_courses;
