//! External collaborators: the authenticated Gradescope session and the
//! Google Calendar REST client.
//!
//! The core depends only on these narrow surfaces — `fetch(path) -> text`
//! and uid/title-driven calendar upserts — never on raw transport details.

pub mod gcal;
pub mod session;

pub use gcal::{EventsPage, GoogleCalendar, RemoteEvent, StoredToken, UpsertAction};
pub use session::Session;
