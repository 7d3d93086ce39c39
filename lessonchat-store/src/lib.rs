//! LessonChat Store - Transcript persistence.
//!
//! A transcript is the ordered sequence of turns for one (session, lesson)
//! pair, stored as a single serialized row and rewritten whole on every
//! append. Appends for the same pair are serialized through a per-key lock so
//! concurrent turns cannot clobber each other.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

mod lock;
mod sqlite;
mod transcript;

pub use sqlite::TranscriptStore;
pub use transcript::{SessionKey, Turn};
