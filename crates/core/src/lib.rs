//! Domain logic for the daily game-challenge curation pipeline.
//!
//! Everything in this crate is I/O-free (the one exception is
//! [`ffmpeg`], which shells out to ffprobe/ffmpeg): revelation
//! scoring, difficulty curation, zoom-crop geometry, candidate
//! priority scoring, and trim-window selection are all pure functions
//! over in-memory data so they can be unit-tested without a network
//! or a database.

pub mod analysis;
pub mod candidate;
pub mod curation;
pub mod ffmpeg;
pub mod trim;
pub mod types;
pub mod zoom;
