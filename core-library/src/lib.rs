//! # Library Module
//!
//! Produces the list of tracks a download batch works on.
//!
//! ## Overview
//!
//! - [`Track`]: one bookmarked link plus the title/artist derived from its name
//! - [`BookmarkReader`]: reads a Chrome `Bookmarks` file and turns one folder
//!   of the bookmark bar into tracks, using a [`TrackNameLayout`] to split
//!   names such as `Artist - Title`

pub mod bookmarks;
pub mod error;
pub mod models;

pub use bookmarks::{BookmarkReader, TrackNameLayout, UNKNOWN_ARTIST};
pub use error::{LibraryError, Result};
pub use models::Track;
