//! Chrome bookmark file reader.
//!
//! The browser stores bookmarks as JSON:
//!
//! ```text
//! { "roots": { "bookmark_bar": { "children": [
//!     { "type": "folder", "name": "Music", "children": [
//!         { "type": "url", "name": "Artist - Title", "url": "https://..." }
//!     ] }
//! ] } } }
//! ```
//!
//! One folder of the bookmark bar, chosen by position, holds the music links.

use crate::error::{LibraryError, Result};
use crate::models::Track;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Artist recorded when a bookmark name has no artist part
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// How a bookmark name splits into title and artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackNameLayout {
    pub separator: String,
    pub title_position: usize,
    pub artist_position: usize,
}

impl Default for TrackNameLayout {
    fn default() -> Self {
        Self {
            separator: " - ".to_string(),
            title_position: 1,
            artist_position: 0,
        }
    }
}

impl TrackNameLayout {
    pub fn new(separator: impl Into<String>, title_position: usize, artist_position: usize) -> Self {
        Self {
            separator: separator.into(),
            title_position,
            artist_position,
        }
    }

    /// Split `name` into `(title, artist)`.
    ///
    /// A missing or blank title falls back to the whole name; a missing or
    /// blank artist becomes [`UNKNOWN_ARTIST`].
    pub fn split(&self, name: &str) -> (String, String) {
        let parts: Vec<&str> = if self.separator.is_empty() {
            vec![name]
        } else {
            name.split(self.separator.as_str()).collect()
        };

        let pick = |position: usize| {
            parts
                .get(position)
                .map(|part| part.trim())
                .filter(|part| !part.is_empty())
        };

        let title = pick(self.title_position).unwrap_or(name.trim()).to_string();
        let artist = pick(self.artist_position)
            .unwrap_or(UNKNOWN_ARTIST)
            .to_string();

        (title, artist)
    }
}

#[derive(Debug, Deserialize)]
struct BookmarkFile {
    roots: Roots,
}

#[derive(Debug, Deserialize)]
struct Roots {
    bookmark_bar: BookmarkNode,
}

#[derive(Debug, Deserialize)]
struct BookmarkNode {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    children: Vec<BookmarkNode>,
}

/// Reads tracks from one bookmark-bar folder.
#[derive(Debug, Clone)]
pub struct BookmarkReader {
    folder_position: usize,
    layout: TrackNameLayout,
}

impl BookmarkReader {
    pub fn new(folder_position: usize, layout: TrackNameLayout) -> Self {
        Self {
            folder_position,
            layout,
        }
    }

    /// Read and parse the bookmarks file at `path`.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Vec<Track>> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| LibraryError::Io {
            path: path.display().to_string(),
            source,
        })?;

        self.parse(&data)
    }

    /// Parse bookmark JSON into tracks, in bookmark order.
    ///
    /// Only `url` entries directly inside the selected folder are taken;
    /// nested folders and separators are ignored.
    pub fn parse(&self, json: &[u8]) -> Result<Vec<Track>> {
        let file: BookmarkFile = serde_json::from_slice(json)?;
        let folders = &file.roots.bookmark_bar.children;

        let folder = folders
            .get(self.folder_position)
            .ok_or(LibraryError::FolderOutOfRange {
                position: self.folder_position,
                available: folders.len(),
            })?;

        debug!(folder = %folder.name, entries = folder.children.len(), "Reading bookmark folder");

        let mut tracks = Vec::with_capacity(folder.children.len());
        for node in &folder.children {
            if node.kind != "url" {
                continue;
            }

            let Some(url) = node.url.as_deref().filter(|url| !url.trim().is_empty()) else {
                warn!(name = %node.name, "Skipping bookmark without URL");
                continue;
            };

            let (title, artist) = self.layout.split(&node.name);
            tracks.push(Track::new(url, node.name.as_str(), title, artist));
        }

        Ok(tracks)
    }
}
