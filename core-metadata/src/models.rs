//! Resolved metadata for a single track.

use serde::{Deserialize, Serialize};

/// Canonical tag values for one track.
///
/// Produced per track by a resolver, consumed by the tagging step and then
/// dropped. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Release year; `None` when the catalog date is missing or malformed
    pub year: Option<u16>,
    /// Location of the first listed cover image
    pub cover_url: Option<String>,
}

impl TrackMetadata {
    /// Tag key/value pairs in embedding order. The `date` tag is left out
    /// when the year is unknown.
    pub fn tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("title", self.title.clone()),
            ("artist", self.artist.clone()),
            ("album", self.album.clone()),
        ];
        if let Some(year) = self.year {
            tags.push(("date", year.to_string()));
        }
        tags
    }
}

/// Year from a catalog release date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
///
/// Returns `None` unless the date starts with four ASCII digits.
pub fn parse_year(release_date: &str) -> Option<u16> {
    let prefix = release_date.get(..4)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}
