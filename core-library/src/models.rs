//! Domain models for the download library

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

/// File extension of every produced audio file
pub const AUDIO_EXTENSION: &str = "mp3";

/// A single track to fetch.
///
/// `name` is the bookmark title verbatim. It is the display key of the track
/// in progress output and batch results, and also the stem of the output file
/// name (no sanitization is applied).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    /// Source page the extraction tool downloads from
    pub url: String,
    /// Unique display name, also the output file stem
    pub name: String,
    /// Title used for the catalog lookup
    pub title: String,
    /// Artist used for the catalog lookup
    pub artist: String,
}

impl Track {
    pub fn new(
        url: impl Into<String>,
        name: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            title: title.into(),
            artist: artist.into(),
        }
    }

    /// Validate track data
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("Track URL cannot be empty".to_string());
        }

        if self.name.trim().is_empty() {
            return Err("Track name cannot be empty".to_string());
        }

        Ok(())
    }

    /// Final location of this track's audio file inside `dir`.
    ///
    /// The name is appended to `dir` as written, so a `/` in it nests the
    /// file in a subdirectory and a leading `/` stays under `dir`.
    pub fn output_path(&self, dir: &Path) -> PathBuf {
        self.path_in(dir, AUDIO_EXTENSION)
    }

    /// `dir` + separator + `name.extension`.
    pub fn path_in(&self, dir: &Path, extension: &str) -> PathBuf {
        let mut path = OsString::from(dir.as_os_str());
        path.push(MAIN_SEPARATOR_STR);
        path.push(&self.name);
        path.push(".");
        path.push(extension);
        PathBuf::from(path)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
