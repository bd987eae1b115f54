//! Per-track outcomes and the aggregated batch result.

use serde::Serialize;

/// How a successful track ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterializeOutcome {
    /// The output file already existed; nothing was run.
    Skipped,
    /// Tags were embedded, with or without a cover image.
    Tagged { cover: bool },
    /// The extracted file was kept without tags.
    Untagged { note: String },
}

impl MaterializeOutcome {
    /// Note shown next to a success, if any.
    pub fn note(&self) -> Option<String> {
        match self {
            MaterializeOutcome::Skipped => Some("already downloaded".to_string()),
            MaterializeOutcome::Tagged { cover: false } => Some("no cover art".to_string()),
            MaterializeOutcome::Tagged { cover: true } => None,
            MaterializeOutcome::Untagged { note } => Some(note.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrackOutcome {
    Success(MaterializeOutcome),
    Failure { reason: String },
}

impl TrackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TrackOutcome::Success(_))
    }
}

/// One entry of a [`BatchResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackResult {
    pub track_name: String,
    pub outcome: TrackOutcome,
}

impl TrackResult {
    pub fn success(track_name: impl Into<String>, outcome: MaterializeOutcome) -> Self {
        Self {
            track_name: track_name.into(),
            outcome: TrackOutcome::Success(outcome),
        }
    }

    pub fn failure(track_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            outcome: TrackOutcome::Failure {
                reason: reason.into(),
            },
        }
    }
}

/// Outcome of every track of a batch, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    entries: Vec<TrackResult>,
}

impl BatchResult {
    pub(crate) fn push(&mut self, entry: TrackResult) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TrackResult] {
        &self.entries
    }

    /// Outcome recorded for the track named `track_name`.
    pub fn get(&self, track_name: &str) -> Option<&TrackOutcome> {
        self.entries
            .iter()
            .find(|entry| entry.track_name == track_name)
            .map(|entry| &entry.outcome)
    }

    pub fn succeeded(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// `(track_name, reason)` for every failed track.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            TrackOutcome::Failure { reason } => Some((entry.track_name.as_str(), reason.as_str())),
            TrackOutcome::Success(_) => None,
        })
    }

    /// Number of successes matching `predicate`.
    pub fn count_successes<F>(&self, predicate: F) -> usize
    where
        F: Fn(&MaterializeOutcome) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| matches!(&entry.outcome, TrackOutcome::Success(o) if predicate(o)))
            .count()
    }
}

impl FromIterator<TrackResult> for BatchResult {
    fn from_iter<I: IntoIterator<Item = TrackResult>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
