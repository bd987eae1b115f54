//! Terminal rendering of batch events.

use colored::{ColoredString, Colorize};
use core_download::BatchResult;
use core_runtime::events::{
    BatchEvent, CoreEvent, EventSeverity, EventStream, TrackEvent, TrackStage,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

const BAR_TEMPLATE: &str = "{msg} ║{bar:40.green}║ {pos}/{len} ({percent}%) [{elapsed_precise}]";

/// Draw an overall bar and one line per finished track until the batch
/// completes. The bar message follows the most recent stage change.
pub fn spawn_renderer(receiver: broadcast::Receiver<CoreEvent>, total: usize) -> JoinHandle<()> {
    let mut events = EventStream::new(receiver)
        .filter(|event| {
            !matches!(
                event,
                CoreEvent::Track(TrackEvent::Stage {
                    stage: TrackStage::Waiting,
                    ..
                })
            )
        });

    tokio::spawn(async move {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("██░");
        bar.set_style(style);
        bar.set_message("Overall progress");

        loop {
            match events.recv().await {
                Ok(CoreEvent::Batch(BatchEvent::Progress { completed, .. })) => {
                    bar.set_position(completed as u64);
                }
                Ok(CoreEvent::Batch(BatchEvent::Completed { .. })) => break,
                Ok(CoreEvent::Track(TrackEvent::Stage { track, stage })) => {
                    bar.set_message(format!("{}: {}", stage, track));
                }
                Ok(event @ CoreEvent::Track(_)) => {
                    if let Some(line) = event_line(&event) {
                        bar.println(line);
                    }
                }
                Ok(_) => {}
                // Positions are absolute, so skipped events only cost lines
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }

        bar.finish_and_clear();
    })
}

/// One status line for a finished track; stage changes and batch events
/// print nothing. The marker colour follows the event's severity.
pub fn event_line(event: &CoreEvent) -> Option<String> {
    let CoreEvent::Track(track_event) = event else {
        return None;
    };

    let text = match track_event {
        TrackEvent::Succeeded { track, note: None } => format!("Completed: {}", track),
        TrackEvent::Succeeded {
            track,
            note: Some(note),
        } => format!("Completed: {} {}", track, format!("({})", note).dimmed()),
        TrackEvent::Skipped { track } => format!("Already downloaded: {}", track),
        TrackEvent::Failed { track, .. } => format!("Failed: {}", track),
        TrackEvent::Stage { .. } => return None,
    };

    Some(format!("{} {}", marker(event.severity()), text))
}

fn marker(severity: EventSeverity) -> ColoredString {
    match severity {
        EventSeverity::Error => "✘".red(),
        EventSeverity::Warning => "✔".yellow(),
        EventSeverity::Info | EventSeverity::Debug => "✔".green(),
    }
}

/// End-of-batch lines: the failure list, if any.
pub fn summary_lines(result: &BatchResult) -> Vec<String> {
    let mut lines = Vec::new();

    if result.failed() > 0 {
        lines.push(format!("{}", "Some downloads failed:".red()));
        for (track, reason) in result.failures() {
            lines.push(format!(
                "{}",
                format!("  • failed to download '{}': {}", track, reason).red()
            ));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_download::{MaterializeOutcome, TrackResult};

    #[test]
    fn test_event_lines() {
        colored::control::set_override(false);

        let done = CoreEvent::Track(TrackEvent::Succeeded {
            track: "A - B".to_string(),
            note: None,
        });
        assert_eq!(event_line(&done).unwrap(), "✔ Completed: A - B");

        let untagged = CoreEvent::Track(TrackEvent::Succeeded {
            track: "A - B".to_string(),
            note: Some("no metadata".to_string()),
        });
        assert_eq!(
            event_line(&untagged).unwrap(),
            "✔ Completed: A - B (no metadata)"
        );

        let skipped = CoreEvent::Track(TrackEvent::Skipped {
            track: "A - B".to_string(),
        });
        assert_eq!(event_line(&skipped).unwrap(), "✔ Already downloaded: A - B");

        let failed = CoreEvent::Track(TrackEvent::Failed {
            track: "C - D".to_string(),
            reason: "boom".to_string(),
        });
        assert_eq!(event_line(&failed).unwrap(), "✘ Failed: C - D");

        let stage = CoreEvent::Track(TrackEvent::Stage {
            track: "C - D".to_string(),
            stage: TrackStage::Tagging,
        });
        assert!(event_line(&stage).is_none());
        assert!(event_line(&CoreEvent::Batch(BatchEvent::progress(1, 2))).is_none());
    }

    #[test]
    fn test_marker_colour_follows_severity() {
        use colored::Color;

        assert_eq!(marker(EventSeverity::Error).fgcolor, Some(Color::Red));
        assert_eq!(marker(EventSeverity::Warning).fgcolor, Some(Color::Yellow));
        assert_eq!(marker(EventSeverity::Info).fgcolor, Some(Color::Green));
        assert_eq!(&*marker(EventSeverity::Error), "✘");
    }

    #[test]
    fn test_summary_of_clean_batch_is_empty() {
        assert!(summary_lines(&BatchResult::default()).is_empty());
    }

    #[test]
    fn test_summary_lists_every_failure() {
        colored::control::set_override(false);

        let result: BatchResult = vec![
            TrackResult::success("A - B", MaterializeOutcome::Tagged { cover: true }),
            TrackResult::failure("C - D", "Extraction failed: Video unavailable"),
            TrackResult::failure("E - F", "Tagging failed: exit status 1"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            summary_lines(&result),
            vec![
                "Some downloads failed:".to_string(),
                "  • failed to download 'C - D': Extraction failed: Video unavailable".to_string(),
                "  • failed to download 'E - F': Tagging failed: exit status 1".to_string(),
            ]
        );
    }
}
