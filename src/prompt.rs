//! Interactive configuration.
//!
//! Every prompt shows the current value in brackets; an empty answer keeps
//! it. Numeric answers that do not parse also keep the current value.

use anyhow::{Context, Result};
use colored::Colorize;
use core_runtime::config::{AppConfig, AppConfigBuilder};
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Ask for each setting on `output`, reading answers from `input`.
pub fn configure<R, W>(current: &AppConfig, input: &mut R, output: &mut W) -> Result<AppConfig>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{}", "Configure tunefetch".cyan().bold())?;
    writeln!(output, "Press Enter to keep the value in brackets.")?;

    let mut prompter = Prompter { input, output };
    let client_id = prompter.text("Spotify Client ID", &current.spotify_client_id)?;
    let client_secret = prompter.text("Spotify Client Secret", &current.spotify_client_secret)?;
    let bookmark_path = prompter.path("Chrome Bookmark Path", &current.bookmark_path)?;
    let bookmark_position =
        prompter.number("Bookmark Folder Position", current.bookmark_position)?;
    let music_directory = prompter.path("Download Directory", &current.music_directory)?;
    let separator = prompter.text("Music Separator", &current.music_separator)?;
    let title_position = prompter.number("Title Position", current.title_position)?;
    let artist_position = prompter.number("Artist Position", current.artist_position)?;
    let max_concurrent = prompter.number("Concurrent Downloads", current.max_concurrent)?;

    AppConfigBuilder::from_config(current.clone())
        .catalog_credentials(client_id, client_secret)
        .bookmark_path(bookmark_path)
        .bookmark_position(bookmark_position)
        .music_directory(music_directory)
        .name_layout(separator, title_position, artist_position)
        .max_concurrent(max_concurrent)
        .build()
        .context("The entered settings are not valid")
}

struct Prompter<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Prompter<'_, R, W> {
    /// `None` on an empty answer or end of input.
    fn ask(&mut self, label: &str, current: impl Display) -> Result<Option<String>> {
        write!(self.output, "{} [{}]: ", label, current)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .with_context(|| format!("Failed to read {}", label))?;

        let answer = line.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }

    fn text(&mut self, label: &str, current: &str) -> Result<String> {
        Ok(self
            .ask(label, current)?
            .unwrap_or_else(|| current.to_string()))
    }

    fn path(&mut self, label: &str, current: &std::path::Path) -> Result<PathBuf> {
        Ok(self
            .ask(label, current.display())?
            .map(PathBuf::from)
            .unwrap_or_else(|| current.to_path_buf()))
    }

    fn number<T>(&mut self, label: &str, current: T) -> Result<T>
    where
        T: FromStr + Display + Copy,
    {
        let Some(answer) = self.ask(label, current)? else {
            return Ok(current);
        };

        match answer.parse() {
            Ok(value) => Ok(value),
            Err(_) => {
                writeln!(
                    self.output,
                    "{}",
                    format!("'{}' is not a number, keeping {}", answer, current).yellow()
                )?;
                Ok(current)
            }
        }
    }
}
