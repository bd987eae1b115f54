//! Command Runner Implementation using `tokio::process`

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    process::{CommandOutput, CommandRunner, CommandSpec},
};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Spawns real child processes and awaits them without blocking the executor.
///
/// stdin is closed, stdout and stderr are captured. The child is killed if
/// the awaiting future is dropped.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, command: CommandSpec) -> Result<CommandOutput> {
        debug!(program = %command.program.display(), "Spawning external command");

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                warn!(error = %e, program = %command.program.display(), "Failed to start command");
                if e.kind() == std::io::ErrorKind::NotFound {
                    BridgeError::NotAvailable(format!(
                        "{} not found: {}",
                        command.program.display(),
                        e
                    ))
                } else {
                    BridgeError::Io(e)
                }
            })?;

        let output = CommandOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        };

        debug!(
            program = %command.program.display(),
            status = %output.status_description(),
            "External command finished"
        );

        Ok(output)
    }
}
