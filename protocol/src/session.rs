//! The client side of one server conversation.
//!
//! States: `AwaitingCommand → Replying → AwaitingCommand`, with `POW` moving
//! through `Solving` before the reply. `END` completes the session; `ERROR`,
//! protocol violations, read failures and command timeouts end it with an
//! error. A round that hits its search deadline sends nothing and the
//! session keeps waiting for the next command.

use std::time::Duration;

use saltpow_crypto::field_reply;
use saltpow_types::{Challenge, Profile};
use saltpow_work::{verify_suffix, Solver, WorkError};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::{LineReader, LineWriter};
use crate::command::{Command, Field};
use crate::ProtocolError;

/// Default time to wait for the next command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// How long to wait for each inbound command. Does not bound solving.
    pub command_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The server sent `END`.
    Completed { rounds: u64 },
}

enum Flow {
    Continue,
    Finished,
}

pub struct Session<R, W, S> {
    reader: LineReader<R>,
    writer: LineWriter<W>,
    profile: Profile,
    solver: S,
    config: SessionConfig,
    authdata: Option<String>,
    rounds: u64,
}

impl<R, W, S> Session<R, W, S>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    S: Solver,
{
    pub fn new(reader: R, writer: W, profile: Profile, solver: S, config: SessionConfig) -> Self {
        Self {
            reader: LineReader::new(reader),
            writer: LineWriter::new(writer),
            profile,
            solver,
            config,
            authdata: None,
            rounds: 0,
        }
    }

    /// Authentication data from the most recent `POW`, if any.
    pub fn authdata(&self) -> Option<&str> {
        self.authdata.as_deref()
    }

    /// `POW` rounds started so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Process commands until `END`, an error, or `shutdown`.
    pub async fn run(
        &mut self,
        shutdown: &CancellationToken,
    ) -> Result<SessionOutcome, ProtocolError> {
        loop {
            let line = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Err(WorkError::Cancelled.into()),
                line = tokio::time::timeout(self.config.command_timeout, self.reader.read_line()) => line,
            };
            let line = match line {
                Ok(Ok(Some(line))) => line,
                Ok(Ok(None)) => return Err(ProtocolError::Disconnected),
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(ProtocolError::Timeout(self.config.command_timeout)),
            };

            if line.trim().is_empty() {
                debug!("ignoring blank line");
                continue;
            }

            let command = Command::parse(&line)?;
            if let Flow::Finished = self.handle(command, shutdown).await? {
                info!(rounds = self.rounds, "session completed");
                return Ok(SessionOutcome::Completed {
                    rounds: self.rounds,
                });
            }
        }
    }

    async fn handle(
        &mut self,
        command: Command,
        shutdown: &CancellationToken,
    ) -> Result<Flow, ProtocolError> {
        match command {
            Command::Helo => {
                debug!("received HELO");
                self.writer.write_line("EHLO").await?;
            }
            Command::End => {
                debug!("received END");
                self.writer.write_line("OK").await?;
                return Ok(Flow::Finished);
            }
            Command::Error(message) => {
                warn!(%message, "server reported an error");
                return Err(ProtocolError::ServerError(message));
            }
            Command::Field { field, token } => {
                debug!(%field, %token, "received field request");
                self.reply_field(field, &token).await?;
            }
            Command::Pow(challenge) => {
                debug!(authdata = %challenge.prefix, difficulty = %challenge.difficulty, "received POW");
                self.solve_round(challenge, shutdown).await?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn reply_field(&mut self, field: Field, token: &str) -> Result<(), ProtocolError> {
        let authdata = match self.authdata.as_deref() {
            Some(authdata) => authdata,
            None => {
                warn!(%field, "field requested before any POW, hashing with empty authdata");
                ""
            }
        };
        let value = field.value(&self.profile)?;
        let reply = format!("{} {}", field_reply(authdata, token), value);
        self.writer.write_line(&reply).await
    }

    async fn solve_round(
        &mut self,
        challenge: Challenge,
        shutdown: &CancellationToken,
    ) -> Result<(), ProtocolError> {
        self.authdata = Some(challenge.prefix.clone());
        self.rounds += 1;

        match self.solver.solve(&challenge, shutdown).await {
            Ok(solution) => {
                if !verify_suffix(&challenge.prefix, &solution.suffix, challenge.difficulty) {
                    return Err(ProtocolError::UnverifiedSuffix(solution.suffix));
                }
                self.writer.write_line(&solution.suffix).await
            }
            Err(WorkError::DeadlineExceeded) => {
                warn!(
                    difficulty = %challenge.difficulty,
                    "no suffix found before the round deadline, waiting for next command"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saltpow_nullables::NullSolver;
    use tokio::io::BufReader;

    async fn run_script(
        input: &str,
        solver: NullSolver,
    ) -> (Result<SessionOutcome, ProtocolError>, String) {
        let mut output = Vec::new();
        let result = {
            let mut session = Session::new(
                BufReader::new(input.as_bytes()),
                &mut output,
                Profile::default(),
                solver,
                SessionConfig::default(),
            );
            session.run(&CancellationToken::new()).await
        };
        (result, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn helo_then_end() {
        let (result, output) = run_script("HELO\r\nEND\r\n", NullSolver::failing(WorkError::Exhausted)).await;
        assert_eq!(result.unwrap(), SessionOutcome::Completed { rounds: 0 });
        assert_eq!(output, "EHLO\nOK\n");
    }

    #[tokio::test]
    async fn pow_sends_bare_suffix() {
        let (result, output) = run_script("POW abc123 3\nEND\n", NullSolver::returning("sol7")).await;
        assert_eq!(result.unwrap(), SessionOutcome::Completed { rounds: 1 });
        assert_eq!(output, "sol7\nOK\n");
    }

    #[tokio::test]
    async fn unverified_suffix_is_not_sent() {
        let (result, output) = run_script("POW abc123 3\n", NullSolver::returning("sol0")).await;
        assert!(matches!(result, Err(ProtocolError::UnverifiedSuffix(s)) if s == "sol0"));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn deadline_is_not_fatal() {
        let (result, output) = run_script(
            "POW abc123 3\nHELO\nEND\n",
            NullSolver::failing(WorkError::DeadlineExceeded),
        )
        .await;
        assert_eq!(result.unwrap(), SessionOutcome::Completed { rounds: 1 });
        assert_eq!(output, "EHLO\nOK\n");
    }

    #[tokio::test]
    async fn eof_is_disconnect() {
        let (result, _) = run_script("HELO\n", NullSolver::returning("x")).await;
        assert!(matches!(result, Err(ProtocolError::Disconnected)));
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let (result, output) = run_script("\n\r\nEND\n", NullSolver::returning("x")).await;
        assert!(result.is_ok());
        assert_eq!(output, "OK\n");
    }
}
