//! A single device visit: open a session, run every show command, parse what
//! came back. Visits never touch the topology graph; the engine applies their
//! outcome afterwards, one at a time.

use std::time::Duration;

use tokio::time::timeout;
use topomap_common::command::ShowCommand;
use topomap_common::error::ExecError;
use topomap_common::ports::{CommandExecutor, DeviceTarget, OutputParser};
use topomap_common::records::ParsedOutput;
use tracing::{debug, warn};

use crate::topology::CommandFailure;

#[derive(Debug, Clone, Copy)]
pub(super) struct Timeouts {
    pub connect: Duration,
    pub command: Duration,
}

#[derive(Debug)]
pub(super) enum VisitOutcome {
    /// The session could not be opened.
    Unreachable(ExecError),
    /// The session was opened; some commands may still have failed.
    Visited {
        /// Commands that returned text, whether or not it parsed.
        answered: usize,
        outputs: Vec<(ShowCommand, ParsedOutput)>,
        failures: Vec<CommandFailure>,
    },
}

pub(super) async fn visit(
    executor: &dyn CommandExecutor,
    parser: &dyn OutputParser,
    target: &DeviceTarget,
    timeouts: Timeouts,
) -> VisitOutcome {
    let mut session = match timeout(timeouts.connect, executor.open(target)).await {
        Ok(Ok(session)) => session,
        Ok(Err(err)) => return VisitOutcome::Unreachable(err),
        Err(_elapsed) => {
            return VisitOutcome::Unreachable(ExecError::Timeout {
                address: target.address.clone(),
                after: timeouts.connect,
            });
        }
    };

    let mut answered = 0;
    let mut outputs = Vec::new();
    let mut failures = Vec::new();

    for command in ShowCommand::DISCOVERY_SET {
        let raw = match timeout(timeouts.command, session.execute(command)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                warn!(%command, %err, "command failed");
                let session_lost = err.is_session_fatal();
                failures.push(failure(command, err.to_string()));
                if session_lost {
                    break;
                }
                continue;
            }
            Err(_elapsed) => {
                let err = ExecError::Timeout {
                    address: target.address.clone(),
                    after: timeouts.command,
                };
                warn!(%command, %err, "command timed out");
                failures.push(failure(command, err.to_string()));
                break;
            }
        };

        answered += 1;
        match parser.parse(command, &raw) {
            Ok(parsed) => outputs.push((command, parsed)),
            Err(err) => {
                warn!(%command, %err, "could not parse output");
                failures.push(failure(command, err.to_string()));
            }
        }
    }

    session.close().await;
    debug!(answered, parsed = outputs.len(), failed = failures.len(), "visit finished");

    VisitOutcome::Visited {
        answered,
        outputs,
        failures,
    }
}

fn failure(command: ShowCommand, reason: String) -> CommandFailure {
    CommandFailure {
        command: command.to_string(),
        reason,
    }
}
