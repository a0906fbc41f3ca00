//! SSH implementation of the [`CommandExecutor`] port, built on `ssh2`.
//!
//! `ssh2` is blocking, so every session operation runs on tokio's blocking pool.
//! Commands go through a single interactive shell per device; see [`shell`].

use std::time::Duration;

use async_trait::async_trait;
use ssh2::{Channel, ErrorCode, Session};
use topomap_common::command::ShowCommand;
use topomap_common::config::DiscoveryConfig;
use topomap_common::error::ExecError;
use topomap_common::ports::{CommandExecutor, DeviceSession, DeviceTarget};
use tracing::{debug, trace};

use super::shell::{self, Prompt};
use super::tcp;

const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
const PTY_SIZE: (u32, u32, u32, u32) = (511, 24, 0, 0);
const PAGER_OFF: &str = "terminal length 0";

#[derive(Debug, Clone, Copy)]
pub struct SshExecutor {
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl SshExecutor {
    pub fn new() -> Self {
        Self {
            connect_timeout: topomap_common::config::DEFAULT_CONNECT_TIMEOUT,
            command_timeout: topomap_common::config::DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new().with_timeouts(config.connect_timeout, config.command_timeout)
    }

    pub fn with_timeouts(mut self, connect: Duration, command: Duration) -> Self {
        self.connect_timeout = connect;
        self.command_timeout = command;
        self
    }
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for SshExecutor {
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, ExecError> {
        let target = target.clone();
        let address = target.address.clone();
        let executor = *self;

        let shell = tokio::task::spawn_blocking(move || {
            let session = executor.establish(&target)?;
            Shell::start(session, target.address)
        })
        .await
        .map_err(|e| ExecError::Connection {
            address: address.clone(),
            reason: format!("ssh worker failed: {e}"),
        })??;

        debug!(%address, "ssh session established");
        Ok(Box::new(SshSession {
            shell: Some(shell),
            address,
        }))
    }
}

impl SshExecutor {
    fn establish(&self, target: &DeviceTarget) -> Result<Session, ExecError> {
        let address = target.address.as_str();
        let credentials = &target.credentials;
        let stream = tcp::connect(address, credentials.port, self.connect_timeout)?;

        let mut session = Session::new().map_err(|e| self.session_error(address, e))?;
        session.set_timeout(millis(self.connect_timeout));
        session.set_tcp_stream(stream);
        session.handshake().map_err(|e| self.session_error(address, e))?;

        let username = credentials.username.as_str();
        let auth = match (&credentials.key_file, &credentials.password) {
            (Some(key_file), passphrase) => {
                session.userauth_pubkey_file(username, None, key_file, passphrase.as_deref())
            }
            (None, Some(password)) => session.userauth_password(username, password),
            (None, None) => session.userauth_agent(username),
        };
        auth.map_err(|e| match e.code() {
            ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => self.session_error(address, e),
            _ => ExecError::Auth {
                address: address.to_string(),
                user: username.to_string(),
            },
        })?;

        if !session.authenticated() {
            return Err(ExecError::Auth {
                address: address.to_string(),
                user: username.to_string(),
            });
        }

        session.set_timeout(millis(self.command_timeout));
        Ok(session)
    }

    fn session_error(&self, address: &str, e: ssh2::Error) -> ExecError {
        map_ssh_error(address, self.connect_timeout, e)
    }
}

fn map_ssh_error(address: &str, after: Duration, e: ssh2::Error) -> ExecError {
    match e.code() {
        ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => ExecError::Timeout {
            address: address.to_string(),
            after,
        },
        _ => ExecError::Connection {
            address: address.to_string(),
            reason: e.message().to_string(),
        },
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

/// An authenticated session driving one interactive shell.
pub struct SshSession {
    // Taken while a blocking call owns it.
    shell: Option<Shell>,
    address: String,
}

#[async_trait]
impl DeviceSession for SshSession {
    async fn execute(&mut self, command: ShowCommand) -> Result<String, ExecError> {
        let mut shell = self.shell.take().ok_or_else(|| ExecError::Connection {
            address: self.address.clone(),
            reason: "session already closed".into(),
        })?;

        let (shell, result) = tokio::task::spawn_blocking(move || {
            let result = shell.run(command);
            (shell, result)
        })
        .await
        .map_err(|e| ExecError::Connection {
            address: self.address.clone(),
            reason: format!("ssh worker failed: {e}"),
        })?;

        self.shell = Some(shell);
        result
    }

    async fn close(self: Box<Self>) {
        if let Some(shell) = self.shell {
            let _ = tokio::task::spawn_blocking(move || shell.exit()).await;
        }
    }
}

struct Shell {
    session: Session,
    channel: Channel,
    prompt: Prompt,
    address: String,
    timeout: Duration,
}

impl Shell {
    /// Opens the shell, waits for the first prompt and turns the pager off.
    fn start(session: Session, address: String) -> Result<Self, ExecError> {
        let timeout = Duration::from_millis(u64::from(session.timeout()));
        let ssh_error = |e| map_ssh_error(&address, timeout, e);

        let mut channel = session.channel_session().map_err(ssh_error)?;
        channel
            .request_pty("vt100", None, Some(PTY_SIZE))
            .map_err(ssh_error)?;
        channel.shell().map_err(ssh_error)?;

        let (_banner, prompt) = shell::read_until(&mut channel, Prompt::detect)
            .map_err(|e| io_error(&address, timeout, e))?;
        debug!(%address, prompt = prompt.as_str(), "shell ready");

        let mut shell = Self {
            session,
            channel,
            prompt,
            address,
            timeout,
        };
        shell.converse(PAGER_OFF)?;
        Ok(shell)
    }

    fn run(&mut self, command: ShowCommand) -> Result<String, ExecError> {
        let transcript = self.converse(command.as_cli())?;
        let output = shell::clean_output(&transcript, command.as_cli(), &self.prompt);
        trace!(%command, bytes = output.len(), "command finished");
        Ok(output)
    }

    /// Sends one line and returns everything up to the next prompt.
    fn converse(&mut self, line: &str) -> Result<String, ExecError> {
        let prompt = &self.prompt;
        shell::send_line(&mut self.channel, line)
            .and_then(|()| shell::read_until(&mut self.channel, |buffer| prompt.ends(buffer).then_some(())))
            .map(|(transcript, ())| transcript)
            .map_err(|e| io_error(&self.address, self.timeout, e))
    }

    fn exit(mut self) {
        let _ = shell::send_line(&mut self.channel, "exit");
        let _ = self.channel.close();
        let _ = self.session.disconnect(None, "discovery finished", None);
    }
}

fn io_error(address: &str, after: Duration, e: std::io::Error) -> ExecError {
    match e.kind() {
        std::io::ErrorKind::TimedOut => ExecError::Timeout {
            address: address.to_string(),
            after,
        },
        _ => ExecError::Connection {
            address: address.to_string(),
            reason: e.to_string(),
        },
    }
}
