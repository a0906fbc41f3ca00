use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use topomap_common::error::ExecError;
use tracing::trace;

/// Opens a blocking TCP stream to `address:port`, trying every resolved
/// socket address in turn.
pub fn connect(address: &str, port: u16, timeout: Duration) -> Result<TcpStream, ExecError> {
    let candidates: Vec<SocketAddr> = (address, port)
        .to_socket_addrs()
        .map_err(|e| connection_error(address, e.to_string()))?
        .collect();

    if candidates.is_empty() {
        return Err(connection_error(address, "name did not resolve".into()));
    }

    let mut last_error = None;
    for candidate in candidates {
        trace!(%candidate, "connecting");
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                last_error = Some(ExecError::Timeout {
                    address: address.to_string(),
                    after: timeout,
                });
            }
            Err(e) => last_error = Some(connection_error(address, e.to_string())),
        }
    }

    Err(last_error.unwrap_or_else(|| connection_error(address, "no address to dial".into())))
}

fn connection_error(address: &str, reason: String) -> ExecError {
    ExecError::Connection {
        address: address.to_string(),
        reason,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
