//! Driving an interactive IOS shell: prompt detection, pager handling and
//! cleanup of a command's transcript.
//!
//! IOS accepts a single exec request per SSH connection, so every command of a
//! visit goes through one shell and is delimited by the device prompt.

use std::io::{self, Read, Write};
use std::sync::LazyLock;

use regex::Regex;

static PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([A-Za-z0-9][\w.\-/:@()]*[>#])[ \t]*\z").unwrap());
static PAGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*<?-+ ?More ?-+>?[ \t]*\z").unwrap());
// What the device prints to wipe the pager marker after a keypress.
static ERASE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x08+(?: +\x08+)?").unwrap());

const READ_CHUNK: usize = 4096;

/// The device prompt, e.g. `core-rtr1#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Finds a prompt at the very end of `buffer`.
    pub fn detect(buffer: &str) -> Option<Self> {
        PROMPT.captures(buffer).map(|caps| Self(caps[1].to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `buffer` ends with this prompt on a line of its own.
    pub fn ends(&self, buffer: &str) -> bool {
        buffer
            .trim_end_matches([' ', '\t'])
            .strip_suffix(self.0.as_str())
            .is_some_and(|head| head.is_empty() || head.ends_with(['\n', '\r']))
    }
}

/// Where a pager marker starts, if the device is waiting for a keypress.
pub fn pager_at(buffer: &str) -> Option<usize> {
    PAGER.find(buffer).map(|marker| marker.start())
}

/// Reads from `stream` until `done` accepts the accumulated text. Pager
/// markers are answered with a space and cut from the transcript.
pub fn read_until<S, T>(stream: &mut S, done: impl Fn(&str) -> Option<T>) -> io::Result<(String, T)>
where
    S: Read + Write,
{
    let mut buffer = String::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "device closed the shell",
            ));
        }
        buffer.push_str(&String::from_utf8_lossy(&chunk[..read]));

        if let Some(start) = pager_at(&buffer) {
            buffer.truncate(start);
            stream.write_all(b" ")?;
            stream.flush()?;
            continue;
        }
        if let Some(found) = done(&buffer) {
            return Ok((buffer, found));
        }
    }
}

/// Sends one command line.
pub fn send_line<S: Write>(stream: &mut S, line: &str) -> io::Result<()> {
    stream.write_all(line.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()
}

/// Strips the echoed command, terminal control bytes and the closing prompt.
pub fn clean_output(transcript: &str, command: &str, prompt: &Prompt) -> String {
    let text = ERASE.replace_all(transcript, "");
    let text = text.replace("\r\n", "\n").replace('\r', "");

    let mut lines: Vec<&str> = text.lines().collect();
    if lines.first().is_some_and(|line| line.trim_end().ends_with(command)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.trim() == prompt.as_str()) {
        lines.pop();
    }

    let mut output = lines.join("\n");
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
