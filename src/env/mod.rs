//! Scoped execution environments.
//!
//! An [`EnvSession`] wraps one live interpreter subprocess for the duration
//! of a scope: commands stream in through `exec`, captured stdout accumulates
//! in a single buffer, and closing the scope hands the buffer back. The
//! interpreter is released on every exit path, including errors.

/// One live interpreter session per scope
mod session;
pub use session::EnvSession;

use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported execution environment kind '{0}'")]
    UnsupportedKind(String),
    #[error("failed to start {kind} session")]
    SessionStart {
        kind: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("command exited with status {status}")]
    CommandFailed { status: i32, output: String },
    #[error("{kind} session ended before reporting command status")]
    SessionEnded { kind: &'static str, output: String },
    #[error("malformed status marker from {kind} session")]
    BadMarker { kind: &'static str },
    #[error("session i/o error")]
    Io(#[from] std::io::Error),
}

/// The fixed set of interpreters a session can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvKind {
    Sh,
    Bash,
    Python,
}

impl EnvKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sh => "sh",
            Self::Bash => "bash",
            Self::Python => "python",
        }
    }

    pub(crate) fn program(&self) -> &'static str {
        match self {
            Self::Sh => "sh",
            Self::Bash => "bash",
            Self::Python => "python3",
        }
    }
}

impl std::fmt::Display for EnvKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnvKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "sh" => Ok(Self::Sh),
            "bash" => Ok(Self::Bash),
            "python" | "python3" | "py" => Ok(Self::Python),
            other => Err(Error::UnsupportedKind(other.to_owned())),
        }
    }
}

/// Scoped acquisition: open a session, hand it to `f`, and release it on
/// every exit path. Returns the accumulated output on success.
pub fn run_scoped<F>(kind: EnvKind, f: F) -> anyhow::Result<String>
where
    F: FnOnce(&mut EnvSession) -> anyhow::Result<()>,
{
    let mut env = EnvSession::open(kind)?;
    f(&mut env)?;
    Ok(env.close()?)
}
