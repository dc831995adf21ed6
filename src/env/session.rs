use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use super::{EnvKind, Error};

/// End-of-command marker; the leading record separator keeps it out of
/// ordinary command output.
const MARKER: &str = "\u{1e}tasktype.done:";

/// Stdin driver for python sessions. CPython executes a piped stdin script
/// only after EOF, so incremental exec needs this shim: length-prefixed
/// source in, captured stdout plus a status marker out.
const PY_DRIVER: &str = r#"
import sys
ctx = {}
while True:
    header = sys.stdin.buffer.readline()
    if not header:
        break
    src = sys.stdin.buffer.read(int(header)).decode('utf-8')
    status = 0
    try:
        exec(compile(src, '<session>', 'exec'), ctx)
    except SystemExit as e:
        status = e.code if isinstance(e.code, int) else (0 if e.code is None else 1)
    except BaseException:
        import traceback
        traceback.print_exc()
        status = 1
    sys.stdout.write('\x1etasktype.done:%d\n' % status)
    sys.stdout.flush()
"#;

/// A scoped handle on one live interpreter subprocess.
///
/// Commands run synchronously through [`exec`](Self::exec); each call appends
/// the command's stdout to the accumulated buffer. [`close`](Self::close)
/// consumes the handle and returns the buffer, so no further `exec` calls are
/// possible after the scope ends. Dropping an unclosed session kills the
/// interpreter, so it is released even when an `exec` error or a panic
/// unwinds past the scope.
pub struct EnvSession {
    kind: EnvKind,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    buf: String,
}

impl EnvSession {
    /// Spawn one interpreter child for this scope.
    pub fn open(kind: EnvKind) -> Result<Self, Error> {
        let mut cmd = Command::new(kind.program());
        if kind == EnvKind::Python {
            cmd.args(["-u", "-c", PY_DRIVER]);
        }

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| Error::SessionStart {
                kind: kind.name(),
                source,
            })?;

        let stdin = child.stdin.take().expect("cannot attach to child stdin");
        let stdout = child.stdout.take().expect("cannot attach to child stdout");
        log::debug!("opened {kind} session (pid {})", child.id());

        Ok(Self {
            kind,
            child: Some(child),
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            buf: String::new(),
        })
    }

    /// Run `command` in the bound interpreter, appending its stdout to the
    /// accumulated buffer. Blocks until the command reports completion; a
    /// non-zero status fails with the status and everything captured so far.
    pub fn exec(&mut self, command: &str) -> Result<(), Error> {
        log::debug!("[{}] exec: {command}", self.kind);
        let stdin = self.stdin.as_mut().expect("stdin is piped until close");

        match self.kind {
            EnvKind::Sh | EnvKind::Bash => {
                stdin.write_all(command.as_bytes())?;
                stdin.write_all(b"\n")?;
                writeln!(stdin, "echo \"{MARKER}$?\"")?;
            }
            EnvKind::Python => {
                writeln!(stdin, "{}", command.len())?;
                stdin.write_all(command.as_bytes())?;
            }
        }
        stdin.flush()?;

        self.read_to_marker()
    }

    /// Stdout captured so far, in call order.
    pub fn output(&self) -> &str {
        &self.buf
    }

    /// End the scope: close the interpreter's stdin, wait for it to exit,
    /// and hand back the accumulated buffer.
    pub fn close(mut self) -> Result<String, Error> {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            log::trace!("[{}] session exited with {status}", self.kind);
        }
        Ok(std::mem::take(&mut self.buf))
    }

    fn read_to_marker(&mut self) -> Result<(), Error> {
        let mut line = String::with_capacity(128);
        loop {
            line.clear();
            let n = self.stdout.read_line(&mut line)?;
            if n == 0 {
                return Err(Error::SessionEnded {
                    kind: self.kind.name(),
                    output: self.buf.clone(),
                });
            }

            match line.find(MARKER) {
                // a command that didn't end its output with a newline leaves
                // its tail on the marker line:
                Some(at) => {
                    self.buf.push_str(&line[..at]);
                    let status = line[at + MARKER.len()..]
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| Error::BadMarker {
                            kind: self.kind.name(),
                        })?;
                    return if status == 0 {
                        Ok(())
                    } else {
                        Err(Error::CommandFailed {
                            status,
                            output: self.buf.clone(),
                        })
                    };
                }
                None => self.buf.push_str(&line),
            }
        }
    }
}

impl Drop for EnvSession {
    fn drop(&mut self) {
        // the session must be released on every exit path, so reap anything
        // still running if the scope was abandoned without close()
        if let Some(mut child) = self.child.take() {
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
