use anyhow::Result;

use tasktype::env::{self, run_scoped};
use tasktype::{EnvKind, EnvSession};

fn init_logging() {
    simple_logging::log_to_stderr(log::LevelFilter::Debug);
}

#[test]
fn exec_captures_stdout() -> Result<()> {
    init_logging();
    let mut env = EnvSession::open(EnvKind::Sh)?;
    env.exec("echo ok")?;
    let output = env.close()?;
    assert!(output.contains("ok"));
    Ok(())
}

#[test]
fn output_accumulates_in_call_order() -> Result<()> {
    let mut env = EnvSession::open(EnvKind::Sh)?;
    env.exec("echo first")?;
    env.exec("echo second")?;
    assert_eq!(env.close()?, "first\nsecond\n");
    Ok(())
}

#[test]
fn output_is_readable_while_the_scope_is_open() -> Result<()> {
    let mut env = EnvSession::open(EnvKind::Sh)?;
    env.exec("echo first")?;
    assert_eq!(env.output(), "first\n");
    env.exec("echo second")?;
    assert_eq!(env.output(), "first\nsecond\n");
    assert_eq!(env.close()?, "first\nsecond\n");
    Ok(())
}

#[test]
fn output_without_trailing_newline_is_kept() -> Result<()> {
    let mut env = EnvSession::open(EnvKind::Sh)?;
    env.exec("printf abc")?;
    env.exec("printf def")?;
    assert_eq!(env.close()?, "abcdef");
    Ok(())
}

#[test]
fn failing_command_reports_status_and_partial_output() -> Result<()> {
    init_logging();
    let mut env = EnvSession::open(EnvKind::Sh)?;
    env.exec("echo partial")?;

    let err = env.exec("false").unwrap_err();
    match err {
        env::Error::CommandFailed { status, output } => {
            assert_ne!(status, 0);
            assert!(output.contains("partial"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    drop(env);

    // the failed session was released; a fresh scope opens immediately:
    let mut env = EnvSession::open(EnvKind::Sh)?;
    env.exec("echo ok")?;
    assert!(env.close()?.contains("ok"));
    Ok(())
}

#[test]
fn interpreter_exit_ends_the_session() -> Result<()> {
    let mut env = EnvSession::open(EnvKind::Sh)?;
    env.exec("echo before")?;

    let err = env.exec("exit 7").unwrap_err();
    match err {
        // the shell is gone before it can report a status:
        env::Error::SessionEnded { output, .. } => assert!(output.contains("before")),
        // or it already took the write end of the pipe down with it:
        env::Error::Io(_) => {}
        other => panic!("expected SessionEnded, got {other:?}"),
    }
    Ok(())
}

#[test]
fn commands_share_one_interpreter_session() -> Result<()> {
    let mut env = EnvSession::open(EnvKind::Sh)?;
    env.exec("greeting=hello")?;
    env.exec("echo \"$greeting world\"")?;
    assert_eq!(env.close()?, "hello world\n");
    Ok(())
}

#[test]
fn session_side_effects_are_visible_on_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.txt");

    let mut env = EnvSession::open(EnvKind::Sh)?;
    env.exec(&format!("echo data > {}", path.display()))?;
    env.close()?;

    assert_eq!(std::fs::read_to_string(&path)?, "data\n");
    dir.close()?;
    Ok(())
}

#[test]
fn run_scoped_releases_on_both_paths() -> Result<()> {
    let output = run_scoped(EnvKind::Sh, |env| {
        env.exec("echo one")?;
        env.exec("echo two")?;
        Ok(())
    })?;
    assert_eq!(output, "one\ntwo\n");

    let failed = run_scoped(EnvKind::Sh, |env| {
        env.exec("false")?;
        Ok(())
    });
    assert!(failed.is_err());

    // and the environment still hands out fresh sessions afterwards:
    assert!(EnvSession::open(EnvKind::Sh).is_ok());
    Ok(())
}

#[test]
fn bash_sessions_work_where_bash_exists() -> Result<()> {
    let mut env = match EnvSession::open(EnvKind::Bash) {
        Ok(env) => env,
        // not every box has bash; sh coverage above is the contract
        Err(env::Error::SessionStart { .. }) => return Ok(()),
        Err(other) => return Err(other.into()),
    };
    env.exec("echo ${BASH_VERSION:+bash-ok}")?;
    assert!(env.close()?.contains("bash-ok"));
    Ok(())
}

#[test]
fn python_sessions_execute_incrementally() -> Result<()> {
    init_logging();
    let mut env = match EnvSession::open(EnvKind::Python) {
        Ok(env) => env,
        Err(env::Error::SessionStart { .. }) => return Ok(()),
        Err(other) => return Err(other.into()),
    };

    env.exec("x = 2 + 2")?;
    env.exec("print('sum is', x)")?;

    let err = env.exec("raise ValueError('boom')").unwrap_err();
    match err {
        env::Error::CommandFailed { status, output } => {
            assert_eq!(status, 1);
            assert!(output.contains("sum is 4"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    Ok(())
}
