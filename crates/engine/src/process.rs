//! Child process execution
//!
//! Engines and hooks describe what to spawn as an [`Invocation`] and hand it
//! to a [`ProcessRunner`]. [`DuctRunner`] runs it for real; tests substitute a
//! runner that records invocations instead.

use indexmap::IndexMap;
use lohup_core::{Error, Result};

/// A child process to spawn
///
/// The child inherits the parent environment, extended by `env`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name or path
    pub program: String,
    /// Arguments, without the program
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: IndexMap<String, String>,
}

impl Invocation {
    /// Invocation of `program` without arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Build from an argv whose first element is the program
    ///
    /// # Errors
    ///
    /// Returns an error if `argv` is empty
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Message("empty command".to_string()))?;
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Shell-quoted command line, for logs
    ///
    /// Environment values are not included since they may hold credentials.
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(&self.args))
    }
}

/// Runs child processes to completion
///
/// A non-zero exit status is an error. Nothing is retried.
pub trait ProcessRunner {
    /// Run with inherited stdio
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Run `source` with its stdout connected to the stdin of `sink`
    ///
    /// Both exit statuses are checked.
    fn pipe(&self, source: &Invocation, sink: &Invocation) -> Result<()>;

    /// Run and capture stdout
    fn read(&self, invocation: &Invocation) -> Result<String>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        (**self).run(invocation)
    }

    fn pipe(&self, source: &Invocation, sink: &Invocation) -> Result<()> {
        (**self).pipe(source, sink)
    }

    fn read(&self, invocation: &Invocation) -> Result<String> {
        (**self).read(invocation)
    }
}

/// Runner spawning real processes through duct
#[derive(Debug, Clone, Copy, Default)]
pub struct DuctRunner;

impl DuctRunner {
    fn expression(invocation: &Invocation) -> Result<duct::Expression> {
        if which::which(&invocation.program).is_err() {
            return Err(Error::Process {
                command: invocation.program.clone(),
                message: "executable not found".to_string(),
            });
        }

        let mut expr = duct::cmd(&invocation.program, &invocation.args);
        for (key, value) in &invocation.env {
            expr = expr.env(key, value);
        }
        Ok(expr)
    }

    fn failed(invocation: &Invocation, err: &std::io::Error) -> Error {
        Error::Process {
            command: invocation.program.clone(),
            message: err.to_string(),
        }
    }
}

impl ProcessRunner for DuctRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        tracing::debug!("Executing: {}", invocation.command_line());
        Self::expression(invocation)?
            .run()
            .map(|_| ())
            .map_err(|e| Self::failed(invocation, &e))
    }

    fn pipe(&self, source: &Invocation, sink: &Invocation) -> Result<()> {
        tracing::debug!(
            "Executing: {} | {}",
            source.command_line(),
            sink.command_line()
        );
        Self::expression(source)?
            .pipe(Self::expression(sink)?)
            .run()
            .map(|_| ())
            .map_err(|e| Error::Process {
                command: format!("{} | {}", source.program, sink.program),
                message: e.to_string(),
            })
    }

    fn read(&self, invocation: &Invocation) -> Result<String> {
        tracing::debug!("Executing: {}", invocation.command_line());
        let output = Self::expression(invocation)?
            .stdout_capture()
            .run()
            .map_err(|e| Self::failed(invocation, &e))?;

        String::from_utf8(output.stdout).map_err(|e| Error::Process {
            command: invocation.program.clone(),
            message: format!("output is not valid UTF-8: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_builder() {
        let inv = Invocation::new("restic")
            .arg("backup")
            .args(["--tag", "home"])
            .env("RESTIC_REPOSITORY", "/srv/repo");
        assert_eq!(inv.program, "restic");
        assert_eq!(inv.args, ["backup", "--tag", "home"]);
        assert_eq!(inv.env["RESTIC_REPOSITORY"], "/srv/repo");
    }

    #[test]
    fn test_from_argv() {
        let argv = vec!["pg_dump".to_string(), "-Fc".to_string()];
        let inv = Invocation::from_argv(&argv).unwrap();
        assert_eq!(inv.program, "pg_dump");
        assert_eq!(inv.args, ["-Fc"]);
        assert!(Invocation::from_argv(&[]).is_err());
    }

    #[test]
    fn test_command_line_quotes_and_hides_env() {
        let inv = Invocation::new("logger")
            .arg("backup done")
            .env("AWS_SECRET_ACCESS_KEY", "hunter2");
        assert_eq!(inv.command_line(), "logger 'backup done'");
    }

    #[test]
    fn test_missing_executable() {
        let inv = Invocation::new("lohup-definitely-not-installed");
        let err = DuctRunner.run(&inv).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Command 'lohup-definitely-not-installed' failed: executable not found"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_read_and_exit_status() {
        let out = DuctRunner
            .read(&Invocation::new("sh").args(["-c", "printf \"$GREETING\""]).env("GREETING", "hi"))
            .unwrap();
        assert_eq!(out, "hi");

        let err = DuctRunner
            .run(&Invocation::new("sh").args(["-c", "exit 3"]))
            .unwrap_err();
        assert!(matches!(err, Error::Process { ref command, .. } if command == "sh"));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_checks_both_sides() {
        let source = Invocation::new("sh").args(["-c", "echo data"]);
        let sink = Invocation::new("sh").args(["-c", "cat >/dev/null"]);
        DuctRunner.pipe(&source, &sink).unwrap();

        let failing = Invocation::new("sh").args(["-c", "echo data; exit 1"]);
        assert!(DuctRunner.pipe(&failing, &sink).is_err());
    }
}
