//! Rename scripts
//!
//! A `rename` entry in a `pandoc` block names a script that receives the
//! computed destination on stdin and prints the destination to use instead:
//!
//! ```yaml
//! pandoc:
//!   to: html5
//!   rename: ./lowercase.sh --keep-dirs
//! ```
//!
//! A command starting with `./` lives next to the destination. Other
//! relative commands are resolved through the configuration (the data
//! directory), falling back to the executable search path.

use pandocomatic_core::platform::{find_executable, is_executable};
use pandocomatic_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Runs a resolved rename script
pub trait ScriptRunner {
    /// Run `program` with `args`, feeding `input` on stdin, and return its stdout
    fn run(&self, program: &Path, args: &[String], input: &str) -> Result<String>;
}

/// Runs scripts as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl ScriptRunner for CommandRunner {
    #[tracing::instrument(level = "debug", skip(self, input), fields(program = %program.display()))]
    fn run(&self, program: &Path, args: &[String], input: &str) -> Result<String> {
        duct::cmd(program, args)
            .stdin_bytes(input.as_bytes().to_vec())
            .read()
            .map_err(|e| Error::ScriptExecution {
                script: program.display().to_string(),
                destination: PathBuf::from(input),
                reason: e.to_string(),
            })
    }
}

/// A rename script resolved to an executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameScript {
    script: String,
    program: PathBuf,
    args: Vec<String>,
}

impl RenameScript {
    /// Split `script` into program and arguments and locate the program
    ///
    /// `resolve` maps a relative command that does not start with `./` to a
    /// path; when nothing exists there the command is looked up on the
    /// executable search path.
    pub fn resolve<F>(script: &str, destination: &Path, resolve: F) -> Result<Self>
    where
        F: FnOnce(&str) -> PathBuf,
    {
        let words = shell_words::split(script).map_err(|e| Error::ScriptExecution {
            script: script.to_string(),
            destination: destination.to_path_buf(),
            reason: format!("Failed to parse script: {e}"),
        })?;

        let Some((command, args)) = words.split_first() else {
            return Err(Error::ScriptNotFound(script.to_string()));
        };

        let candidate = match command.strip_prefix("./") {
            Some(local) => destination
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(local),
            None => resolve(command),
        };

        let program = if candidate.exists() {
            candidate
        } else {
            find_executable(command).ok_or_else(|| Error::ScriptNotFound(command.clone()))?
        };

        if !is_executable(&program) {
            return Err(Error::ScriptNotExecutable(program));
        }

        Ok(Self {
            script: script.to_string(),
            program,
            args: args.to_vec(),
        })
    }

    /// The resolved executable
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed after the program
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the script on `destination` and return the renamed destination
    ///
    /// The first line of the trimmed output is the new destination; no
    /// output at all is an error.
    pub fn run(&self, runner: &dyn ScriptRunner, destination: &Path) -> Result<PathBuf> {
        let output = runner.run(&self.program, &self.args, &destination.to_string_lossy())?;

        let renamed = output.trim().lines().next().map(str::trim).unwrap_or_default();
        if renamed.is_empty() {
            return Err(Error::ScriptExecution {
                script: self.script.clone(),
                destination: destination.to_path_buf(),
                reason: "script did not print a renamed destination".to_string(),
            });
        }

        tracing::debug!(
            "Renamed {} to {} with '{}'",
            destination.display(),
            renamed,
            self.script
        );
        Ok(PathBuf::from(renamed))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::cell::RefCell;

    /// Records invocations and answers with a canned output
    struct FakeRunner {
        output: String,
        calls: RefCell<Vec<(PathBuf, Vec<String>, String)>>,
    }

    impl FakeRunner {
        fn new(output: &str) -> Self {
            Self {
                output: output.to_string(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ScriptRunner for FakeRunner {
        fn run(&self, program: &Path, args: &[String], input: &str) -> Result<String> {
            self.calls
                .borrow_mut()
                .push((program.to_path_buf(), args.to_vec(), input.to_string()));
            Ok(self.output.clone())
        }
    }

    fn as_path(command: &str) -> PathBuf {
        PathBuf::from(command)
    }

    fn script(program: &str) -> RenameScript {
        RenameScript {
            script: program.to_string(),
            program: PathBuf::from(program),
            args: vec!["--flag".to_string()],
        }
    }

    #[test]
    fn test_run_uses_first_output_line() {
        let runner = FakeRunner::new("\n  /out/renamed.html  \nignored\n");
        let renamed = script("/bin/rename")
            .run(&runner, Path::new("/out/report.html"))
            .unwrap();

        assert_eq!(renamed, PathBuf::from("/out/renamed.html"));

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, PathBuf::from("/bin/rename"));
        assert_eq!(calls[0].1, ["--flag"]);
        assert_eq!(calls[0].2, "/out/report.html");
    }

    #[test]
    fn test_run_without_output_fails() {
        let runner = FakeRunner::new("   \n");
        let err = script("/bin/rename")
            .run(&runner, Path::new("/out/report.html"))
            .unwrap_err();

        assert!(matches!(err, Error::ScriptExecution { .. }));
    }

    #[test]
    fn test_unknown_command_is_not_found() {
        let err = RenameScript::resolve(
            "pandocomatic-no-such-rename-script",
            Path::new("/out/report.html"),
            |command| PathBuf::from("/nonexistent-data-dir").join(command),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::ScriptNotFound(name) if name == "pandocomatic-no-such-rename-script"
        ));
    }

    #[test]
    fn test_empty_script_is_not_found() {
        let err = RenameScript::resolve("  ", Path::new("report.html"), as_path).unwrap_err();
        assert!(matches!(err, Error::ScriptNotFound(_)));
    }

    #[test]
    fn test_unbalanced_quotes_fail_to_parse() {
        let err =
            RenameScript::resolve("rename 'oops", Path::new("report.html"), as_path)
                .unwrap_err();
        assert!(matches!(err, Error::ScriptExecution { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_local_script_is_anchored_to_destination() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        let local = temp.path().join("rename.sh");
        fs::write(&local, "#!/bin/sh\ncat\n").unwrap();
        fs::set_permissions(&local, fs::Permissions::from_mode(0o755)).unwrap();

        let destination = temp.path().join("report.html");
        let resolved =
            RenameScript::resolve("./rename.sh 'two words'", &destination, |_| {
                panic!("local scripts are not resolved through the configuration")
            })
            .unwrap();

        assert_eq!(resolved.program(), local);
        assert_eq!(resolved.args(), ["two words"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_script_is_rejected() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        let local = temp.path().join("rename.sh");
        fs::write(&local, "#!/bin/sh\ncat\n").unwrap();
        fs::set_permissions(&local, fs::Permissions::from_mode(0o644)).unwrap();

        let err = RenameScript::resolve("./rename.sh", &temp.path().join("report.html"), as_path)
            .unwrap_err();
        assert!(matches!(err, Error::ScriptNotExecutable(path) if path == local));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_runner_feeds_stdin() {
        let sh = find_executable("sh").unwrap();
        let output = CommandRunner
            .run(&sh, &["-c".to_string(), "sed s/md/html/".to_string()], "report.md")
            .unwrap();
        assert_eq!(output.trim(), "report.html");
    }
}
