use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use unipm_constants::{CHILD_PROCESS_ENV, WINDOWS_SHIM_EXTENSIONS};

/// A single subprocess invocation request.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Converts a failed invocation into a passive outcome instead of an
    /// error. Used for best-effort probing commands.
    pub ignore_error: bool,
    /// Inherit stdio instead of capturing it (script runs).
    pub print_output: bool,
}

impl ExecOptions {
    pub fn new(command: impl Into<String>, args: &[&str]) -> Self {
        Self {
            command: command.into(),
            args: args.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn ignore_error(mut self) -> Self {
        self.ignore_error = true;
        self
    }

    fn display(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl ExecOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Failure of a subprocess invocation, carrying the captured streams so
/// error classifiers can inspect them.
#[derive(Debug)]
pub struct ExecError {
    pub message: String,
    pub stdout: String,
    pub stderr: String,
    pub status: Option<i32>,
}

impl ExecError {
    fn spawn_failure(command: &str, err: &std::io::Error) -> Self {
        Self {
            message: format!("Failed to run '{command}': {err}"),
            stdout: String::new(),
            stderr: err.to_string(),
            status: None,
        }
    }

    fn non_zero(command: &str, output: &ExecOutput) -> Self {
        Self {
            message: format!("'{command}' exited with code {}", output.status),
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
            status: Some(output.status),
        }
    }

    /// Combined stderr/stdout text, the input error classifiers scan.
    #[must_use]
    pub fn combined_output(&self) -> String {
        let mut combined = self.stderr.clone();
        if !self.stdout.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(&self.stdout);
        }
        combined
    }

    /// Matches the platform's "command not recognized" signatures, the
    /// signal to retry with the next shim candidate.
    #[must_use]
    pub fn is_not_recognized(&self) -> bool {
        let text = format!("{} {}", self.message, self.stderr);
        text.contains("is not recognized")
            || text.contains("cannot find the file")
            || text.contains("No such file or directory")
            || text.contains("os error 2")
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExecError {}

pub type ExecResult = std::result::Result<ExecOutput, ExecError>;

/// Candidate executable names in resolution order. Windows package
/// managers install shims, so the shim extensions are tried before the
/// bare name; elsewhere the bare name is the only candidate.
#[must_use]
pub fn shim_candidates(command: &str) -> Vec<String> {
    if cfg!(windows) {
        WINDOWS_SHIM_EXTENSIONS
            .iter()
            .map(|ext| format!("{command}{ext}"))
            .collect()
    } else {
        vec![command.to_string()]
    }
}

fn merged_env(extra: &[(String, String)]) -> Vec<(String, String)> {
    let mut env: Vec<(String, String)> = CHILD_PROCESS_ENV
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    env.extend(extra.iter().cloned());
    env
}

/// Runs a command asynchronously, resolving shims and applying the fixed
/// child environment. Non-zero exits are errors unless `ignore_error`.
pub async fn execute(opts: &ExecOptions) -> ExecResult {
    unipm_logger::shell(&opts.display());

    let mut last_err: Option<ExecError> = None;
    for candidate in shim_candidates(&opts.command) {
        match run_candidate_async(&candidate, opts).await {
            Ok(output) => return finish(opts, output),
            Err(err) if err.is_not_recognized() => {
                unipm_logger::debug(&format!(
                    "'{candidate}' was not recognized, trying next candidate"
                ));
                last_err = Some(err);
            }
            Err(err) => return fail(opts, err),
        }
    }

    let err = last_err.unwrap_or_else(|| ExecError {
        message: format!("No executable candidate for '{}'", opts.command),
        stdout: String::new(),
        stderr: String::new(),
        status: None,
    });
    fail(opts, err)
}

/// Synchronous variant used for environment-detection probes that run
/// before any async machinery is available.
pub fn execute_sync(opts: &ExecOptions) -> ExecResult {
    let mut last_err: Option<ExecError> = None;
    for candidate in shim_candidates(&opts.command) {
        match run_candidate_sync(&candidate, opts) {
            Ok(output) => return finish(opts, output),
            Err(err) if err.is_not_recognized() => {
                last_err = Some(err);
            }
            Err(err) => return fail(opts, err),
        }
    }

    let err = last_err.unwrap_or_else(|| ExecError {
        message: format!("No executable candidate for '{}'", opts.command),
        stdout: String::new(),
        stderr: String::new(),
        status: None,
    });
    fail(opts, err)
}

fn finish(opts: &ExecOptions, output: ExecOutput) -> ExecResult {
    if output.success() || opts.ignore_error {
        Ok(output)
    } else {
        Err(ExecError::non_zero(&opts.display(), &output))
    }
}

fn fail(opts: &ExecOptions, err: ExecError) -> ExecResult {
    if opts.ignore_error {
        Ok(ExecOutput {
            stdout: err.stdout,
            stderr: err.stderr,
            status: err.status.unwrap_or(-1),
        })
    } else {
        Err(err)
    }
}

async fn run_candidate_async(candidate: &str, opts: &ExecOptions) -> ExecResult {
    let mut cmd = tokio::process::Command::new(candidate);
    cmd.args(&opts.args);
    if let Some(dir) = &opts.cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in merged_env(&opts.env) {
        cmd.env(key, value);
    }

    if opts.print_output {
        let status = cmd
            .status()
            .await
            .map_err(|e| ExecError::spawn_failure(candidate, &e))?;
        return Ok(ExecOutput {
            stdout: String::new(),
            stderr: String::new(),
            status: status.code().unwrap_or(-1),
        });
    }

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let output = cmd
        .output()
        .await
        .map_err(|e| ExecError::spawn_failure(candidate, &e))?;

    Ok(ExecOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        status: output.status.code().unwrap_or(-1),
    })
}

fn run_candidate_sync(candidate: &str, opts: &ExecOptions) -> ExecResult {
    let mut cmd = std::process::Command::new(candidate);
    cmd.args(&opts.args);
    if let Some(dir) = &opts.cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in merged_env(&opts.env) {
        cmd.env(key, value);
    }

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let output = cmd
        .output()
        .map_err(|e| ExecError::spawn_failure(candidate, &e))?;

    Ok(ExecOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        status: output.status.code().unwrap_or(-1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shim_candidate_order() {
        let candidates = shim_candidates("npm");
        if cfg!(windows) {
            assert_eq!(candidates, vec!["npm.cmd", "npm.bat", "npm.exe", "npm"]);
        } else {
            assert_eq!(candidates, vec!["npm"]);
        }
    }

    #[test]
    fn test_not_recognized_detection() {
        let err = ExecError {
            message: "'npm.cmd' is not recognized as an internal or external command".to_string(),
            stdout: String::new(),
            stderr: String::new(),
            status: None,
        };
        assert!(err.is_not_recognized());

        let err = ExecError {
            message: "'npm install' exited with code 1".to_string(),
            stdout: String::new(),
            stderr: "npm ERR! code ERESOLVE".to_string(),
            status: Some(1),
        };
        assert!(!err.is_not_recognized());
    }

    #[test]
    fn test_child_env_is_always_injected() {
        let env = merged_env(&[("EXTRA".to_string(), "1".to_string())]);
        assert!(
            env.iter()
                .any(|(k, v)| k == "COREPACK_ENABLE_STRICT" && v == "0")
        );
        assert!(env.iter().any(|(k, v)| k == "EXTRA" && v == "1"));
    }

    #[test]
    fn test_ignore_error_yields_passive_outcome() {
        let opts = ExecOptions::new("whatever", &[]).ignore_error();
        let err = ExecError {
            message: "boom".to_string(),
            stdout: String::new(),
            stderr: "boom".to_string(),
            status: Some(127),
        };
        let outcome = fail(&opts, err);
        match outcome {
            Ok(output) => assert_eq!(output.status, 127),
            Err(_) => panic!("ignore_error must not propagate failures"),
        }
    }

    #[test]
    fn test_combined_output_joins_streams() {
        let err = ExecError {
            message: "x".to_string(),
            stdout: "out".to_string(),
            stderr: "err".to_string(),
            status: Some(1),
        };
        assert_eq!(err.combined_output(), "err\nout");
    }
}
