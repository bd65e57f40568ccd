// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use std::{
    ffi::OsString,
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Output, Stdio},
    sync::LazyLock,
};

use itertools::Itertools;
use regex_lite::Regex;

use crate::error::RenderError;

pub const CMD_NAME: &str = "katex";

/// Side file in the cache directory remembering the resolved command line.
pub const LOCAL_CMD_CACHE: &str = "local_katex_cmd.txt";

const FALLBACK_BIN_DIR: &str = "/usr/local/bin";

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+").unwrap());

/// How a katex invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success,
    Terminated { signal: String },
    Failed { code: i32, output: String },
}

impl Outcome {
    fn classify(status: ExitStatus, output: &Output) -> Outcome {
        if status.success() {
            return Outcome::Success;
        }
        match status.code() {
            Some(code) => Outcome::Failed {
                code,
                output: combined_output(output),
            },
            None => Outcome::Terminated {
                signal: signal_name(status),
            },
        }
    }

    /// Attach the offending formula to a failed outcome.
    pub fn into_result(self, tex: &str) -> Result<(), RenderError> {
        match self {
            Outcome::Success => Ok(()),
            Outcome::Terminated { signal } => Err(RenderError::Terminated {
                tex: tex.to_string(),
                signal,
            }),
            Outcome::Failed { code, output } => Err(RenderError::Failed {
                tex: tex.to_string(),
                code,
                output,
            }),
        }
    }
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{}\n{}", stdout, stderr).trim().to_string()
}

#[cfg(unix)]
fn signal_name(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(n) => signal_label(n),
        None => "unknown signal".to_string(),
    }
}

#[cfg(target_os = "linux")]
fn signal_label(n: i32) -> String {
    const NAMES: [&str; 31] = [
        "SIGHUP", "SIGINT", "SIGQUIT", "SIGILL", "SIGTRAP", "SIGABRT", "SIGBUS", "SIGFPE",
        "SIGKILL", "SIGUSR1", "SIGSEGV", "SIGUSR2", "SIGPIPE", "SIGALRM", "SIGTERM",
        "SIGSTKFLT", "SIGCHLD", "SIGCONT", "SIGSTOP", "SIGTSTP", "SIGTTIN", "SIGTTOU",
        "SIGURG", "SIGXCPU", "SIGXFSZ", "SIGVTALRM", "SIGPROF", "SIGWINCH", "SIGIO", "SIGPWR",
        "SIGSYS",
    ];
    match usize::try_from(n) {
        Ok(i) if (1..=NAMES.len()).contains(&i) => NAMES[i - 1].to_string(),
        _ => format!("SIG{}", n),
    }
}

// numbering differs between unix flavours; only linux is named
#[cfg(all(unix, not(target_os = "linux")))]
fn signal_label(n: i32) -> String {
    format!("SIG{}", n)
}

#[cfg(not(unix))]
fn signal_name(_status: ExitStatus) -> String {
    "unknown signal".to_string()
}

/// Source of the `--help` text describing the options katex accepts.
pub trait HelpSource: Send + Sync {
    fn help_text(&self) -> Result<String, RenderError>;
}

/// The resolved katex command line, e.g. `["npx", "--no-install", "katex"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct KatexCommand {
    parts: Vec<String>,
}

impl KatexCommand {
    pub fn new(parts: Vec<String>) -> KatexCommand {
        KatexCommand { parts }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.parts[0]);
        command.args(&self.parts[1..]);
        command
    }

    fn missing(&self) -> RenderError {
        RenderError::Missing {
            searched: self.parts.join(" "),
        }
    }

    /// Run katex with `args` and wait for it to exit.
    pub fn invoke(&self, args: &[String]) -> Result<Outcome, RenderError> {
        let output = self
            .command()
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => self.missing(),
                _ => RenderError::Io(err),
            })?;
        Ok(Outcome::classify(output.status, &output))
    }

    /// Render the file at `input` into the file at `output`.
    pub fn render_file(
        &self,
        tex: &str,
        args: &[String],
        input: &Path,
        output: &Path,
    ) -> Result<(), RenderError> {
        let mut args = args.to_vec();
        args.push("--input".to_string());
        args.push(input.display().to_string());
        args.push("--output".to_string());
        args.push(output.display().to_string());
        self.invoke(&args)?.into_result(tex)
    }

    /// Pass the arguments through, inheriting stdio. Returns the exit code.
    pub fn passthrough(&self, args: &[String]) -> Result<i32, RenderError> {
        let status = self.command().args(args).status().map_err(|err| match err.kind() {
            ErrorKind::NotFound => self.missing(),
            _ => RenderError::Io(err),
        })?;
        Ok(status.code().unwrap_or(1))
    }

    fn probe_version(&self) -> bool {
        let Ok(output) = self.command().arg("--version").stdin(Stdio::null()).output() else {
            return false;
        };
        output.status.success() && VERSION_RE.is_match(combined_output(&output).trim())
    }
}

impl HelpSource for KatexCommand {
    fn help_text(&self) -> Result<String, RenderError> {
        let output = self
            .command()
            .arg("--help")
            .stdin(Stdio::null())
            .output()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => self.missing(),
                _ => RenderError::Io(err),
            })?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

fn env_paths() -> Vec<PathBuf> {
    let env_path: Option<OsString> = std::env::var_os("PATH");
    let mut paths: Vec<PathBuf> = env_path
        .as_ref()
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();
    // search in fallback bin dir regardless of PATH
    let fallback = PathBuf::from(FALLBACK_BIN_DIR);
    if !paths.contains(&fallback) {
        paths.push(fallback);
    }
    paths
}

fn local_bin_candidates() -> Vec<String> {
    if cfg!(windows) {
        vec![
            format!("{CMD_NAME}.cmd"),
            format!("{CMD_NAME}.exe"),
            format!("npx.cmd --no-install {CMD_NAME}"),
            format!("npx.exe --no-install {CMD_NAME}"),
            format!("{CMD_NAME}.ps1"),
            format!("npx.ps1 --no-install {CMD_NAME}"),
        ]
    } else {
        vec![CMD_NAME.to_string(), format!("npx --no-install {CMD_NAME}")]
    }
}

fn read_cached_command(cache_file: &Path) -> Option<KatexCommand> {
    let content = fs::read_to_string(cache_file).ok()?;
    let parts: Vec<String> = content.lines().map(|s| s.to_string()).collect();
    match parts.first() {
        Some(bin) if Path::new(bin).exists() => Some(KatexCommand::new(parts)),
        _ => None,
    }
}

/// Locate a working katex command.
///
/// The first candidate on `PATH` whose `--version` prints a version number
/// wins, and is remembered in [`LOCAL_CMD_CACHE`] so later runs skip probing.
pub fn discover(cache_dir: &Path) -> Result<KatexCommand, RenderError> {
    let cache_file = cache_dir.join(LOCAL_CMD_CACHE);
    if let Some(command) = read_cached_command(&cache_file) {
        return Ok(command);
    }

    let paths = env_paths();
    for path in &paths {
        for candidate in local_bin_candidates() {
            let mut parts: Vec<String> = candidate.split_whitespace().map(|s| s.to_string()).collect();
            let local_bin = path.join(&parts[0]);
            if !local_bin.is_file() {
                continue;
            }
            parts[0] = local_bin.display().to_string();

            let command = KatexCommand::new(parts);
            if !command.probe_version() {
                continue;
            }

            if let Err(err) = write_cached_command(&cache_file, &command) {
                color_print::ceprintln!(
                    "<y>Warning: failed to remember katex command in `{}`: {}</>",
                    cache_file.display(),
                    err
                );
            }
            return Ok(command);
        }
    }

    Err(RenderError::Missing {
        searched: paths.iter().map(|p| p.display()).join(", "),
    })
}

fn write_cached_command(cache_file: &Path, command: &KatexCommand) -> io::Result<()> {
    if let Some(parent) = cache_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(cache_file, command.parts().join("\n"))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::sh_command;
    use tempfile::TempDir;

    fn command(dir: &TempDir, body: &str) -> KatexCommand {
        sh_command(dir.path(), "fake-katex", body)
    }

    #[test]
    fn test_success() {
        let dir = TempDir::new().unwrap();
        let katex = command(&dir, "exit 0\n");
        assert_eq!(katex.invoke(&[]).unwrap(), Outcome::Success);
    }

    #[test]
    fn test_nonzero_exit_carries_output() {
        let dir = TempDir::new().unwrap();
        let katex = command(&dir, "echo partial\necho 'ParseError: boom' >&2\nexit 3\n");
        match katex.invoke(&[]).unwrap() {
            Outcome::Failed { code, output } => {
                assert_eq!(code, 3);
                assert_eq!(output, "partial\n\nParseError: boom");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_signal_is_named() {
        let dir = TempDir::new().unwrap();
        let katex = command(&dir, "kill -TERM $$\n");
        let outcome = katex.invoke(&[]).unwrap();
        assert_eq!(
            outcome,
            Outcome::Terminated {
                signal: signal_label(15)
            }
        );

        let err = outcome.into_result("x^2").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'x^2'"), "{message}");
        assert!(message.contains(&signal_label(15)), "{message}");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_signal_labels() {
        assert_eq!(signal_label(7), "SIGBUS");
        assert_eq!(signal_label(10), "SIGUSR1");
        assert_eq!(signal_label(15), "SIGTERM");
        assert_eq!(signal_label(31), "SIGSYS");
        assert_eq!(signal_label(34), "SIG34");
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    #[test]
    fn test_other_unix_signal_labels() {
        assert_eq!(signal_label(10), "SIG10");
        assert_eq!(signal_label(30), "SIG30");
    }

    #[test]
    fn test_missing_binary() {
        let katex = KatexCommand::new(vec!["/nonexistent/katex-binary".to_string()]);
        assert!(matches!(katex.invoke(&[]), Err(RenderError::Missing { .. })));
    }

    #[test]
    fn test_cached_command_is_reused() {
        let dir = TempDir::new().unwrap();
        let katex = command(&dir, "echo 0.16.9\n");
        let cache_file = dir.path().join(LOCAL_CMD_CACHE);
        write_cached_command(&cache_file, &katex).unwrap();

        assert_eq!(discover(dir.path()).unwrap(), katex);
        assert!(katex.probe_version());
    }

    #[test]
    fn test_stale_cached_command_is_ignored() {
        let dir = TempDir::new().unwrap();
        let cache_file = dir.path().join(LOCAL_CMD_CACHE);
        fs::write(&cache_file, "/nonexistent/katex-binary").unwrap();
        assert!(read_cached_command(&cache_file).is_none());
    }

    #[test]
    fn test_help_text() {
        let dir = TempDir::new().unwrap();
        let katex = command(&dir, "echo 'Options:'\necho '  --trust   Trust input'\n");
        assert!(katex.help_text().unwrap().contains("--trust"));
    }
}
