//! Simulator process runner.
//!
//! This module handles invoking the external simulator in batch mode against
//! a netlist on disk. Console output goes to `<stem>.out` beside the netlist,
//! clear of the `<stem>.log` LTspice writes itself; the rawfile is left where
//! the simulator puts it.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::config::{SimulatorConfig, SimulatorKind};
use crate::error::{Error, Result};

/// Lines of simulator output quoted in a failure message.
const LOG_TAIL_LINES: usize = 8;

/// Extension of the captured console output.
const CONSOLE_EXTENSION: &str = "out";

/// Windows `PATHEXT` when the variable is unset.
const DEFAULT_PATHEXT: &str = ".COM;.EXE;.BAT;.CMD";

/// Where the runner captures console output for `netlist`.
pub fn console_path(netlist: &Path) -> PathBuf {
    netlist.with_extension(CONSOLE_EXTENSION)
}

/// Files produced by one simulator invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    /// Where the simulator was told to write (or writes by convention) its rawfile.
    pub rawfile: PathBuf,
    /// Captured stdout and stderr.
    pub console: PathBuf,
    pub elapsed: Duration,
}

/// Something that turns a netlist on disk into a rawfile on disk.
pub trait Simulator {
    /// Short name for log messages.
    fn name(&self) -> &str;

    /// Run one netlist to completion.
    ///
    /// Does not check that the rawfile exists afterwards; reading it is a
    /// separate step.
    fn simulate(&self, netlist: &Path) -> Result<SimulationRun>;
}

/// Runs ngspice or LTspice as a child process.
#[derive(Debug, Clone)]
pub struct ProcessSimulator {
    config: SimulatorConfig,
}

impl ProcessSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    fn build_command(&self, executable: &Path, netlist: &Path, rawfile: &Path) -> Command {
        let mut cmd = Command::new(executable);
        match self.config.kind {
            // -b: batch mode, -r: write rawfile
            SimulatorKind::Ngspice => {
                cmd.arg("-b").arg("-r").arg(rawfile).arg(netlist);
            }
            // LTspice always writes <stem>.raw next to the netlist
            SimulatorKind::Ltspice => {
                cmd.arg("-b").arg(netlist);
            }
        }
        cmd
    }
}

impl Simulator for ProcessSimulator {
    fn name(&self) -> &str {
        &self.config.executable
    }

    fn simulate(&self, netlist: &Path) -> Result<SimulationRun> {
        let executable = resolve_executable(&self.config.executable)?;
        let rawfile = netlist.with_extension("raw");
        let console = console_path(netlist);

        let log_file = File::create(&console)?;
        let stderr_file = log_file.try_clone()?;

        let mut cmd = self.build_command(&executable, netlist, &rawfile);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(stderr_file));

        log::debug!("running {:?}", cmd);
        let start = Instant::now();
        let child = cmd
            .spawn()
            .map_err(|e| Error::SimulatorNotFound(format!("{}: {}", executable.display(), e)))?;

        let status = wait_with_timeout(child, Duration::from_secs(self.config.timeout_secs))?;
        let elapsed = start.elapsed();

        if !status.success() {
            return Err(Error::SimulationFailed(format!(
                "{} exited with {}\n{}",
                self.config.kind,
                status,
                log_tail(&console)
            )));
        }

        log::debug!(
            "{} finished {} in {:.2?}",
            self.config.kind,
            netlist.display(),
            elapsed
        );
        Ok(SimulationRun {
            rawfile,
            console,
            elapsed,
        })
    }
}

/// Locate the simulator executable.
///
/// A value containing a path separator must point at an existing file; a bare
/// name is searched for on `PATH`, with each `PATHEXT` suffix on Windows.
pub fn resolve_executable(executable: &str) -> Result<PathBuf> {
    let candidate = Path::new(executable);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return if candidate.is_file() {
            Ok(candidate.to_path_buf())
        } else {
            Err(Error::SimulatorNotFound(executable.to_string()))
        };
    }

    let extensions = executable_extensions(executable);
    std::env::var_os("PATH")
        .and_then(|paths| search_dirs(executable, std::env::split_paths(&paths), &extensions))
        .ok_or_else(|| Error::SimulatorNotFound(executable.to_string()))
}

/// Suffixes to try after a bare name. Empty outside Windows.
fn executable_extensions(executable: &str) -> Vec<String> {
    if !cfg!(windows) || Path::new(executable).extension().is_some() {
        return Vec::new();
    }
    std::env::var("PATHEXT")
        .unwrap_or_else(|_| DEFAULT_PATHEXT.to_string())
        .split(';')
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
        .collect()
}

/// First `dir/name` or `dir/name<ext>` that is a file, in directory order.
fn search_dirs(
    executable: &str,
    dirs: impl Iterator<Item = PathBuf>,
    extensions: &[String],
) -> Option<PathBuf> {
    dirs.flat_map(|dir| {
        let bare = dir.join(executable);
        std::iter::once(bare).chain(
            extensions
                .iter()
                .map(move |ext| dir.join(format!("{}{}", executable, ext))),
        )
    })
    .find(|path| path.is_file())
}

/// Check if the configured simulator can be found.
pub fn is_simulator_available(config: &SimulatorConfig) -> bool {
    resolve_executable(&config.executable).is_ok()
}

/// Wait for a child process with timeout, killing it on expiry.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<ExitStatus> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    // Reap so the process does not linger as a zombie.
                    let _ = child.wait();
                    return Err(Error::SimulationTimeout(timeout.as_secs()));
                }
                std::thread::sleep(poll_interval);
            }
            Err(e) => return Err(Error::SimulationFailed(e.to_string())),
        }
    }
}

/// Last few lines of the simulator log, for error messages.
fn log_tail(log: &Path) -> String {
    let Ok(content) = std::fs::read_to_string(log) else {
        return String::new();
    };
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(LOG_TAIL_LINES);
    lines[start..].join("\n")
}
