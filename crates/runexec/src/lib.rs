//! External command execution helper used to drive connector programs.
//! （提供外部指令執行的幫手，用於驅動連接器程式。）
//!
//! The executor wraps `std::process::Command` and never goes through a shell:
//! every argument is handed to the child verbatim, so metacharacters inside an
//! argument cannot change how the command is parsed. Output is captured in
//! full and exposed line by line.
//! 本模組封裝 `std::process::Command`，不經過 shell，每個參數原樣傳給子程序。

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Errors that may surface while preparing or executing a command.
/// （準備或執行指令時有可能發生的錯誤。）
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn process: {0}")]
    Spawn(std::io::Error),
    #[error("failed to read process output: {0}")]
    Output(std::io::Error),
    #[error("failed to poll process status: {0}")]
    Poll(std::io::Error),
    #[error("failed to terminate process: {0}")]
    Kill(std::io::Error),
}

/// Command specification.
/// （指令設定資料結構。）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
}

impl RunSpec {
    /// Creates a new command pointing at the given program.
    /// （以指定的程式建立指令設定。）
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout_ms: None,
        }
    }

    /// Adds multiple arguments at once.
    /// （一次加入多個參數。）
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Applies a timeout to the command execution. The child is killed once
    /// it is exceeded.
    /// （設定指令執行的逾時限制，逾時即終止子程序。）
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_millis().clamp(1, u128::from(u64::MAX)) as u64;
        self.timeout_ms = Some(millis);
        self
    }
}

/// Result information produced by a command execution.
/// （指令執行完成後的結果資訊。）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunResult {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
}

impl RunResult {
    /// Indicates whether the command exited successfully (code `0`).
    /// （判斷指令是否以 0 代表成功結束。）
    pub fn success(&self) -> bool {
        !self.timed_out && matches!(self.exit_code, Some(0))
    }

    /// Output lines of stdout followed by stderr, with trailing whitespace
    /// stripped from each line and trailing blank lines dropped.
    /// （依序回傳標準輸出與錯誤輸出的每一行。）
    pub fn combined_lines(&self) -> Vec<String> {
        let mut lines = split_lines(&self.stdout);
        lines.extend(split_lines(&self.stderr));
        lines
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Executes commands according to the provided specification.
/// （依照設定執行指令的主要元件。）
pub struct RunExecutor;

impl RunExecutor {
    /// Runs the provided command and captures output.
    /// （執行指定指令並擷取輸出。）
    pub fn execute(spec: &RunSpec) -> Result<RunResult, RunError> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.stdin(Stdio::null());

        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        let start = Instant::now();
        let mut child = command.spawn().map_err(RunError::Spawn)?;

        // Pipes are drained while the child runs so a chatty process never
        // stalls on a full pipe buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let timeout_duration = spec.timeout_ms.map(Duration::from_millis);
        let mut timed_out = false;
        let status = match timeout_duration {
            Some(timeout) => loop {
                if let Some(status) = child.try_wait().map_err(RunError::Poll)? {
                    break status;
                }
                if start.elapsed() >= timeout {
                    child.kill().map_err(RunError::Kill)?;
                    timed_out = true;
                    break child.wait().map_err(RunError::Poll)?;
                }
                thread::sleep(Duration::from_millis(15));
            },
            None => child.wait().map_err(RunError::Poll)?,
        };
        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;

        debug!(
            target: "hrm_runexec",
            exit_code = ?status.code(),
            duration_ms = start.elapsed().as_millis() as u64,
            timed_out,
            "process finished"
        );

        Ok(RunResult {
            exit_code: status.code(),
            stdout,
            stderr,
            timed_out,
        })
    }
}

type Reader = Option<JoinHandle<io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            pipe.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn collect(reader: Reader) -> Result<Vec<u8>, RunError> {
    match reader {
        Some(handle) => match handle.join() {
            Ok(result) => result.map_err(RunError::Output),
            Err(_) => Err(RunError::Output(io::Error::new(
                io::ErrorKind::Other,
                "output reader thread panicked",
            ))),
        },
        None => Ok(Vec::new()),
    }
}
