//! Typed interface to the external OMERO connector.
//! （外部 OMERO 連接器的型別化介面。）

use std::path::{Path, PathBuf};
use std::time::Duration;

use hrm_runexec::{RunError, RunExecutor, RunSpec};
use thiserror::Error;
use tracing::debug;

use crate::command::{AdapterCommand, CommandLine};
use crate::credentials::Credentials;
use crate::node::TreeNodeId;

/// Exit status and output captured from one connector run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterReply {
    pub exit_code: Option<i32>,
    pub lines: Vec<String>,
}

impl AdapterReply {
    pub fn new(exit_code: Option<i32>, lines: Vec<String>) -> Self {
        Self { exit_code, lines }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Output lines joined by single spaces.
    pub fn joined(&self) -> String {
        self.lines.join(" ")
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to run OMERO connector: {0}")]
    Run(#[from] RunError),
}

/// Seam between the bridge and whatever talks to the OMERO server.
///
/// Implementors provide [`OmeroAdapter::invoke`]; the typed helpers build the
/// matching [`AdapterCommand`]. Every call runs to completion before
/// returning. A non-zero exit is an `Ok` reply; `Err` means the connector
/// could not be run at all.
pub trait OmeroAdapter {
    fn invoke(
        &self,
        credentials: &Credentials,
        command: &AdapterCommand,
    ) -> Result<AdapterReply, AdapterError>;

    fn check_credentials(&self, credentials: &Credentials) -> Result<AdapterReply, AdapterError> {
        self.invoke(credentials, &AdapterCommand::CheckCredentials)
    }

    fn list_children(
        &self,
        credentials: &Credentials,
        node: &TreeNodeId,
    ) -> Result<AdapterReply, AdapterError> {
        self.invoke(
            credentials,
            &AdapterCommand::RetrieveChildren { node: node.clone() },
        )
    }

    fn transfer_in(
        &self,
        credentials: &Credentials,
        image_id: &str,
        dest: &Path,
    ) -> Result<AdapterReply, AdapterError> {
        self.invoke(
            credentials,
            &AdapterCommand::OmeroToHrm {
                image_id: image_id.to_string(),
                dest: dest.to_path_buf(),
            },
        )
    }

    fn transfer_out(
        &self,
        credentials: &Credentials,
        file: &Path,
        dataset_id: &str,
    ) -> Result<AdapterReply, AdapterError> {
        self.invoke(
            credentials,
            &AdapterCommand::HrmToOmero {
                file: file.to_path_buf(),
                dataset_id: dataset_id.to_string(),
            },
        )
    }
}

impl<A: OmeroAdapter + ?Sized> OmeroAdapter for &A {
    fn invoke(
        &self,
        credentials: &Credentials,
        command: &AdapterCommand,
    ) -> Result<AdapterReply, AdapterError> {
        (**self).invoke(credentials, command)
    }
}

/// Runs the connector program as a child process, one call per invocation.
/// （以子程序執行連接器程式。）
#[derive(Debug, Clone)]
pub struct ProcessAdapter {
    program: String,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessAdapter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            working_dir: None,
            timeout: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Kills the connector once `timeout` elapses; the run then counts as failed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl OmeroAdapter for ProcessAdapter {
    fn invoke(
        &self,
        credentials: &Credentials,
        command: &AdapterCommand,
    ) -> Result<AdapterReply, AdapterError> {
        let line = CommandLine::build(&self.program, credentials, command);
        debug!(target: "omero", "> {}", line.redacted());

        let mut spec = RunSpec::new(line.program()).with_args(line.args().iter().cloned());
        if let Some(dir) = &self.working_dir {
            spec = spec.with_working_dir(dir);
        }
        if let Some(timeout) = self.timeout {
            spec = spec.with_timeout(timeout);
        }

        let result = RunExecutor::execute(&spec)?;
        let exit_code = if result.timed_out {
            None
        } else {
            result.exit_code
        };
        Ok(AdapterReply::new(exit_code, result.combined_lines()))
    }
}
