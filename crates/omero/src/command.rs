//! Connector command protocol.
//! （連接器指令協定。）
//!
//! The connector expects `<program> --user <u> --password <p> <command>`
//! followed by command specific flags. User, password and command are read
//! positionally, so that prefix must never change order.

use std::fmt;
use std::path::PathBuf;

use crate::credentials::Credentials;
use crate::node::TreeNodeId;

/// Placeholder written wherever the password would appear in diagnostics.
pub const REDACTED: &str = "[********]";

// Index of the password value within `CommandLine::args`.
const PASSWORD_ARG: usize = 3;

/// A request understood by the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCommand {
    CheckCredentials,
    RetrieveChildren { node: TreeNodeId },
    /// Fetch an image from OMERO into the local file store.
    OmeroToHrm { image_id: String, dest: PathBuf },
    /// Attach a local file to an OMERO dataset.
    HrmToOmero { file: PathBuf, dataset_id: String },
}

impl AdapterCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AdapterCommand::CheckCredentials => "checkCredentials",
            AdapterCommand::RetrieveChildren { .. } => "retrieveChildren",
            AdapterCommand::OmeroToHrm { .. } => "OMEROtoHRM",
            AdapterCommand::HrmToOmero { .. } => "HRMtoOMERO",
        }
    }

    /// Flag/value pairs following the command name, in wire order.
    pub fn params(&self) -> Vec<String> {
        match self {
            AdapterCommand::CheckCredentials => Vec::new(),
            AdapterCommand::RetrieveChildren { node } => vec!["--id".into(), node.key()],
            AdapterCommand::OmeroToHrm { image_id, dest } => vec![
                "--imageid".into(),
                image_id.clone(),
                "--dest".into(),
                dest.to_string_lossy().into_owned(),
            ],
            AdapterCommand::HrmToOmero { file, dataset_id } => vec![
                "--file".into(),
                file.to_string_lossy().into_owned(),
                "--dset".into(),
                dataset_id.clone(),
            ],
        }
    }
}

/// Fully assembled connector invocation.
///
/// Arguments are kept as separate values and handed to the process without a
/// shell. `Debug` and [`CommandLine::redacted`] never include the password.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn build(program: &str, credentials: &Credentials, command: &AdapterCommand) -> Self {
        let mut args = vec![
            "--user".to_string(),
            credentials.user().to_string(),
            "--password".to_string(),
            credentials.expose_secret().to_string(),
            command.name().to_string(),
        ];
        args.extend(command.params());
        Self {
            program: program.to_string(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Shell-quoted rendering with the password replaced by [`REDACTED`].
    pub fn redacted(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        for (index, arg) in self.args.iter().enumerate() {
            let rendered = match index {
                PASSWORD_ARG => REDACTED.to_string(),
                0 | 2 => arg.clone(),
                _ => shell_quote(arg),
            };
            parts.push(rendered);
        }
        parts.join(" ")
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandLine").field(&self.redacted()).finish()
    }
}

/// Quotes a value for a POSIX shell: wraps it in single quotes and turns
/// every embedded `'` into `'\''`.
pub fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}
