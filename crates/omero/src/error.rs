use std::fmt;

use thiserror::Error;

/// Login field reported when credentials are incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    User,
    Password,
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialField::User => f.write_str("user name"),
            CredentialField::Password => f.write_str("password"),
        }
    }
}

/// Failures reported before any connector invocation takes place.
/// （在呼叫連接器之前即可偵測的錯誤。）
///
/// The `Display` text of the validation variants is shown to end users as is.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("No OMERO {0} provided, cannot login.")]
    MissingCredential(CredentialField),
    #[error("No files selected for upload.")]
    NoFilesSelected,
    #[error("No destination dataset selected.")]
    NoDestination,
    #[error("Invalid image selection: {0}")]
    InvalidSelection(#[source] serde_json::Error),
}
