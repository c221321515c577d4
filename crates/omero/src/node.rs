use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Identifies a container or item in the OMERO tree, e.g. `Dataset:23`.
/// （OMERO 樹狀結構中的節點識別碼。）
///
/// The `Kind:Id` text form is used both as the listing cache key and as the
/// `--id` argument handed to the connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeNodeId {
    kind: String,
    id: u64,
}

impl TreeNodeId {
    pub fn new(kind: impl Into<String>, id: u64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Serialized `Kind:Id` form.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TreeNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeIdError {
    #[error("node id '{0}' must have the form Kind:Id")]
    MissingSeparator(String),
    #[error("node id '{0}' has an empty kind")]
    EmptyKind(String),
    #[error("node id '{0}' has a kind containing whitespace")]
    InvalidKind(String),
    #[error("node id '{0}' does not end in a numeric id")]
    InvalidId(String),
}

impl FromStr for TreeNodeId {
    type Err = NodeIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, id) = value
            .split_once(':')
            .ok_or_else(|| NodeIdError::MissingSeparator(value.to_string()))?;
        if kind.is_empty() {
            return Err(NodeIdError::EmptyKind(value.to_string()));
        }
        if kind.chars().any(char::is_whitespace) {
            return Err(NodeIdError::InvalidKind(value.to_string()));
        }
        let id = id
            .parse::<u64>()
            .map_err(|_| NodeIdError::InvalidId(value.to_string()))?;
        Ok(Self::new(kind, id))
    }
}
