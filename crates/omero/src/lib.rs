//! Bridge between the Huygens Remote Manager and an OMERO server.
//! 連接 Huygens Remote Manager 與 OMERO 伺服器的橋接模組。
//!
//! All traffic goes through an external connector program (see
//! [`ProcessAdapter`]). [`OmeroBridge`] adds the login check, a cache of tree
//! listings, and best-effort batch transfers on top of it.

mod cache;
mod command;
mod credentials;
mod error;
mod folders;
mod node;
mod summary;
mod transfer;

pub mod adapter;
pub mod bridge;
pub mod testing;

pub use adapter::{AdapterError, AdapterReply, OmeroAdapter, ProcessAdapter};
pub use bridge::{OmeroBridge, SessionState};
pub use cache::ChildListingCache;
pub use command::{shell_quote, AdapterCommand, CommandLine, REDACTED};
pub use credentials::Credentials;
pub use error::{BridgeError, CredentialField};
pub use folders::{confined_join, UserFolders};
pub use node::{NodeIdError, TreeNodeId};
pub use summary::summarize;
pub use transfer::{
    DownloadItem, FailureReason, TransferDirection, TransferEntry, TransferOutcome,
    TransferReport, UploadRequest,
};
