//! Per-session bridge to the OMERO server.
//! （每個使用者工作階段對應一個 OMERO 橋接器。）
//!
//! A bridge is built for one authenticated HRM user and lives as long as that
//! user's session. Construction checks the credentials once; afterwards the
//! bridge answers tree listings from its cache where possible and runs
//! transfers item by item. All connector calls are blocking and sequential.

use std::path::Path;

use tracing::{error, info, warn};

use crate::adapter::{AdapterError, AdapterReply, OmeroAdapter};
use crate::cache::ChildListingCache;
use crate::credentials::Credentials;
use crate::error::BridgeError;
use crate::folders::{confined_join, UserFolders};
use crate::node::TreeNodeId;
use crate::transfer::{
    DownloadItem, FailureReason, TransferDirection, TransferOutcome, TransferReport, UploadRequest,
};

/// Login state of a bridge. `Authenticated` and `Unauthenticated` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    CredentialCheckPending,
    Authenticated,
    Unauthenticated,
}

pub struct OmeroBridge<A> {
    adapter: A,
    credentials: Credentials,
    state: SessionState,
    children: ChildListingCache,
}

impl<A: OmeroAdapter> OmeroBridge<A> {
    /// Creates the bridge and verifies the credentials with the connector.
    ///
    /// Incomplete credentials leave the bridge unauthenticated without
    /// running the connector. A rejected login is final for this bridge;
    /// build a new one to try again.
    pub fn connect(adapter: A, credentials: Credentials) -> Self {
        let mut bridge = Self {
            adapter,
            credentials,
            state: SessionState::Uninitialized,
            children: ChildListingCache::new(),
        };
        bridge.check_credentials();
        bridge
    }

    fn check_credentials(&mut self) {
        if let Err(err) = self.credentials.validate() {
            warn!(target: "omero", "{err}");
            self.state = SessionState::Unauthenticated;
            return;
        }

        self.state = SessionState::CredentialCheckPending;
        info!(target: "omero", user = self.credentials.user(), "attempting to log on to OMERO");
        self.state = match self.adapter.check_credentials(&self.credentials) {
            Ok(reply) if reply.success() => {
                info!(target: "omero", user = self.credentials.user(), "successfully connected to OMERO");
                SessionState::Authenticated
            }
            Ok(reply) => {
                error!(
                    target: "omero",
                    exit_code = ?reply.exit_code,
                    "checkCredentials(): {}",
                    reply.joined()
                );
                SessionState::Unauthenticated
            }
            Err(err) => {
                error!(target: "omero", "checkCredentials(): {err}");
                SessionState::Unauthenticated
            }
        };
    }

    pub fn logged_in(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn user(&self) -> &str {
        self.credentials.user()
    }

    pub fn cache(&self) -> &ChildListingCache {
        &self.children
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Returns the raw child listing of `node`, fetching it on a cache miss.
    ///
    /// `None` means the connector failed; nothing is cached in that case so a
    /// later call tries again.
    pub fn get_children(&mut self, node: &TreeNodeId) -> Option<&str> {
        if !self.children.contains(node) {
            match self.adapter.list_children(&self.credentials, node) {
                Ok(reply) if reply.success() => self.children.insert(node, reply.joined()),
                Ok(reply) => {
                    error!(
                        target: "omero",
                        node = %node,
                        exit_code = ?reply.exit_code,
                        "getChildren(): {}",
                        reply.joined()
                    );
                    return None;
                }
                Err(err) => {
                    error!(target: "omero", node = %node, "getChildren(): {err}");
                    return None;
                }
            }
        }
        self.children.get(node)
    }

    /// Drops every cached listing so the tree is re-read from OMERO.
    pub fn reset_nodes(&mut self) {
        self.children.invalidate_all();
    }

    /// Retrieves each image into `destination_root/<name>`.
    ///
    /// Every item is attempted; a failure never stops the batch.
    pub fn download(&mut self, items: &[DownloadItem], destination_root: &Path) -> TransferReport {
        let mut report = TransferReport::new(TransferDirection::Download);
        for item in items {
            let Some(dest) = confined_join(destination_root, &item.name) else {
                warn!(
                    target: "omero",
                    image = %item.id,
                    name = %item.name,
                    "refusing to write outside the user folder"
                );
                report.record(&item.id, TransferOutcome::Failed(FailureReason::UnsafePath));
                continue;
            };

            info!(target: "omero", "requesting {} to {}", item.id, dest.display());
            let result = self.adapter.transfer_in(&self.credentials, &item.id, &dest);
            let outcome = transfer_outcome(result, "downloadFromOMERO");
            match outcome {
                TransferOutcome::Succeeded => {
                    info!(target: "omero", "successfully retrieved {}", item.id)
                }
                TransferOutcome::Failed(_) => warn!(target: "omero", "failed retrieving {}", item.id),
            }
            report.record(&item.id, outcome);
        }
        report
    }

    /// Parses the tree browser selection and retrieves it into the user's
    /// source folder.
    pub fn download_from_omero(
        &mut self,
        selection: &str,
        folders: &UserFolders,
    ) -> Result<TransferReport, BridgeError> {
        let items = DownloadItem::parse_selection(selection).map_err(|err| {
            warn!(target: "omero", "{err}");
            err
        })?;
        Ok(self.download(&items, &folders.source))
    }

    /// Attaches each file under `source_root` to the requested dataset.
    ///
    /// Nothing is run when the request is incomplete. Otherwise every file is
    /// attempted and the listing cache is cleared afterwards, whatever the
    /// individual outcomes.
    pub fn upload(
        &mut self,
        request: &UploadRequest,
        source_root: &Path,
    ) -> Result<TransferReport, BridgeError> {
        let dataset_id = request.validate().map_err(|err| {
            info!(target: "omero", "{err}");
            err
        })?;

        let mut report = TransferReport::new(TransferDirection::Upload);
        for file in &request.files {
            let Some(path) = confined_join(source_root, file) else {
                warn!(target: "omero", file = %file, "refusing to read outside the user folder");
                report.record(file, TransferOutcome::Failed(FailureReason::UnsafePath));
                continue;
            };

            info!(target: "omero", "uploading \"{}\" to dataset {}", path.display(), dataset_id);
            let result = self.adapter.transfer_out(&self.credentials, &path, dataset_id);
            let outcome = transfer_outcome(result, "uploadToOMERO");
            match outcome {
                TransferOutcome::Succeeded => {
                    info!(target: "omero", "success uploading file to OMERO: {file}")
                }
                TransferOutcome::Failed(_) => {
                    warn!(target: "omero", "failed uploading file to OMERO: {file}")
                }
            }
            report.record(file, outcome);
        }

        self.reset_nodes();
        Ok(report)
    }

    /// Uploads results from the user's destination folder.
    pub fn upload_to_omero(
        &mut self,
        request: &UploadRequest,
        folders: &UserFolders,
    ) -> Result<TransferReport, BridgeError> {
        self.upload(request, &folders.destination)
    }
}

fn transfer_outcome(result: Result<AdapterReply, AdapterError>, operation: &str) -> TransferOutcome {
    match result {
        Ok(reply) if reply.success() => TransferOutcome::Succeeded,
        Ok(reply) => {
            error!(
                target: "omero",
                exit_code = ?reply.exit_code,
                "{operation}(): {}",
                reply.joined()
            );
            TransferOutcome::Failed(FailureReason::Connector {
                exit_code: reply.exit_code,
            })
        }
        Err(err) => {
            error!(target: "omero", "{operation}(): {err}");
            TransferOutcome::Failed(FailureReason::Launch)
        }
    }
}
