//! Batch transfer requests and per-item results.
//! （批次傳輸的請求與逐項結果。）

use serde::Deserialize;

use crate::error::BridgeError;

/// An image picked in the OMERO tree for retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadItem {
    pub id: String,
    pub name: String,
}

impl DownloadItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Parses the JSON selection posted by the tree browser,
    /// e.g. `[{"id":"Image:5","name":"a.tif"}]`.
    pub fn parse_selection(json: &str) -> Result<Vec<Self>, BridgeError> {
        serde_json::from_str(json).map_err(BridgeError::InvalidSelection)
    }
}

/// Result files to export and the dataset receiving them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadRequest {
    pub files: Vec<String>,
    pub dataset_id: Option<String>,
}

impl UploadRequest {
    pub fn new(files: Vec<String>, dataset_id: Option<String>) -> Self {
        Self { files, dataset_id }
    }

    /// Builds a request from the file browser form: a JSON array of file
    /// names plus the optional dataset field.
    pub fn from_posted(selected_files: &str, dataset_id: Option<&str>) -> Result<Self, BridgeError> {
        let files: Vec<String> =
            serde_json::from_str(selected_files).map_err(BridgeError::InvalidSelection)?;
        Ok(Self::new(files, dataset_id.map(str::to_string)))
    }

    /// Checks the preconditions that must hold before the connector is run.
    pub fn validate(&self) -> Result<&str, BridgeError> {
        if self.files.is_empty() {
            return Err(BridgeError::NoFilesSelected);
        }
        match self.dataset_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(BridgeError::NoDestination),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Download,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The connector ran and reported failure; `None` when it was killed.
    Connector { exit_code: Option<i32> },
    /// The connector could not be started.
    Launch,
    /// The name would resolve outside the user's folder.
    UnsafePath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Succeeded,
    Failed(FailureReason),
}

/// One item of a batch and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEntry {
    pub label: String,
    pub outcome: TransferOutcome,
}

impl TransferEntry {
    pub fn succeeded(&self) -> bool {
        self.outcome == TransferOutcome::Succeeded
    }
}

/// Ordered per-item results of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    direction: TransferDirection,
    entries: Vec<TransferEntry>,
}

impl TransferReport {
    pub fn new(direction: TransferDirection) -> Self {
        Self {
            direction,
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, label: impl Into<String>, outcome: TransferOutcome) {
        self.entries.push(TransferEntry {
            label: label.into(),
            outcome,
        });
    }

    pub fn direction(&self) -> TransferDirection {
        self.direction
    }

    pub fn entries(&self) -> &[TransferEntry] {
        &self.entries
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| entry.succeeded())
            .map(|entry| entry.label.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| !entry.succeeded())
            .map(|entry| entry.label.as_str())
    }

    pub fn all_succeeded(&self) -> bool {
        self.entries.iter().all(TransferEntry::succeeded)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tree_selection() {
        let items = DownloadItem::parse_selection(
            r#"[{"id":"Image:5","name":"a.tif"},{"id":"Image:6","name":"b.tif"}]"#,
        )
        .unwrap();
        assert_eq!(
            items,
            vec![
                DownloadItem::new("Image:5", "a.tif"),
                DownloadItem::new("Image:6", "b.tif"),
            ]
        );
    }

    #[test]
    fn malformed_selection_is_rejected() {
        assert!(matches!(
            DownloadItem::parse_selection(r#"[{"id":"Image:5"}]"#),
            Err(BridgeError::InvalidSelection(_))
        ));
        assert!(DownloadItem::parse_selection("not json").is_err());
    }

    #[test]
    fn upload_validation_order() {
        let empty = UploadRequest::new(Vec::new(), None);
        assert!(matches!(empty.validate(), Err(BridgeError::NoFilesSelected)));

        let no_dataset = UploadRequest::new(vec!["r.ics".into()], None);
        assert!(matches!(no_dataset.validate(), Err(BridgeError::NoDestination)));

        let blank_dataset = UploadRequest::new(vec!["r.ics".into()], Some("  ".into()));
        assert!(matches!(blank_dataset.validate(), Err(BridgeError::NoDestination)));

        let ok = UploadRequest::from_posted(r#"["r.ics"]"#, Some("Dataset:3")).unwrap();
        assert_eq!(ok.validate().unwrap(), "Dataset:3");
    }

    #[test]
    fn report_splits_successes_and_failures_in_order() {
        let mut report = TransferReport::new(TransferDirection::Download);
        report.record("Image:1", TransferOutcome::Succeeded);
        report.record(
            "Image:2",
            TransferOutcome::Failed(FailureReason::Connector { exit_code: Some(1) }),
        );
        report.record("Image:3", TransferOutcome::Succeeded);

        assert_eq!(report.succeeded().collect::<Vec<_>>(), ["Image:1", "Image:3"]);
        assert_eq!(report.failed().collect::<Vec<_>>(), ["Image:2"]);
        assert!(!report.all_succeeded());
        assert_eq!(report.len(), 3);
    }
}
