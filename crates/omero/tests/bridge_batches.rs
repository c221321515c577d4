use std::path::{Path, PathBuf};

use hrm_omero::testing::ScriptedAdapter;
use hrm_omero::{
    summarize, AdapterCommand, AdapterReply, BridgeError, Credentials, DownloadItem,
    FailureReason, OmeroBridge, TransferOutcome, TreeNodeId, UploadRequest, UserFolders,
};

fn folders() -> UserFolders {
    UserFolders::new("/data/ana/src", "/data/ana/dst")
}

fn connected(adapter: &ScriptedAdapter) -> OmeroBridge<&ScriptedAdapter> {
    let bridge = OmeroBridge::connect(adapter, Credentials::new("ana", "pw"));
    assert!(bridge.logged_in());
    adapter.clear_calls();
    bridge
}

fn listing_adapter() -> ScriptedAdapter {
    ScriptedAdapter::with_responder(|command| match command {
        AdapterCommand::RetrieveChildren { node } => AdapterReply::new(
            Some(0),
            vec![format!("[{{\"id\":\"{node}\","), "\"children\":[]}]".to_string()],
        ),
        _ => AdapterReply::new(Some(0), Vec::new()),
    })
}

#[test]
fn repeated_listing_is_served_from_cache() {
    let adapter = listing_adapter();
    let mut bridge = connected(&adapter);
    let node: TreeNodeId = "Dataset:23".parse().unwrap();

    let first = bridge.get_children(&node).map(str::to_string);
    assert_eq!(
        first.as_deref(),
        Some("[{\"id\":\"Dataset:23\", \"children\":[]}]")
    );
    let second = bridge.get_children(&node).map(str::to_string);
    assert_eq!(first, second);
    assert_eq!(
        adapter.calls(),
        vec![AdapterCommand::RetrieveChildren { node: node.clone() }]
    );
}

#[test]
fn reset_forces_one_fresh_fetch() {
    let adapter = listing_adapter();
    let mut bridge = connected(&adapter);
    let node = TreeNodeId::new("Project", 4);

    bridge.get_children(&node);
    bridge.reset_nodes();
    assert!(bridge.cache().is_empty());
    bridge.get_children(&node);
    bridge.get_children(&node);
    assert_eq!(adapter.call_count(), 2);
}

#[test]
fn failed_listing_is_not_cached() {
    let adapter = listing_adapter().fail_when(|command| {
        matches!(command, AdapterCommand::RetrieveChildren { node } if node.id() == 9)
    });
    let mut bridge = connected(&adapter);
    let node = TreeNodeId::new("Dataset", 9);

    assert!(bridge.get_children(&node).is_none());
    assert!(bridge.get_children(&node).is_none());
    assert!(!bridge.cache().contains(&node));
    assert_eq!(adapter.call_count(), 2);
}

#[test]
fn download_attempts_every_item_and_reports_each_side() {
    let adapter = ScriptedAdapter::succeeding().fail_when(|command| {
        matches!(command, AdapterCommand::OmeroToHrm { image_id, .. } if image_id == "Image:6")
    });
    let mut bridge = connected(&adapter);

    let report = bridge
        .download_from_omero(
            r#"[{"id":"Image:5","name":"a.tif"},{"id":"Image:6","name":"b.tif"}]"#,
            &folders(),
        )
        .unwrap();

    assert_eq!(
        summarize(&report),
        "Successfully retrieved Image:5. Failed retrieving Image:6."
    );
    assert_eq!(
        adapter.calls(),
        vec![
            AdapterCommand::OmeroToHrm {
                image_id: "Image:5".into(),
                dest: PathBuf::from("/data/ana/src/a.tif"),
            },
            AdapterCommand::OmeroToHrm {
                image_id: "Image:6".into(),
                dest: PathBuf::from("/data/ana/src/b.tif"),
            },
        ]
    );
}

#[test]
fn early_failures_do_not_stop_the_batch() {
    let failing = ["Image:1", "Image:2", "Image:4"];
    let adapter = ScriptedAdapter::succeeding().fail_when(move |command| {
        matches!(command, AdapterCommand::OmeroToHrm { image_id, .. } if failing.contains(&image_id.as_str()))
    });
    let mut bridge = connected(&adapter);
    let items: Vec<DownloadItem> = (1..=5)
        .map(|n| DownloadItem::new(format!("Image:{n}"), format!("img{n}.tif")))
        .collect();

    let report = bridge.download(&items, Path::new("/data/ana/src"));

    assert_eq!(adapter.call_count(), 5);
    assert_eq!(report.succeeded().collect::<Vec<_>>(), ["Image:3", "Image:5"]);
    assert_eq!(
        report.failed().collect::<Vec<_>>(),
        ["Image:1", "Image:2", "Image:4"]
    );
    assert_eq!(
        report.entries()[0].outcome,
        TransferOutcome::Failed(FailureReason::Connector { exit_code: Some(1) })
    );
}

#[test]
fn download_refuses_names_leaving_the_source_folder() {
    let adapter = ScriptedAdapter::succeeding();
    let mut bridge = connected(&adapter);
    let items = [
        DownloadItem::new("Image:1", "../../etc/cron.d/job"),
        DownloadItem::new("Image:2", "ok.tif"),
    ];

    let report = bridge.download(&items, Path::new("/data/ana/src"));

    assert_eq!(adapter.call_count(), 1);
    assert_eq!(
        report.entries()[0].outcome,
        TransferOutcome::Failed(FailureReason::UnsafePath)
    );
    assert_eq!(
        summarize(&report),
        "Successfully retrieved Image:2. Failed retrieving Image:1."
    );
}

#[test]
fn malformed_selection_runs_nothing() {
    let adapter = ScriptedAdapter::succeeding();
    let mut bridge = connected(&adapter);

    let err = bridge.download_from_omero("{oops", &folders()).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidSelection(_)));
    assert_eq!(adapter.call_count(), 0);
}

#[test]
fn upload_without_files_runs_nothing() {
    let adapter = listing_adapter();
    let mut bridge = connected(&adapter);
    let node = TreeNodeId::new("Dataset", 1);
    bridge.get_children(&node);
    adapter.clear_calls();

    let request = UploadRequest::new(Vec::new(), Some("Dataset:1".into()));
    let err = bridge.upload_to_omero(&request, &folders()).unwrap_err();

    assert_eq!(err.to_string(), "No files selected for upload.");
    assert_eq!(adapter.call_count(), 0);
    assert!(bridge.cache().contains(&node), "validation failure keeps the cache");
}

#[test]
fn upload_without_destination_runs_nothing() {
    let adapter = ScriptedAdapter::succeeding();
    let mut bridge = connected(&adapter);

    let request = UploadRequest::new(vec!["result.ics".into()], None);
    let err = bridge.upload_to_omero(&request, &folders()).unwrap_err();

    assert_eq!(err.to_string(), "No destination dataset selected.");
    assert_eq!(adapter.call_count(), 0);
}

#[test]
fn upload_exports_each_file_then_clears_the_cache() {
    let adapter = listing_adapter().fail_when(|command| {
        matches!(command, AdapterCommand::HrmToOmero { file, .. } if file.ends_with("broken.ics"))
    });
    let mut bridge = connected(&adapter);
    let node = TreeNodeId::new("Dataset", 3);
    bridge.get_children(&node);
    adapter.clear_calls();

    let request =
        UploadRequest::from_posted(r#"["good.ics","broken.ics"]"#, Some("Dataset:3")).unwrap();
    let report = bridge.upload_to_omero(&request, &folders()).unwrap();

    assert_eq!(
        summarize(&report),
        "Successfully uploaded good.ics. Failed uploading broken.ics."
    );
    assert_eq!(
        adapter.calls(),
        vec![
            AdapterCommand::HrmToOmero {
                file: PathBuf::from("/data/ana/dst/good.ics"),
                dataset_id: "Dataset:3".into(),
            },
            AdapterCommand::HrmToOmero {
                file: PathBuf::from("/data/ana/dst/broken.ics"),
                dataset_id: "Dataset:3".into(),
            },
        ]
    );
    assert!(bridge.cache().is_empty());

    adapter.clear_calls();
    bridge.get_children(&node);
    assert_eq!(adapter.call_count(), 1);
}

#[test]
fn upload_clears_cache_even_when_everything_fails() {
    let adapter = listing_adapter()
        .fail_when(|command| matches!(command, AdapterCommand::HrmToOmero { .. }));
    let mut bridge = connected(&adapter);
    bridge.get_children(&TreeNodeId::new("Project", 1));

    let request = UploadRequest::new(vec!["a.ics".into()], Some("Dataset:3".into()));
    let report = bridge.upload_to_omero(&request, &folders()).unwrap();

    assert!(!report.all_succeeded());
    assert!(bridge.cache().is_empty());
}

#[test]
fn every_call_carries_the_session_user() {
    let adapter = listing_adapter();
    let mut bridge = OmeroBridge::connect(&adapter, Credentials::new("ana", "pw"));
    bridge.get_children(&TreeNodeId::new("Project", 1));
    bridge.download(&[DownloadItem::new("Image:1", "a.tif")], Path::new("/tmp"));

    assert_eq!(adapter.users(), ["ana", "ana", "ana"]);
}
