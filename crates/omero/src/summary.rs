use crate::transfer::{TransferDirection, TransferReport};

/// Renders a batch result as the sentence shown to the user, e.g.
/// `Successfully retrieved Image:5. Failed retrieving Image:6.`
///
/// A side with no items is left out; an empty report renders as `""`.
pub fn summarize(report: &TransferReport) -> String {
    let (done_verb, failed_verb) = match report.direction() {
        TransferDirection::Download => ("Successfully retrieved", "Failed retrieving"),
        TransferDirection::Upload => ("Successfully uploaded", "Failed uploading"),
    };

    let mut sentences = Vec::with_capacity(2);
    let done: Vec<&str> = report.succeeded().collect();
    if !done.is_empty() {
        sentences.push(format!("{done_verb} {}.", done.join(" ")));
    }
    let failed: Vec<&str> = report.failed().collect();
    if !failed.is_empty() {
        sentences.push(format!("{failed_verb} {}.", failed.join(" ")));
    }
    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{FailureReason, TransferOutcome};

    fn failed() -> TransferOutcome {
        TransferOutcome::Failed(FailureReason::Connector { exit_code: Some(2) })
    }

    #[test]
    fn mixed_download_names_both_sides() {
        let mut report = TransferReport::new(TransferDirection::Download);
        report.record("Image:5", TransferOutcome::Succeeded);
        report.record("Image:6", failed());
        assert_eq!(
            summarize(&report),
            "Successfully retrieved Image:5. Failed retrieving Image:6."
        );
    }

    #[test]
    fn one_sided_reports_omit_the_other_sentence() {
        let mut report = TransferReport::new(TransferDirection::Upload);
        report.record("a.ics", TransferOutcome::Succeeded);
        report.record("b.ics", TransferOutcome::Succeeded);
        assert_eq!(summarize(&report), "Successfully uploaded a.ics b.ics.");

        let mut report = TransferReport::new(TransferDirection::Upload);
        report.record("a.ics", failed());
        assert_eq!(summarize(&report), "Failed uploading a.ics.");
    }

    #[test]
    fn empty_report_is_blank() {
        assert_eq!(summarize(&TransferReport::new(TransferDirection::Download)), "");
    }
}
