// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Bytes};
use std::time::Duration;
use tracing_test::traced_test;
use tvr_evm_helpers::contracts::{ReportRecord, ReportsRead};
use tvr_reports::{
    format_severity, status::StatusKind, DraftReport, FlowError, ReportStore, Session,
    SessionOptions, SubmissionPhase, VerificationFlow, VerificationSource,
};
use tvr_test_helpers::{
    contract_address, local_stack, reporter_address, InMemoryReports, LocalStack, TestClient,
};

type TestSession = Session<InMemoryReports, TestClient>;

fn draft() -> DraftReport {
    DraftReport {
        license_plate: "ABC-123".into(),
        location: "Main St".into(),
        severity: "7".into(),
        reference_hash: "0xdeadbeef".into(),
    }
}

fn session(stack: &LocalStack) -> TestSession {
    Session::new(
        stack.contract.clone(),
        stack.client.clone(),
        SessionOptions::default(),
    )
}

async fn submit(session: &TestSession, draft: DraftReport) -> Result<String, FlowError> {
    session.open_form();
    session.edit_form(draft);
    session.submit().await.map(|r| r.report_id)
}

fn seeded(id: &str, verified: bool) -> ReportRecord {
    ReportRecord {
        id: id.to_string(),
        license_plate: "XYZ-999".into(),
        location: "Harbor Road".into(),
        reference_hash: "case-9".into(),
        public_value_1: 9,
        public_value_2: 0,
        timestamp: 1_000,
        creator: Address::repeat_byte(9),
        is_verified: verified,
        decrypted_severity: if verified { 4 } else { 0 },
    }
}

#[tokio::test]
async fn test_unknown_ids_are_not_found_and_never_shown() {
    let stack = local_stack();
    let session = session(&stack);
    submit(&session, draft()).await.unwrap();

    assert!(matches!(
        stack.contract.get_record("violation-0-beef").await,
        Err(tvr_evm_helpers::GatewayError::NotFound(_))
    ));
    let state = session.snapshot();
    assert!(state.report("violation-0-beef").is_none());
    assert_eq!(state.reports.len(), 1);
}

#[tokio::test]
async fn test_incomplete_draft_never_reaches_encryption() {
    let stack = local_stack();
    let session = session(&stack);
    let blanks = [
        DraftReport {
            license_plate: "".into(),
            ..draft()
        },
        DraftReport {
            location: " ".into(),
            ..draft()
        },
        DraftReport {
            severity: "".into(),
            ..draft()
        },
        DraftReport {
            reference_hash: "".into(),
            ..draft()
        },
    ];

    for blank in blanks {
        let result = submit(&session, blank.clone()).await;
        assert!(matches!(result, Err(FlowError::Validation(_))));
        let form = session.snapshot().form.unwrap();
        assert_eq!(form.draft, blank);
        assert_eq!(form.phase, SubmissionPhase::Failed);
    }

    assert_eq!(stack.client.encrypt_calls(), 0);
    assert_eq!(
        InMemoryReports::count(&stack.contract.counts().create_record),
        0
    );
}

#[tokio::test]
async fn test_out_of_range_severity_is_rejected() {
    let stack = local_stack();
    let session = session(&stack);
    let result = submit(
        &session,
        DraftReport {
            severity: "eleven".into(),
            ..draft()
        },
    )
    .await;
    assert!(matches!(result, Err(FlowError::Validation(_))));
    assert_eq!(stack.client.encrypt_calls(), 0);
}

#[tokio::test]
async fn test_successful_submission_adds_one_unverified_report() -> anyhow::Result<()> {
    let stack = local_stack();
    stack.contract.seed(seeded("violation-1-0001", false), Bytes::new());
    let session = session(&stack);
    assert!(session.refresh().await);
    let before = session.snapshot().stats.total;

    let id = submit(&session, draft()).await?;

    let state = session.snapshot();
    assert_eq!(state.stats.total, before + 1);
    let report = state.report(&id).expect("new report is listed");
    assert!(!report.is_verified);
    assert_eq!(report.revealed_severity, None);
    assert_eq!(report.license_plate, "ABC-123");
    assert_eq!(report.public_value_1, 0xdeadbeef);
    assert_eq!(report.creator, reporter_address());
    assert_eq!(state.stats.last_24h, 1);

    // Form closed and draft reset
    assert!(state.form.is_none());
    session.open_form();
    assert_eq!(session.snapshot().form.unwrap().draft, DraftReport::default());

    let banner = state.status.unwrap().status;
    assert_eq!(banner.kind, StatusKind::Success);
    Ok(())
}

#[tokio::test]
async fn test_rejected_encryption_keeps_draft() {
    let stack = local_stack();
    let session = session(&stack);
    stack.client.reject_next_encryption();

    let result = submit(&session, draft()).await;
    assert_eq!(result, Err(FlowError::RejectedByUser));

    let state = session.snapshot();
    let form = state.form.unwrap();
    assert_eq!(form.draft, draft());
    assert_eq!(form.error.as_deref(), Some("Transaction rejected by user"));
    let banner = state.status.unwrap().status;
    assert_eq!(banner.kind, StatusKind::Error);
    assert_eq!(banner.message, "Transaction rejected by user");
}

#[tokio::test]
async fn test_rejected_transaction_is_typed() {
    let stack = local_stack();
    let session = session(&stack);
    stack.contract.reject_next_write();

    let result = submit(&session, draft()).await;
    assert_eq!(result, Err(FlowError::RejectedByUser));
    assert_eq!(stack.client.encrypt_calls(), 1);
    assert_eq!(session.snapshot().form.unwrap().draft, draft());
}

#[tokio::test]
async fn test_verifying_verified_report_skips_protocol() {
    let stack = local_stack();
    stack.contract.seed(seeded("violation-1-0001", true), Bytes::new());
    let session = session(&stack);
    session.refresh().await;

    let severity = session.verify("violation-1-0001").await.unwrap();
    assert_eq!(severity, 4);
    assert_eq!(stack.client.verification_calls(), 0);
    assert_eq!(
        InMemoryReports::count(&stack.contract.counts().proof_submissions),
        0
    );
    assert_eq!(session.snapshot().detail.unwrap().revealed, Some(4));
}

#[tokio::test]
async fn test_submit_then_verify_displays_police_verified() -> anyhow::Result<()> {
    let stack = local_stack();
    let session = session(&stack);
    let id = submit(&session, draft()).await?;

    let severity = session.verify(&id).await?;
    assert_eq!(severity, 7);

    let state = session.snapshot();
    let report = state.report(&id).unwrap();
    assert!(report.is_verified);
    assert_eq!(report.severity_label().as_deref(), Some("7/10 (Police Verified)"));
    assert_eq!(state.stats.verified, 1);
    assert_eq!(
        state.status.unwrap().status.message,
        format!("Severity revealed: {}", format_severity(7))
    );
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_concurrent_verification_publishes_once() -> anyhow::Result<()> {
    let stack = local_stack();
    let session = session(&stack);
    let id = submit(&session, draft()).await?;

    let (a, b) = tokio::join!(session.verify(&id), session.verify(&id));
    assert_eq!(a?, 7);
    assert_eq!(b?, 7);

    let counts = stack.contract.counts();
    assert_eq!(InMemoryReports::count(&counts.proof_submissions), 2);
    assert_eq!(InMemoryReports::count(&counts.verifications_applied), 1);
    assert!(logs_contain("verified concurrently"));

    let report = stack.contract.record(&id).unwrap();
    assert!(report.is_verified);
    assert_eq!(report.decrypted_severity, 7);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_flows_report_their_source() -> anyhow::Result<()> {
    let stack = local_stack();
    let session = session(&stack);
    let id = submit(&session, draft()).await?;

    let flow = VerificationFlow::new(stack.contract.clone(), stack.client.clone());
    let (a, b) = tokio::join!(
        flow.verify(&id, None, |_| {}),
        flow.verify(&id, None, |_| {})
    );
    let mut sources = vec![a?.source, b?.source];
    sources.sort_by_key(|s| *s as u8);
    assert_eq!(
        sources,
        vec![VerificationSource::Published, VerificationSource::Concurrent]
    );
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_reverted_verification_keeps_report_unverified() -> anyhow::Result<()> {
    let stack = local_stack();
    let session = session(&stack);
    let id = submit(&session, draft()).await?;

    stack.contract.revert_next_verification();
    let Err(FlowError::Chain(message)) = session.verify(&id).await else {
        anyhow::bail!("expected a chain error");
    };
    assert!(message.ends_with("reverted"));
    assert!(!stack.contract.record(&id).unwrap().is_verified);
    assert!(logs_contain("Verification transaction reverted"));
    assert!(!logs_contain("verified concurrently"));

    assert_eq!(session.verify(&id).await?, 7);
    Ok(())
}

#[tokio::test]
async fn test_losing_verification_race_reads_winner_value() -> anyhow::Result<()> {
    let stack = local_stack();
    let session = session(&stack);
    let id = submit(&session, draft()).await?;

    // Both proofs are accepted at send time, the second one reverts when mined
    stack.contract.pause_mining();
    let flow = VerificationFlow::new(stack.contract.clone(), stack.client.clone());
    let (a, b, _) = tokio::join!(
        flow.verify(&id, None, |_| {}),
        flow.verify(&id, None, |_| {}),
        async {
            while InMemoryReports::count(&stack.contract.counts().proof_submissions) < 2 {
                tokio::task::yield_now().await;
            }
            stack.contract.resume_mining();
        }
    );
    let (a, b) = (a?, b?);
    assert_eq!((a.severity, b.severity), (7, 7));
    assert_ne!(a.source, b.source);

    let counts = stack.contract.counts();
    assert_eq!(InMemoryReports::count(&counts.proof_submissions), 2);
    assert_eq!(InMemoryReports::count(&counts.verifications_applied), 1);
    Ok(())
}

#[tokio::test]
async fn test_forged_proof_is_rejected() {
    let stack = local_stack();
    let session = session(&stack);
    let id = submit(&session, draft()).await.unwrap();

    // A verifier the contract does not trust
    let rogue = InMemoryReports::new(
        contract_address(),
        reporter_address(),
        Address::repeat_byte(0x01),
    );
    let record = stack.contract.record(&id).unwrap();
    let handle = stack.contract.get_ciphertext_handle(&id).await.unwrap();
    rogue.seed(record, handle.0);

    let rogue = std::sync::Arc::new(rogue);
    let flow = VerificationFlow::new(rogue.clone(), stack.client.clone());
    let result = flow.verify(&id, None, |_| {}).await;
    assert!(matches!(result, Err(FlowError::Verification(_))));
    assert!(!rogue.record(&id).unwrap().is_verified);
}

#[tokio::test]
#[traced_test]
async fn test_refresh_skips_failing_records() {
    let stack = local_stack();
    stack.contract.seed(seeded("violation-1-0001", false), Bytes::new());
    stack.contract.seed(seeded("violation-2-0002", true), Bytes::new());
    stack.contract.seed(seeded("violation-3-0003", false), Bytes::new());
    stack.contract.fail_record("violation-2-0002");

    let store = ReportStore::new(stack.contract.clone());
    let snapshot = store.refresh().await.unwrap();
    let ids: Vec<_> = snapshot.reports.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["violation-1-0001", "violation-3-0003"]);
    assert_eq!(snapshot.skipped, vec!["violation-2-0002".to_string()]);
    assert_eq!(snapshot.stats.total, 2);
    assert_eq!(snapshot.stats.verified, 0);
    assert_eq!(
        InMemoryReports::count(&stack.contract.counts().get_record),
        3
    );
    assert!(logs_contain("Skipping report"));
}

#[tokio::test]
async fn test_failed_id_listing_keeps_last_reports() {
    let stack = local_stack();
    stack.contract.seed(seeded("violation-1-0001", false), Bytes::new());
    let session = session(&stack);
    assert!(session.refresh().await);

    stack.contract.set_offline(true);
    assert!(!session.refresh().await);

    let state = session.snapshot();
    assert_eq!(state.reports.len(), 1);
    assert!(!state.loading);
    let banner = state.status.unwrap().status;
    assert_eq!(banner.kind, StatusKind::Error);
    assert!(banner.message.starts_with("Failed to load reports"));
}

#[tokio::test]
async fn test_search_filters_and_empty_grid() {
    let stack = local_stack();
    stack.contract.seed(seeded("violation-1-0001", false), Bytes::new());
    let session = session(&stack);
    submit(&session, draft()).await.unwrap();

    session.set_search("abc");
    assert_eq!(session.snapshot().visible_reports().len(), 1);
    session.set_search("HARBOR");
    let state = session.snapshot();
    let visible = state.visible_reports();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].license_plate, "XYZ-999");
    session.set_search("nowhere");
    assert!(session.snapshot().visible_reports().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_banners_expire() {
    let stack = local_stack();
    let session = session(&stack);
    stack.contract.set_offline(true);
    session.refresh().await;
    assert!(session.snapshot().status.is_some());

    tokio::time::sleep(Duration::from_millis(2_900)).await;
    assert!(session.snapshot().status.is_some());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(session.snapshot().status.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_success_banner_expires_after_two_seconds() -> anyhow::Result<()> {
    let stack = local_stack();
    let session = session(&stack);
    submit(&session, draft()).await?;
    let banner = session.snapshot().status.unwrap().status;
    assert_eq!(banner.kind, StatusKind::Success);
    assert_eq!(banner.message, "Report submitted successfully!");

    tokio::time::sleep(Duration::from_millis(1_900)).await;
    assert!(session.snapshot().status.is_some());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(session.snapshot().status.is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_pending_banner_never_expires() -> anyhow::Result<()> {
    let stack = local_stack();
    let session = session(&stack);
    session.open_form();
    session.edit_form(draft());
    stack.contract.pause_mining();

    let (result, _) = tokio::join!(session.submit(), async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        let banner = session.snapshot().status.unwrap().status;
        assert_eq!(banner.kind, StatusKind::Pending);
        assert_eq!(banner.message, "Waiting for confirmation...");
        stack.contract.resume_mining();
    });
    result?;
    assert_eq!(
        session.snapshot().status.unwrap().status.kind,
        StatusKind::Success
    );
    Ok(())
}

#[tokio::test]
async fn test_late_submission_result_after_close() -> anyhow::Result<()> {
    let stack = local_stack();
    let session = session(&stack);
    session.open_form();
    session.edit_form(draft());

    // The submission parks on confirmation while the form is closed and reopened
    let (result, _) = tokio::join!(session.submit(), async {
        session.close_form();
        session.open_form();
    });
    result?;

    let state = session.snapshot();
    let form = state.form.unwrap();
    assert_eq!(form.draft, DraftReport::default());
    assert_eq!(form.phase, SubmissionPhase::Idle);
    assert_eq!(state.reports.len(), 1);
    Ok(())
}
