use std::sync::Arc;

use async_trait::async_trait;
use outpass::domain::request::NewRecord;
use outpass::notify::messages::{PARENT_ACK, STAFF_SUBJECT, STUDENT_ACK};
use outpass::{
    Access, CasOutcome, CredentialIssuer, Decision, InMemoryRecordStore, MockRenderer,
    MockTransport, NewOutpassRequest, NotificationDispatcher, OutpassError, OutpassRequest,
    OutpassStatus, OutpassWorkflow, RecordStore, Result, WorkflowConfig,
};

const SECRET: &str = "test-secret";
const STUDENT: &str = "+15550000001";
const PARENT: &str = "+15550000002";

struct Harness {
    workflow: OutpassWorkflow,
    store: Arc<dyn RecordStore>,
    transport: Arc<MockTransport>,
    renderer: Arc<MockRenderer>,
}

fn harness_with(store: Arc<dyn RecordStore>, renderer: MockRenderer) -> Harness {
    let transport = Arc::new(MockTransport::new());
    let renderer = Arc::new(renderer);
    let dispatcher = NotificationDispatcher::new(transport.clone());
    let config = WorkflowConfig {
        staff_email: "warden@example.edu".to_string(),
        api_endpoint: "https://outpass.example.edu".to_string(),
        credential_validity_hours: 24,
    };
    let issuer = CredentialIssuer::new(
        renderer.clone(),
        dispatcher.clone(),
        config.credential_validity(),
        SECRET,
    );
    let workflow = OutpassWorkflow::new(store.clone(), dispatcher, issuer, config);
    Harness {
        workflow,
        store,
        transport,
        renderer,
    }
}

fn harness() -> Harness {
    harness_with(
        Arc::new(InMemoryRecordStore::new()),
        MockRenderer::new("https://credentials.example.edu"),
    )
}

fn submission(roll: &str) -> NewOutpassRequest {
    NewOutpassRequest {
        student_name: Some("A".to_string()),
        roll_number: Some(roll.to_string()),
        student_mobile: Some(STUDENT.to_string()),
        parent_mobile: Some(PARENT.to_string()),
        reason: Some("Medical".to_string()),
    }
}

async fn status_of(h: &Harness, id: &str) -> Option<OutpassStatus> {
    h.store.get_status(id).await.unwrap()
}

#[test_log::test(tokio::test)]
async fn test_submit_then_approve_then_reject() {
    let h = harness();

    let submitted = h.workflow.submit(submission("R1")).await.unwrap();
    assert_eq!(submitted.record.status, OutpassStatus::Pending);
    assert_eq!(submitted.summary.id, "R1");
    assert_eq!(status_of(&h, "R1").await, Some(OutpassStatus::Pending));

    // Staff email plus two acknowledgements
    let calls = h.transport.get_calls();
    assert_eq!(calls.len(), 3);
    let emails = h.transport.emails();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].0, "warden@example.edu");
    assert_eq!(emails[0].1, STAFF_SUBJECT);
    assert!(emails[0].2.contains("https://outpass.example.edu/approve"));
    assert_eq!(h.transport.sms_to(STUDENT), vec![STUDENT_ACK.to_string()]);
    assert_eq!(h.transport.sms_to(PARENT), vec![PARENT_ACK.to_string()]);

    let outcome = h.workflow.decide("R1", Decision::Approve).await.unwrap();
    assert_eq!(outcome.decision, Decision::Approve);
    assert_eq!(outcome.status, OutpassStatus::Approved);
    let credential = outcome.credential.expect("approval issues a credential");
    assert_eq!(credential.payload, "OUTPASS:R1");
    assert_eq!(
        credential.retrieval_url,
        "https://credentials.example.edu/R1.png"
    );
    assert_eq!(credential.validity_hours(), 24);
    assert!(credential.verify_signature(SECRET));
    assert!(outcome.message.contains("24 hours"));
    assert_eq!(
        h.renderer.rendered(),
        vec![("OUTPASS:R1".to_string(), "R1.png".to_string())]
    );

    let parent_sms = h.transport.sms_to(PARENT);
    assert_eq!(parent_sms.len(), 2);
    assert!(parent_sms[1].contains("Roll No: R1"));
    assert!(parent_sms[1].contains(&credential.retrieval_url));

    let record = h.workflow.lookup("R1").await.unwrap();
    assert_eq!(record.status, OutpassStatus::Approved);
    assert!(record.decided_at.is_some());

    let second = h.workflow.decide("R1", Decision::Reject).await;
    assert!(matches!(
        second,
        Err(OutpassError::AlreadyDecided(OutpassStatus::Approved))
    ));
    assert_eq!(status_of(&h, "R1").await, Some(OutpassStatus::Approved));
    // No credential or notice for the refused decision
    assert_eq!(h.renderer.rendered().len(), 1);
    assert_eq!(h.transport.sms_to(PARENT).len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_reject_issues_nothing() {
    let h = harness();
    h.workflow.submit(submission("R2")).await.unwrap();
    h.transport.clear_calls();

    let outcome = h.workflow.decide("R2", Decision::Reject).await.unwrap();
    assert_eq!(outcome.decision, Decision::Reject);
    assert_eq!(outcome.status, OutpassStatus::Rejected);
    assert_eq!(outcome.message, "Outpass has been rejected.");
    assert!(outcome.credential.is_none());
    assert!(h.renderer.rendered().is_empty());
    assert_eq!(h.transport.call_count(), 0);

    let again = h.workflow.decide("R2", Decision::Approve).await;
    assert!(matches!(
        again,
        Err(OutpassError::AlreadyDecided(OutpassStatus::Rejected))
    ));
}

#[test_log::test(tokio::test)]
async fn test_decide_unknown_id_is_not_found() {
    let h = harness();
    let result = h.workflow.decide("missing", Decision::Approve).await;
    assert!(matches!(result, Err(OutpassError::NotFound(_))));
    assert!(h.renderer.rendered().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_concurrent_decisions_have_one_winner() {
    for round in 0..20 {
        let h = harness();
        let id = format!("R{}", round);
        h.workflow.submit(submission(&id)).await.unwrap();

        let approve = {
            let workflow = h.workflow.clone();
            let id = id.clone();
            tokio::spawn(async move { workflow.decide(&id, Decision::Approve).await })
        };
        let reject = {
            let workflow = h.workflow.clone();
            let id = id.clone();
            tokio::spawn(async move { workflow.decide(&id, Decision::Reject).await })
        };

        let approve = approve.await.unwrap();
        let reject = reject.await.unwrap();
        let final_status = status_of(&h, &id).await.unwrap();

        match (&approve, &reject) {
            (Ok(_), Err(OutpassError::AlreadyDecided(_))) => {
                assert_eq!(final_status, OutpassStatus::Approved);
                assert_eq!(h.renderer.rendered().len(), 1);
            }
            (Err(OutpassError::AlreadyDecided(_)), Ok(_)) => {
                assert_eq!(final_status, OutpassStatus::Rejected);
                assert!(h.renderer.rendered().is_empty());
            }
            other => panic!("expected exactly one winner, got {:?}", other),
        }
    }
}

/// Store whose status reads always look Pending, so the early check in
/// `decide` never catches a decided record and only the CAS can.
struct StaleReadStore {
    inner: InMemoryRecordStore,
}

#[async_trait]
impl RecordStore for StaleReadStore {
    async fn insert(&self, record: NewRecord) -> Result<OutpassRequest> {
        self.inner.insert(record).await
    }

    async fn get_status(&self, id: &str) -> Result<Option<OutpassStatus>> {
        Ok(self
            .inner
            .get_status(id)
            .await?
            .map(|_| OutpassStatus::Pending))
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: OutpassStatus,
        new: OutpassStatus,
    ) -> Result<CasOutcome> {
        self.inner.compare_and_set_status(id, expected, new).await
    }

    async fn get_record(&self, id: &str) -> Result<Option<OutpassRequest>> {
        self.inner.get_record(id).await
    }
}

#[test_log::test(tokio::test)]
async fn test_stale_read_loser_is_refused_by_the_write() {
    let inner = InMemoryRecordStore::new();
    let h = harness_with(
        Arc::new(StaleReadStore {
            inner: inner.clone(),
        }),
        MockRenderer::new("https://credentials.example.edu"),
    );
    h.workflow.submit(submission("R1")).await.unwrap();

    h.workflow.decide("R1", Decision::Reject).await.unwrap();

    // The early read says Pending, so the refusal must come from the CAS
    let result = h.workflow.decide("R1", Decision::Approve).await;
    assert!(matches!(
        result,
        Err(OutpassError::AlreadyDecided(OutpassStatus::Rejected))
    ));
    assert_eq!(
        inner.get_status("R1").await.unwrap(),
        Some(OutpassStatus::Rejected)
    );
    assert!(h.renderer.rendered().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_check_access_by_status() {
    let h = harness();
    for roll in ["P1", "A1", "X1"] {
        h.workflow.submit(submission(roll)).await.unwrap();
    }
    h.workflow.decide("A1", Decision::Approve).await.unwrap();
    h.workflow.decide("X1", Decision::Reject).await.unwrap();

    assert_eq!(h.workflow.check_access("A1").await.unwrap(), Access::Granted);
    assert_eq!(h.workflow.check_access("P1").await.unwrap(), Access::Denied);
    assert_eq!(h.workflow.check_access("X1").await.unwrap(), Access::Denied);
    assert_eq!(
        h.workflow.check_access("unknown").await.unwrap(),
        Access::Denied
    );
}

#[test_log::test(tokio::test)]
async fn test_missing_field_creates_nothing() {
    let h = harness();
    let cases: [(&str, fn(&mut NewOutpassRequest)); 5] = [
        ("studentName", |r| r.student_name = None),
        ("rollNumber", |r| r.roll_number = Some("   ".to_string())),
        ("studentMobile", |r| r.student_mobile = None),
        ("parentMobile", |r| r.parent_mobile = Some(String::new())),
        ("reason", |r| r.reason = None),
    ];

    for (field, strip) in cases {
        let mut request = submission("R9");
        strip(&mut request);
        match h.workflow.submit(request).await {
            Err(OutpassError::MissingField(name)) => assert_eq!(name, field),
            other => panic!("expected MissingField({}), got {:?}", field, other),
        }
    }

    assert_eq!(status_of(&h, "R9").await, None);
    assert_eq!(h.transport.call_count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_duplicate_submission_is_refused() {
    let h = harness();
    h.workflow.submit(submission("R1")).await.unwrap();
    let result = h.workflow.submit(submission("R1")).await;
    assert!(matches!(result, Err(OutpassError::DuplicateRequest(_))));
}

#[test_log::test(tokio::test)]
async fn test_intake_notification_failure_keeps_record() {
    let h = harness();
    h.transport.fail_recipient(STUDENT);

    let result = h.workflow.submit(submission("R1")).await;
    assert!(matches!(result, Err(OutpassError::TransportError(_))));

    // The record was written before fan-out and every send was attempted
    assert_eq!(status_of(&h, "R1").await, Some(OutpassStatus::Pending));
    assert_eq!(h.transport.call_count(), 3);
}

#[test_log::test(tokio::test)]
async fn test_issuance_failure_after_commit() {
    let h = harness_with(Arc::new(InMemoryRecordStore::new()), MockRenderer::failing());
    h.workflow.submit(submission("R1")).await.unwrap();

    let result = h.workflow.decide("R1", Decision::Approve).await;
    assert!(matches!(result, Err(OutpassError::Internal(_))));

    // The status change is durable even though the call failed
    assert_eq!(status_of(&h, "R1").await, Some(OutpassStatus::Approved));
    assert_eq!(h.transport.sms_to(PARENT).len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_parent_notice_failure_is_swallowed() {
    let h = harness();
    h.workflow.submit(submission("R1")).await.unwrap();
    h.transport.fail_recipient(PARENT);

    let outcome = h.workflow.decide("R1", Decision::Approve).await.unwrap();
    assert_eq!(outcome.status, OutpassStatus::Approved);
    assert!(outcome.credential.is_some());

    // Acknowledgement plus the attempted approval notice
    assert_eq!(h.transport.sms_to(PARENT).len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_lookup_requires_roll_number() {
    let h = harness();
    assert!(matches!(
        h.workflow.lookup(" ").await,
        Err(OutpassError::ValidationError(_))
    ));
    assert!(matches!(
        h.workflow.lookup("nobody").await,
        Err(OutpassError::NotFound(_))
    ));
}
