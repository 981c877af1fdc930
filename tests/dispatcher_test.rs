//! Tests for ChangeDispatcher: debounce, sequencing and failure handling
//!
//! All tests run on a paused clock; timers fire as soon as the runtime is idle.

use std::sync::Arc;
use std::time::Duration;

use billform::application::{ChangeDispatcher, DispatchEvent, DispatchPhase, DEFAULT_QUIET_PERIOD};
use billform::domain::{BillRecord, ClientError, DomainError, ErrorKind, FieldPath, FieldValue};
use billform::infrastructure::TransportError;
use billform::util::testing::{init_test_setup, message, ScriptedReply, ScriptedValidator};
use tokio::time::{self, Instant};

fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

fn open(validator: Arc<ScriptedValidator>) -> ChangeDispatcher {
    init_test_setup();
    let record = BillRecord::sample();
    ChangeDispatcher::new(
        record.to_field_tree().unwrap(),
        BillRecord::rules().unwrap(),
        validator,
        DEFAULT_QUIET_PERIOD,
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn given_three_edits_within_quiet_period_when_settling_then_one_call_with_last_value() {
    // Arrange
    let validator = Arc::new(ScriptedValidator::new());
    let mut dispatcher = open(validator.clone());
    let amount = path("amount");
    let start = Instant::now();

    // Act
    dispatcher.edit(&amount, 1.0.into()).unwrap();
    time::advance(Duration::from_millis(200)).await;
    dispatcher.edit(&amount, 2.0.into()).unwrap();
    time::advance(Duration::from_millis(200)).await;
    dispatcher.edit(&amount, 3.0.into()).unwrap();
    let events = dispatcher.settle().await.unwrap();

    // Assert
    assert_eq!(validator.call_count(), 1);
    assert_eq!(
        validator.received()[0].get(&amount),
        Some(&FieldValue::Number(3.0))
    );
    assert!(start.elapsed() >= Duration::from_millis(1000));
    assert!(matches!(events[0], DispatchEvent::Dispatched { seq: 1 }));
    assert!(matches!(events[1], DispatchEvent::Merged { seq: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn given_negative_amount_when_edited_then_range_violation_without_remote_call() {
    // Arrange
    let validator = Arc::new(ScriptedValidator::new());
    let mut dispatcher = open(validator.clone());
    let amount = path("amount");

    // Act
    let outcome = dispatcher.edit(&amount, (-5.0).into()).unwrap();
    let early = time::timeout(Duration::from_millis(599), dispatcher.next_event()).await;

    // Assert
    assert!(matches!(outcome, Some(ClientError::RangeViolation { .. })));
    assert!(early.is_err(), "nothing may happen inside the quiet period");
    assert_eq!(validator.call_count(), 0);
    assert_eq!(dispatcher.phase(), DispatchPhase::Pending);
    let errors = dispatcher.tree().errors(&amount).unwrap();
    assert!(errors.contains(ErrorKind::Client));
    assert!(!errors.contains(ErrorKind::Server));
}

#[tokio::test(start_paused = true)]
async fn given_older_request_outstanding_when_newer_merges_then_older_is_dropped() {
    // Arrange: first call answers late, second immediately
    let validator = Arc::new(ScriptedValidator::with_replies([
        ScriptedReply::ok(vec![message("account", "stale")]).after(Duration::from_secs(5)),
        ScriptedReply::ok(vec![message("creditor.name", "fresh")]),
    ]));
    let mut dispatcher = open(validator.clone());
    let amount = path("amount");

    // Act
    dispatcher.edit(&amount, 10.0.into()).unwrap();
    let first = dispatcher.next_event().await.unwrap();
    dispatcher.edit(&amount, 20.0.into()).unwrap();
    let second = dispatcher.next_event().await.unwrap();
    let merged = dispatcher.next_event().await.unwrap();
    let done = dispatcher.next_event().await.unwrap();
    time::advance(Duration::from_secs(10)).await;

    // Assert
    assert!(matches!(first, Some(DispatchEvent::Dispatched { seq: 1 })));
    assert!(matches!(second, Some(DispatchEvent::Dispatched { seq: 2 })));
    assert!(matches!(merged, Some(DispatchEvent::Merged { seq: 2, .. })));
    assert!(done.is_none());
    assert!(!dispatcher.is_active());

    let tree = dispatcher.tree();
    assert_eq!(tree.errors(&path("creditor.name")).unwrap().server(), Some("fresh"));
    assert_eq!(tree.errors(&path("account")).unwrap().server(), None);
    assert_eq!(dispatcher.phase(), DispatchPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn given_first_call_never_answers_when_newer_merges_then_settle_returns() {
    // Arrange
    let validator = Arc::new(ScriptedValidator::with_replies([
        ScriptedReply::never(),
        ScriptedReply::ok(vec![message("creditor.name", "fresh")])
            .after(Duration::from_millis(100)),
    ]));
    let mut dispatcher = open(validator.clone());
    let amount = path("amount");
    dispatcher.edit(&amount, 10.0.into()).unwrap();
    dispatcher.next_event().await.unwrap();
    dispatcher.edit(&amount, 20.0.into()).unwrap();

    // Act
    let settled = time::timeout(Duration::from_secs(3600), dispatcher.settle()).await;

    // Assert
    let events = settled.expect("settle must not wait for the superseded call").unwrap();
    assert!(matches!(events[0], DispatchEvent::Dispatched { seq: 2 }));
    assert!(matches!(events[1], DispatchEvent::Merged { seq: 2, .. }));
    assert_eq!(validator.call_count(), 2);
    assert_eq!(dispatcher.phase(), DispatchPhase::Idle);
    assert!(!dispatcher.is_active());
}

#[tokio::test(start_paused = true)]
async fn given_stale_failure_when_arriving_before_newer_reply_then_discarded_and_still_in_flight() {
    // Arrange: first call fails after 5s, second answers after 10s
    let validator = Arc::new(ScriptedValidator::with_replies([
        ScriptedReply::fail(TransportError::Unavailable {
            message: "connection reset".into(),
        })
        .after(Duration::from_secs(5)),
        ScriptedReply::ok(vec![message("creditor.name", "fresh")]).after(Duration::from_secs(10)),
    ]));
    let mut dispatcher = open(validator);
    let amount = path("amount");
    dispatcher.edit(&amount, 10.0.into()).unwrap();
    dispatcher.next_event().await.unwrap();
    dispatcher.edit(&amount, 20.0.into()).unwrap();
    dispatcher.next_event().await.unwrap();

    // Act
    let stale = dispatcher.next_event().await.unwrap();

    // Assert
    assert!(matches!(stale, Some(DispatchEvent::Discarded { seq: 1 })));
    assert_eq!(dispatcher.phase(), DispatchPhase::InFlight);
    assert!(dispatcher.last_failure().is_none());

    // Act
    let latest = dispatcher.next_event().await.unwrap();

    // Assert
    assert!(matches!(latest, Some(DispatchEvent::Merged { seq: 2, .. })));
    assert!(dispatcher.last_failure().is_none());
    assert_eq!(
        dispatcher.tree().errors(&path("creditor.name")).unwrap().server(),
        Some("fresh")
    );
    assert_eq!(dispatcher.phase(), DispatchPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn given_transport_failure_when_completing_then_prior_errors_kept_and_next_edit_retries() {
    // Arrange
    let validator = Arc::new(ScriptedValidator::with_replies([
        ScriptedReply::ok(vec![message("amount", "amount rejected")]),
        ScriptedReply::fail(TransportError::Unavailable {
            message: "connection refused".into(),
        }),
    ]));
    let mut dispatcher = open(validator.clone());
    let amount = path("amount");
    dispatcher.edit(&amount, (-5.0).into()).unwrap();
    dispatcher.settle().await.unwrap();

    // Act
    dispatcher.edit(&path("currency"), "EUR".into()).unwrap();
    let events = dispatcher.settle().await.unwrap();

    // Assert
    assert!(matches!(
        events[1],
        DispatchEvent::Failed {
            seq: 2,
            error: TransportError::Unavailable { .. }
        }
    ));
    let errors = dispatcher.tree().errors(&amount).unwrap();
    assert!(errors.contains(ErrorKind::Client));
    assert_eq!(errors.server(), Some("amount rejected"));
    assert!(dispatcher.last_failure().unwrap().contains("connection refused"));

    // Act: the next edit dispatches again; the default reply has no messages
    dispatcher.edit(&amount, 12.0.into()).unwrap();
    dispatcher.settle().await.unwrap();

    // Assert
    assert_eq!(validator.call_count(), 3);
    assert!(dispatcher.tree().errors(&amount).unwrap().is_empty());
    assert!(dispatcher.last_failure().is_none());
}

#[tokio::test(start_paused = true)]
async fn given_client_and_server_error_when_client_rule_passes_then_server_error_stays() {
    // Arrange
    let validator = Arc::new(ScriptedValidator::with_replies([ScriptedReply::ok(vec![
        message("amount", "limit exceeded"),
    ])]));
    let mut dispatcher = open(validator);
    let amount = path("amount");
    dispatcher.edit(&amount, (-5.0).into()).unwrap();
    dispatcher.settle().await.unwrap();

    // Act
    let outcome = dispatcher.edit(&amount, 50.0.into()).unwrap();

    // Assert
    assert!(outcome.is_none());
    let errors = dispatcher.tree().errors(&amount).unwrap();
    assert!(!errors.contains(ErrorKind::Client));
    assert_eq!(errors.server(), Some("limit exceeded"));
}

#[tokio::test(start_paused = true)]
async fn given_slow_reply_when_driving_then_phases_go_pending_inflight_idle() {
    // Arrange
    let validator = Arc::new(ScriptedValidator::with_replies([
        ScriptedReply::ok(vec![]).after(Duration::from_secs(1)),
    ]));
    let mut dispatcher = open(validator);
    assert_eq!(dispatcher.phase(), DispatchPhase::Idle);

    // Act / Assert
    dispatcher.edit(&path("amount"), 5.0.into()).unwrap();
    assert_eq!(dispatcher.phase(), DispatchPhase::Pending);

    dispatcher.next_event().await.unwrap();
    assert_eq!(dispatcher.phase(), DispatchPhase::InFlight);

    dispatcher.next_event().await.unwrap();
    assert_eq!(dispatcher.phase(), DispatchPhase::Idle);
    assert!(!dispatcher.is_active());
}

#[tokio::test(start_paused = true)]
async fn given_edit_while_in_flight_when_reply_arrives_first_then_it_is_still_merged() {
    // Arrange: reply arrives before the restarted quiet period ends
    let validator = Arc::new(ScriptedValidator::with_replies([
        ScriptedReply::ok(vec![message("creditor.town", "unknown town")])
            .after(Duration::from_millis(100)),
    ]));
    let mut dispatcher = open(validator.clone());
    dispatcher.edit(&path("amount"), 5.0.into()).unwrap();
    dispatcher.next_event().await.unwrap();

    // Act
    dispatcher.edit(&path("amount"), 6.0.into()).unwrap();
    let event = dispatcher.next_event().await.unwrap();

    // Assert
    assert!(matches!(event, Some(DispatchEvent::Merged { seq: 1, .. })));
    assert_eq!(dispatcher.phase(), DispatchPhase::Pending);
    assert_eq!(
        dispatcher.tree().errors(&path("creditor.town")).unwrap().server(),
        Some("unknown town")
    );

    let rest = dispatcher.settle().await.unwrap();
    assert_eq!(rest.len(), 2);
    assert_eq!(validator.call_count(), 2);
    // second reply has no messages
    assert!(dispatcher
        .tree()
        .errors(&path("creditor.town"))
        .unwrap()
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn given_reply_for_unknown_field_when_merging_then_error_surfaces() {
    // Arrange
    let validator = Arc::new(ScriptedValidator::with_replies([ScriptedReply::ok(vec![
        message("iban", "invalid"),
    ])]));
    let mut dispatcher = open(validator);
    dispatcher.edit(&path("amount"), 5.0.into()).unwrap();

    // Act
    let result = dispatcher.settle().await;

    // Assert
    assert!(matches!(result, Err(DomainError::UnknownField(p)) if p.to_string() == "iban"));
}

#[tokio::test(start_paused = true)]
async fn given_bad_path_when_editing_then_contract_error_and_no_timer() {
    // Arrange
    let mut dispatcher = open(Arc::new(ScriptedValidator::new()));

    // Act
    let missing = dispatcher.edit(&path("creditor.iban"), "x".into());
    let group = dispatcher.edit(&path("creditor"), "x".into());

    // Assert
    assert!(matches!(missing, Err(DomainError::NotFound(_))));
    assert!(matches!(group, Err(DomainError::TypeMismatch(_))));
    assert_eq!(dispatcher.phase(), DispatchPhase::Idle);
}
