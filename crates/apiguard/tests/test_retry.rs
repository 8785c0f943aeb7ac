//! Retry behavior through the error handler
//!
//! Drives the handler with scripted operations and a recording clock:
//! - Recovery after transient server errors
//! - Fail-fast on terminal kinds
//! - Exhaustion, attempt bookkeeping and callbacks
//! - Cancellation between attempts

use apiguard::retry::{RetryConfig, RetryOptions};
use apiguard::{CancellationToken, Failure, FailureKind, GuardConfig, Severity, TransportCode};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::{
    CountingCredentialStore, CountingNavigator, RecordingClock, RecordingNotifier, handler_with,
};

struct Setup {
    notifier: Arc<RecordingNotifier>,
    clock: Arc<RecordingClock>,
    navigator: Arc<CountingNavigator>,
    handler: apiguard::ErrorHandler,
}

fn setup(config: GuardConfig) -> Setup {
    let store = Arc::new(CountingCredentialStore::with_tokens("access", "refresh"));
    let navigator = Arc::new(CountingNavigator::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(RecordingClock::default());
    let handler = handler_with(
        config,
        store,
        navigator.clone(),
        notifier.clone(),
        clock.clone(),
    );
    Setup {
        notifier,
        clock,
        navigator,
        handler,
    }
}

/// Operation that plays back `script` in order, then succeeds.
fn scripted(
    script: Vec<Failure>,
    calls: &AtomicU32,
) -> impl FnMut() -> std::future::Ready<Result<&'static str, Failure>> + '_ {
    let mut script = script.into_iter();
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(match script.next() {
            Some(failure) => Err(failure),
            None => Ok("ok"),
        })
    }
}

#[tokio::test]
async fn test_two_server_errors_then_success() {
    let s = setup(GuardConfig::mock());
    let calls = AtomicU32::new(0);
    let retries = Arc::new(Mutex::new(Vec::new()));
    let seen = retries.clone();

    let result = s
        .handler
        .with_retry(
            scripted(
                vec![Failure::http(503, "down"), Failure::http(503, "still down")],
                &calls,
            ),
            RetryOptions::new().on_retry(move |attempt, max| seen.lock().unwrap().push((attempt, max))),
        )
        .await;

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        s.clock.waits(),
        vec![Duration::ZERO, Duration::from_millis(2000)]
    );
    assert_eq!(*retries.lock().unwrap(), vec![(1, 3), (2, 3)]);
    assert!(s.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_fail_once_then_succeed() {
    let s = setup(GuardConfig::mock());
    let calls = AtomicU32::new(0);

    let result = s
        .handler
        .with_retry(
            scripted(vec![Failure::http(504, "gateway timeout")], &calls),
            RetryOptions::new(),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_bad_request_is_propagated_unchanged() {
    let s = setup(GuardConfig::mock());
    let calls = AtomicU32::new(0);
    let original = Failure::http(400, "bad field");

    let err = s
        .handler
        .with_retry(scripted(vec![original.clone()], &calls), RetryOptions::new())
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.failure(), Some(&original));
    assert_eq!(err.kind(), Some(FailureKind::BadRequest));
    assert!(s.clock.waits().is_empty());

    let notes = s.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Error);
    assert_eq!(notes[0].message, "bad field");
}

#[tokio::test]
async fn test_exhaustion_returns_last_failure() {
    let config = GuardConfig {
        retry: RetryConfig::builder()
            .max_retries(5)
            .backoff_millis([0, 2000, 5000])
            .build()
            .unwrap(),
        ..GuardConfig::mock()
    };
    let s = setup(config);
    let calls = AtomicU32::new(0);
    let retries = Arc::new(Mutex::new(Vec::new()));
    let seen = retries.clone();

    let script = (1..=5)
        .map(|n| Failure::transport(TransportCode::NetworkUnreachable, format!("failure {n}")))
        .collect();
    let err = s
        .handler
        .with_retry(
            scripted(script, &calls),
            RetryOptions::new().on_retry(move |attempt, _| seen.lock().unwrap().push(attempt)),
        )
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(err.failure().map(Failure::message), Some("failure 5"));
    assert_eq!(*retries.lock().unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(
        s.clock.waits(),
        vec![
            Duration::ZERO,
            Duration::from_millis(2000),
            Duration::from_millis(5000),
            Duration::from_millis(5000),
        ]
    );

    let notes = s.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, FailureKind::NetworkError);
}

#[tokio::test]
async fn test_single_attempt_never_retries() {
    let s = setup(GuardConfig::mock());
    let calls = AtomicU32::new(0);

    let err = s
        .handler
        .with_retry(
            scripted(vec![Failure::http(500, "boom")], &calls),
            RetryOptions::new().max_attempts(1),
        )
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(err.is_retryable());
    assert!(s.clock.waits().is_empty());
}

#[tokio::test]
async fn test_unauthorized_is_not_retried_and_recovers_session() {
    let s = setup(GuardConfig::mock());
    let calls = AtomicU32::new(0);

    let err = s
        .handler
        .with_retry(
            scripted(vec![Failure::http(401, "expired")], &calls),
            RetryOptions::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.kind(), Some(FailureKind::Unauthorized));
    assert_eq!(s.navigator.count(), 1);
}

#[tokio::test]
async fn test_cancel_during_backoff() {
    let s = setup(GuardConfig::mock());
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let retries = Arc::new(AtomicU32::new(0));

    let handler = s.handler.clone();
    let task = {
        let op_token = token.clone();
        let options_token = token.clone();
        let calls = calls.clone();
        let retries = retries.clone();
        tokio::spawn(async move {
            handler
                .with_retry(
                    move || {
                        let calls = calls.clone();
                        let token = op_token.clone();
                        async move {
                            if calls.fetch_add(1, Ordering::SeqCst) == 1 {
                                token.cancel();
                            }
                            Err::<(), _>(Failure::http(503, "down"))
                        }
                    },
                    RetryOptions::new()
                        .cancel_token(options_token)
                        .on_retry(move |_, _| {
                            retries.fetch_add(1, Ordering::SeqCst);
                        }),
                )
                .await
        })
    };

    let err = task.await.unwrap().unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(retries.load(Ordering::SeqCst), 1);
    assert!(s.notifier.notifications().is_empty());
    assert_eq!(s.navigator.count(), 0);
}
