//! Deployment request workflow tests

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{Call, FakeApi};
use ucdpub::deploy::fsm::RequestState;
use ucdpub::deploy::poller::{no_cancel, PollOptions};
use ucdpub::deploy::request::{DeployRequest, Deployer};
use ucdpub::errors::PublisherError;
use ucd_models::VersionSelector;

/// Sleep stand-in that records the requested delays and returns at once
fn recording_sleep() -> (
    Arc<Mutex<Vec<Duration>>>,
    impl Fn(Duration) -> std::future::Ready<()>,
) {
    let slept = Arc::new(Mutex::new(Vec::new()));
    let log = slept.clone();
    (slept, move |d: Duration| {
        log.lock().unwrap().push(d);
        std::future::ready(())
    })
}

fn request(versions: &str) -> DeployRequest {
    DeployRequest::new("shop", "qa", "Deploy All", versions)
}

#[tokio::test]
async fn test_polls_until_closed_and_succeeds() {
    let api = FakeApi::new();
    api.push_status(None, None);
    api.push_status(Some("running"), None);
    api.push_status(Some("closed"), Some("SUCCEEDED"));
    let (slept, sleep) = recording_sleep();

    let outcome = Deployer::new(&api, PollOptions::default())
        .deploy_with(&request("web:1.0"), sleep, no_cancel())
        .await
        .unwrap();

    assert_eq!(outcome.request_id, api.request_id);
    assert_eq!(outcome.result, "SUCCEEDED");
    assert_eq!(outcome.state, RequestState::Succeeded);
    assert_eq!(outcome.polls, 3);
    assert!(outcome.finished_at >= outcome.started_at);
    assert_eq!(
        api.count(|c| matches!(c, Call::RequestStatus(id) if *id == api.request_id)),
        3
    );
    assert_eq!(
        *slept.lock().unwrap(),
        vec![Duration::from_secs(3), Duration::from_secs(3)]
    );
}

#[tokio::test]
async fn test_closed_without_result_is_treated_as_fault() {
    let api = FakeApi::new();
    api.push_status(Some("CLOSED"), None);
    let (_, sleep) = recording_sleep();

    let result = Deployer::new(&api, PollOptions::default())
        .deploy_with(&request("web:1.0"), sleep, no_cancel())
        .await;

    match result {
        Err(PublisherError::ProcessFailed { request_id, result }) => {
            assert_eq!(request_id, api.request_id.to_string());
            assert_eq!(result, "FAULTED");
        }
        other => panic!("expected process failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_none_result_keeps_polling() {
    let api = FakeApi::new();
    api.push_status(Some("CLOSED"), Some("NONE"));
    api.push_status(Some("CLOSED"), Some("SUCCEEDED"));
    let (slept, sleep) = recording_sleep();

    let outcome = Deployer::new(&api, PollOptions::default())
        .deploy_with(&request("web:1.0"), sleep, no_cancel())
        .await
        .unwrap();

    assert_eq!(outcome.state, RequestState::Succeeded);
    assert_eq!(outcome.result, "SUCCEEDED");
    assert_eq!(outcome.polls, 2);
    assert_eq!(slept.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_faulted_result_is_process_failure() {
    let api = FakeApi::new();
    api.push_status(Some("EXECUTING"), None);
    api.push_status(Some("CLOSED"), Some("FAULTED"));
    let (_, sleep) = recording_sleep();

    let err = Deployer::new(&api, PollOptions::default())
        .deploy_with(&request("web:1.0"), sleep, no_cancel())
        .await
        .unwrap_err();

    assert!(err.is_process_failure());
    assert!(!err.is_connectivity());
    assert_eq!(api.count(|c| matches!(c, Call::RequestApplicationProcess)), 1);
}

#[tokio::test]
async fn test_failed_to_start_is_process_failure() {
    let api = FakeApi::new();
    api.push_status(Some("CLOSED"), Some("failed to start"));
    let (_, sleep) = recording_sleep();

    let err = Deployer::new(&api, PollOptions::default())
        .deploy_with(&request("web:1.0"), sleep, no_cancel())
        .await
        .unwrap_err();

    assert!(err.is_process_failure());
}

#[tokio::test]
async fn test_other_terminal_results_complete() {
    let api = FakeApi::new();
    api.push_status(Some("CLOSED"), Some("CANCELED"));
    let (_, sleep) = recording_sleep();

    let outcome = Deployer::new(&api, PollOptions::default())
        .deploy_with(&request("web:1.0"), sleep, no_cancel())
        .await
        .unwrap();

    assert_eq!(outcome.state, RequestState::Completed("CANCELED".to_string()));
}

#[tokio::test]
async fn test_multi_line_snapshot_fails_before_submit() {
    let api = FakeApi::new();
    let (_, sleep) = recording_sleep();

    let result = Deployer::new(&api, PollOptions::default())
        .deploy_with(
            &request("SNAPSHOT=nightly\nSNAPSHOT=weekly"),
            sleep,
            no_cancel(),
        )
        .await;

    assert!(matches!(result, Err(PublisherError::Config(_))));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_snapshot_request_payload() {
    let api = FakeApi::new();
    api.push_status(Some("CLOSED"), Some("SUCCEEDED"));
    let (_, sleep) = recording_sleep();

    let mut req = request("SNAPSHOT=nightly");
    req.only_changed = true;
    Deployer::new(&api, PollOptions::default())
        .deploy_with(&req, sleep, no_cancel())
        .await
        .unwrap();

    let submitted = api.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].snapshot.as_deref(), Some("nightly"));
    assert!(submitted[0].versions.is_empty());
    assert!(submitted[0].only_changed);
}

#[tokio::test]
async fn test_component_versions_payload() {
    let api = FakeApi::new();
    api.push_status(Some("CLOSED"), Some("SUCCEEDED"));
    let (_, sleep) = recording_sleep();

    Deployer::new(&api, PollOptions::default())
        .deploy_with(&request("compA:v1\ncompA:v2\ncompB:v1"), sleep, no_cancel())
        .await
        .unwrap();

    let submitted = api.submitted();
    assert_eq!(submitted[0].snapshot, None);
    assert_eq!(
        submitted[0].versions,
        vec![
            VersionSelector {
                version: "v1".to_string(),
                component: "compA".to_string()
            },
            VersionSelector {
                version: "v2".to_string(),
                component: "compA".to_string()
            },
            VersionSelector {
                version: "v1".to_string(),
                component: "compB".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_required_fields() {
    let api = FakeApi::new();

    for req in [
        DeployRequest::new("", "qa", "p", "web:1"),
        DeployRequest::new("shop", " ", "p", "web:1"),
        DeployRequest::new("shop", "qa", "", "web:1"),
        DeployRequest::new("shop", "qa", "p", ""),
    ] {
        let (_, sleep) = recording_sleep();
        let result = Deployer::new(&api, PollOptions::default())
            .deploy_with(&req, sleep, no_cancel())
            .await;
        assert!(matches!(result, Err(PublisherError::Validation(_))));
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_max_attempts_bounds_the_wait() {
    let api = FakeApi::new();
    let (slept, sleep) = recording_sleep();

    let options = PollOptions {
        max_attempts: Some(4),
        ..Default::default()
    };
    let result = Deployer::new(&api, options)
        .deploy_with(&request("web:1.0"), sleep, no_cancel())
        .await;

    assert!(matches!(result, Err(PublisherError::PollTimeout { .. })));
    assert_eq!(api.count(|c| matches!(c, Call::RequestStatus(_))), 4);
    assert_eq!(slept.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_max_wait_bounds_the_wait() {
    let api = FakeApi::new();
    let (_, sleep) = recording_sleep();

    let options = PollOptions {
        max_wait: Some(Duration::ZERO),
        ..Default::default()
    };
    let result = Deployer::new(&api, options)
        .deploy_with(&request("web:1.0"), sleep, no_cancel())
        .await;

    assert!(matches!(result, Err(PublisherError::PollTimeout { .. })));
    assert_eq!(api.count(|c| matches!(c, Call::RequestStatus(_))), 1);
}

#[tokio::test]
async fn test_cancel_stops_waiting() {
    let api = FakeApi::new();

    let result = Deployer::new(&api, PollOptions::default())
        .deploy_with(
            &request("web:1.0"),
            |_| std::future::pending::<()>(),
            Box::pin(async {}),
        )
        .await;

    match result {
        Err(PublisherError::Cancelled { request_id }) => {
            assert_eq!(request_id, api.request_id.to_string());
        }
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert_eq!(api.count(|c| matches!(c, Call::RequestStatus(_))), 1);
}

#[tokio::test]
async fn test_status_transport_error_propagates() {
    let api = FakeApi::new();
    api.push_status(Some("EXECUTING"), None);
    api.push_status_error(503);
    let (_, sleep) = recording_sleep();

    let err = Deployer::new(&api, PollOptions::default())
        .deploy_with(&request("web:1.0"), sleep, no_cancel())
        .await
        .unwrap_err();

    assert!(err.is_connectivity());
    assert!(!err.is_process_failure());
}

#[tokio::test]
async fn test_create_process_only_when_missing() {
    let api = FakeApi::new();
    api.push_status(Some("CLOSED"), Some("SUCCEEDED"));
    let (_, sleep) = recording_sleep();

    let mut req = request("web:1.0");
    req.create_process = Some("Install".to_string());
    Deployer::new(&api, PollOptions::default())
        .deploy_with(&req, sleep, no_cancel())
        .await
        .unwrap();

    let calls = api.calls();
    assert_eq!(calls[0], Call::GetApplicationProcess("Deploy All".to_string()));
    assert_eq!(calls[1], Call::CreateApplicationProcess("Deploy All".to_string()));
    assert_eq!(calls[2], Call::RequestApplicationProcess);

    let graph = &api.created_processes()[0];
    assert_eq!(graph["application"], "shop");
    assert_eq!(
        graph["rootActivity"]["children"][1]["componentProcessName"],
        "Install"
    );

    // existing process is left alone
    let existing = FakeApi::new();
    existing.add_process("Deploy All");
    existing.push_status(Some("CLOSED"), Some("SUCCEEDED"));
    let (_, sleep) = recording_sleep();
    Deployer::new(&existing, PollOptions::default())
        .deploy_with(&req, sleep, no_cancel())
        .await
        .unwrap();
    assert_eq!(
        existing.count(|c| matches!(c, Call::CreateApplicationProcess(_))),
        0
    );
}
