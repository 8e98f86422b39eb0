/// HTTP backend tests: status mapping, envelopes, timeouts and request shape.
mod common;

use std::time::Duration;

use serde_json::json;

use common::{MockServer, Reply, ok};
use deckgen::activity::ActivityLog;
use deckgen::api::types::IconRequest;
use deckgen::config::schema::ApiConfig;
use deckgen::{ApiError, Backend, HttpBackend};

fn backend(server: &MockServer) -> HttpBackend {
    let config = ApiConfig {
        base_url: format!("{}/", server.base_url),
        timeout_ms: 2_000,
        ..ApiConfig::default()
    };
    HttpBackend::from_config(&config, ActivityLog::disabled())
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[test]
fn non_2xx_uses_error_field() {
    let server = MockServer::start(|_| Reply::Json(400, json!({"error": "unknown style"})));
    let err = backend(&server)
        .generate_icon(&IconRequest {
            concept: "growth".to_string(),
            style: "flat".to_string(),
            color_scheme: None,
        })
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Status {
            code: 400,
            message: "unknown style".to_string()
        }
    );
}

#[test]
fn non_2xx_falls_back_to_message_then_status_line() {
    let server = MockServer::start(|req| match req.path.as_str() {
        "/api/batch/jobs" => Reply::Json(422, json!({"message": "bad filter"})),
        _ => Reply::Bytes(503, "text/plain", b"upstream down".to_vec()),
    });
    let backend = backend(&server);

    assert_eq!(backend.batch_jobs().unwrap_err().to_string(), "bad filter");
    assert_eq!(
        backend.cache_stats().unwrap_err().to_string(),
        "server error, status code 503"
    );
}

#[test]
fn success_false_is_rejected() {
    let server = MockServer::start(|_| ok(json!({"success": false, "error": "queue full"})));
    let err = backend(&server).process_queue().unwrap_err();
    assert_eq!(err, ApiError::Rejected("queue full".to_string()));
}

#[test]
fn missing_success_flag_is_rejected() {
    let server = MockServer::start(|_| ok(json!({"job_id": "j1"})));
    let err = backend(&server)
        .create_batch_job(&deckgen::api::types::CreateJobRequest {
            files: Vec::new(),
            job_type: "template_processing".to_string(),
            parameters: deckgen::api::types::JobParameters {
                priority: "normal".to_string(),
                user_id: "u".to_string(),
                timestamp: "t".to_string(),
            },
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Rejected(_)));
}

#[test]
fn malformed_body_is_a_decode_error() {
    let server = MockServer::start(|_| Reply::Bytes(200, "application/json", b"{oops".to_vec()));
    let err = backend(&server).batch_jobs().unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[test]
fn slow_backend_times_out() {
    let server = MockServer::start(|_| {
        Reply::Slow(
            Duration::from_millis(1_500),
            Box::new(ok(json!({"success": true, "jobs": []}))),
        )
    });
    let config = ApiConfig {
        base_url: server.base_url.clone(),
        timeout_ms: 200,
        ..ApiConfig::default()
    };
    let backend = HttpBackend::from_config(&config, ActivityLog::disabled());

    let err = backend.batch_jobs().unwrap_err();
    assert_eq!(err, ApiError::Timeout(Duration::from_millis(200)));
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ApiConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        timeout_ms: 1_000,
        ..ApiConfig::default()
    };
    let backend = HttpBackend::from_config(&config, ActivityLog::disabled());

    let err = backend.system_stats().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[test]
fn recommendations_pass_kind_as_query() {
    let server = MockServer::start(|_| ok(json!({"success": true, "recommendations": {}})));
    let backend = backend(&server);

    backend
        .personalized_recommendations("user-1", Some("typography"))
        .unwrap();
    backend.personalized_recommendations("user-1", None).unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/personalized-recommendations/user-1");
    assert_eq!(requests[0].query, "type=typography");
    assert_eq!(requests[1].query, "");
}

#[test]
fn chart_recommendations_wrap_the_sample() {
    let server = MockServer::start(|_| {
        ok(json!({"success": true, "recommended_chart_type": "line", "alternative_types": ["bar"]}))
    });

    let recs = backend(&server)
        .chart_recommendations(&json!([1, 2, 3]))
        .unwrap();

    assert_eq!(recs.recommended_chart_type, "line");
    assert_eq!(server.requests()[0].json(), json!({"data_sample": [1, 2, 3]}));
}

#[test]
fn job_status_reads_nested_job() {
    let server = MockServer::start(|_| {
        ok(json!({
            "success": true,
            "job": {"job_id": "j2", "status": "weird", "created_at": 1_700_000_000}
        }))
    });

    let job = backend(&server).job_status("j2").unwrap();

    assert_eq!(server.requests()[0].path, "/api/batch/job-status/j2");
    assert_eq!(job.status, deckgen::batch::jobs::JobStatus::Unknown);
    assert!(job.created_at_display().starts_with("2023-11-14"));
}

#[test]
fn requests_are_logged_with_status() {
    let server = MockServer::start(|_| Reply::Json(404, json!({"error": "no such user"})));
    let dir = tempfile::tempdir().unwrap();
    let log = ActivityLog::new(dir.path().join("activity.jsonl"));
    let config = ApiConfig {
        base_url: server.base_url.clone(),
        ..ApiConfig::default()
    };
    let backend = HttpBackend::from_config(&config, log.clone());

    let _ = backend.user_profile("ghost");

    let entries = log.read_recent(5);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].method, "GET");
    assert_eq!(entries[0].target, "/api/user-profile/ghost");
    assert_eq!(entries[0].status, Some(404));
    assert_eq!(entries[0].error.as_deref(), Some("no such user"));
}
