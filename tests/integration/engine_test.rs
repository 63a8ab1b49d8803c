// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    build_engine, commit, mount_quota, mount_repository, quota,
};
use chrono::{Duration, SecondsFormat, Utc};
use gitpulse::domain::models::summary::IssueCounts;
use gitpulse::domain::services::orchestrator::EngineError;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[tokio::test]
async fn test_organization_run_produces_summary() {
    let server = MockServer::start().await;
    mount_quota(&server, "t1", 5000).await;

    Mock::given(method("GET"))
        .and(path("/users/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "type": "Organization" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/acme/repos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "name": "widget" }, { "name": "empty" }])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "login": "alice" },
            { "login": "bob" },
            { "login": "carol" },
        ])))
        .mount(&server)
        .await;

    mount_repository(&server, "acme", "widget", 7, 120, &["main", "dev"], (2, 1)).await;
    mount_repository(&server, "acme", "empty", 1, 0, &["main"], (0, 0)).await;

    let latest = days_ago(1);
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/commits"))
        .and(query_param("sha", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            commit("aaa", &days_ago(3), "alice"),
            commit("bbb", "2020-02-01T00:00:00Z", "bob"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/commits"))
        .and(query_param("sha", "dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            commit("ccc", &latest, "dave"),
            commit("aaa", &days_ago(3), "alice"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/empty/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let test = build_engine(
        &server,
        json!([{ "id": 1, "references": ["https://github.com/acme"] }]),
        json!(["t1"]),
    );
    let report = test.engine.run_once().await.unwrap();
    assert_eq!(report.completed, 1);
    assert!(report.failed.is_empty());

    let emitted = test.sink.summaries();
    assert_eq!(emitted.len(), 1);
    let (id, summary) = &emitted[0];
    assert_eq!(id, "1");
    assert_eq!(summary.stars, 8);
    assert_eq!(summary.branches, 3);
    assert_eq!(summary.commits, 3);
    assert_eq!(summary.commits_last_30d, 2);
    // alice, bob, carol, dave
    assert_eq!(summary.contributors, 4);
    assert_eq!(summary.issues, IssueCounts { open: 2, closed: 1 });
    assert_eq!(
        summary.last_commit.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        Some(latest)
    );
    assert!(summary.errors.is_empty());
}

#[tokio::test]
async fn test_rate_limit_rotates_token_and_restarts_project() {
    let server = MockServer::start().await;

    // t1 looks richest for the initial selection, then reports an empty quota
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quota(100)))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_quota(&server, "t1", 0).await;
    mount_quota(&server, "t2", 50).await;

    Mock::given(method("GET"))
        .and(path("/users/acme"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/acme"))
        .and(header("authorization", "Bearer t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "type": "User" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/acme/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "solo" }])))
        .mount(&server)
        .await;
    mount_repository(&server, "acme", "solo", 2, 0, &["main"], (1, 0)).await;

    let test = build_engine(
        &server,
        json!([{ "id": "p1", "references": ["https://github.com/acme"] }]),
        json!(["t1", "t2"]),
    );
    let report = test.engine.run_once().await.unwrap();
    assert_eq!(report.completed, 1);

    let emitted = test.sink.summaries();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].1.stars, 2);
    assert_eq!(emitted[0].1.issues.open, 1);
    // no committers or members, so the owner is counted
    assert_eq!(emitted[0].1.contributors, 1);
}

#[tokio::test]
async fn test_missing_reference_is_reported_in_summary() {
    let server = MockServer::start().await;
    mount_quota(&server, "t1", 5000).await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;
    mount_repository(&server, "acme", "solo", 4, 0, &["main"], (0, 0)).await;

    let test = build_engine(
        &server,
        json!([{
            "id": 9,
            "references": ["https://github.com/acme/ghost", "https://github.com/acme/solo"]
        }]),
        json!(["t1"]),
    );
    test.engine.run_once().await.unwrap();

    let emitted = test.sink.summaries();
    assert_eq!(emitted.len(), 1);
    let summary = &emitted[0].1;
    assert_eq!(summary.stars, 4);
    assert_eq!(summary.contributors, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].reference, "https://github.com/acme/ghost");
}

#[tokio::test]
async fn test_failed_project_does_not_stop_the_run() {
    let server = MockServer::start().await;
    mount_quota(&server, "t1", 5000).await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_repository(&server, "acme", "solo", 3, 0, &[], (0, 0)).await;

    let test = build_engine(
        &server,
        json!([
            { "id": "bad", "references": ["https://github.com/acme/broken"] },
            { "id": "good", "references": ["https://github.com/acme/solo"] }
        ]),
        json!(["t1"]),
    );
    let report = test.engine.run_once().await.unwrap();

    assert_eq!(report.completed, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "bad");

    let emitted = test.sink.summaries();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].0, "good");
}

#[tokio::test]
async fn test_all_tokens_invalid_aborts_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let test = build_engine(
        &server,
        json!([{ "id": 1, "references": ["https://github.com/acme"] }]),
        json!(["t1", "t2"]),
    );
    let result = test.engine.run_once().await;

    assert!(matches!(result, Err(EngineError::NoValidTokens)));
    assert!(test.sink.summaries().is_empty());
}

#[tokio::test]
async fn test_rate_limit_while_collecting_discards_the_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quota(100)))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_quota(&server, "t1", 0).await;
    mount_quota(&server, "t2", 50).await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/solo/issues"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(1)
        .expect(1..=2)
        .mount(&server)
        .await;
    mount_repository(&server, "acme", "solo", 5, 0, &["main"], (1, 0)).await;
    mount_repository(&server, "acme", "other", 2, 0, &["main"], (0, 3)).await;

    let test = build_engine(
        &server,
        json!([{
            "id": "p1",
            "references": ["https://github.com/acme/solo", "https://github.com/acme/other"]
        }]),
        json!(["t1", "t2"]),
    );
    let report = test.engine.run_once().await.unwrap();
    assert_eq!(report.completed, 1);

    let emitted = test.sink.summaries();
    assert_eq!(emitted.len(), 1);
    let summary = &emitted[0].1;
    assert_eq!(summary.stars, 7);
    assert_eq!(summary.branches, 2);
    assert_eq!(summary.issues, IssueCounts { open: 1, closed: 3 });
}

#[tokio::test]
async fn test_rejected_credential_is_removed_and_project_completes() {
    let server = MockServer::start().await;

    // initial probe and confirmation only; never probed again once removed
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quota(100)))
        .expect(2)
        .mount(&server)
        .await;
    mount_quota(&server, "t2", 50).await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/solo"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_repository(&server, "acme", "solo", 6, 0, &["main"], (0, 0)).await;

    let test = build_engine(
        &server,
        json!([{ "id": "p1", "references": ["https://github.com/acme/solo"] }]),
        json!(["t1", "t2"]),
    );
    let report = test.engine.run_once().await.unwrap();
    assert_eq!(report.completed, 1);

    let emitted = test.sink.summaries();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].1.stars, 6);
}

#[tokio::test]
async fn test_unrecognized_references_are_reported_without_requests() {
    let server = MockServer::start().await;
    mount_quota(&server, "t1", 5000).await;

    for unexpected in ["/repos/acme/widget", "/users/widget", "/users/acme"] {
        Mock::given(method("GET"))
            .and(path(unexpected))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "type": "User" })))
            .expect(0)
            .mount(&server)
            .await;
    }
    mount_repository(&server, "acme", "solo", 1, 0, &["main"], (0, 0)).await;

    let test = build_engine(
        &server,
        json!([{
            "id": "p1",
            "references": [
                "https://gitlab.com/acme/widget",
                "acme/widget",
                "https://github.com/acme/solo"
            ]
        }]),
        json!(["t1"]),
    );
    test.engine.run_once().await.unwrap();

    let emitted = test.sink.summaries();
    assert_eq!(emitted.len(), 1);
    let summary = &emitted[0].1;
    assert_eq!(summary.stars, 1);
    let rejected: Vec<_> = summary.errors.iter().map(|e| e.reference.as_str()).collect();
    assert_eq!(rejected, vec!["https://gitlab.com/acme/widget", "acme/widget"]);
}
