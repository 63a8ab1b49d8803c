// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use gitpulse::config::settings::Settings;
use gitpulse::domain::models::summary::Summary;
use gitpulse::domain::repositories::summary_sink::{SinkError, SummarySink};
use gitpulse::domain::services::orchestrator::StatsEngine;
use gitpulse::engines::fetcher::RateLimitedFetcher;
use gitpulse::infrastructure::sources::JsonSource;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::runtime::Handle;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 记录全部输出的汇总
#[derive(Default)]
pub struct CapturingSink {
    pub emitted: Mutex<Vec<(String, Summary)>>,
}

impl CapturingSink {
    pub fn summaries(&self) -> Vec<(String, Summary)> {
        self.emitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummarySink for CapturingSink {
    async fn emit(&self, project_id: &str, summary: &Summary) -> Result<(), SinkError> {
        self.emitted
            .lock()
            .unwrap()
            .push((project_id.to_string(), summary.clone()));
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestEngine {
    pub engine: StatsEngine,
    pub sink: Arc<CapturingSink>,
    pub dir: TempDir,
}

fn write_json(dir: &Path, name: &str, value: &Value) -> String {
    let file = dir.join(name);
    std::fs::write(&file, serde_json::to_vec(value).unwrap()).unwrap();
    file.to_str().unwrap().to_string()
}

/// 构建指向模拟服务器的引擎，项目和令牌写入临时文件
pub fn build_engine(server: &MockServer, projects: Value, tokens: Value) -> TestEngine {
    let dir = tempfile::tempdir().unwrap();
    let projects_path = write_json(dir.path(), "projects.json", &projects);
    let tokens_path = write_json(dir.path(), "tokens.json", &tokens);

    let mut settings = Settings::from_defaults().unwrap();
    settings.api.base_url = server.uri();
    settings.token_pool.reset_buffer_secs = 0;

    let fetcher = Arc::new(RateLimitedFetcher::from_settings(&settings).unwrap());
    let sink = Arc::new(CapturingSink::default());
    let engine = StatsEngine::new(
        &settings,
        fetcher.clone(),
        Arc::new(JsonSource::new(&projects_path, fetcher.clone())),
        Arc::new(JsonSource::new(&tokens_path, fetcher)),
        sink.clone(),
        Handle::current(),
    )
    .unwrap();

    TestEngine { engine, sink, dir }
}

pub fn quota(remaining: u64) -> Value {
    json!({ "resources": { "core": { "remaining": remaining, "reset": 0 } } })
}

/// 令牌探测返回固定的剩余额度
pub async fn mount_quota(server: &MockServer, token: &str, remaining: u64) {
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(quota(remaining)))
        .mount(server)
        .await;
}

pub fn commit(sha: &str, date: &str, login: &str) -> Value {
    json!({
        "sha": sha,
        "commit": { "committer": { "date": date } },
        "committer": { "login": login },
    })
}

/// 挂载仓库元数据、分支和issue计数
pub async fn mount_repository(
    server: &MockServer,
    owner: &str,
    name: &str,
    stars: u64,
    size: u64,
    branches: &[&str],
    issues: (usize, usize),
) {
    let base = format!("/repos/{}/{}", owner, name);

    Mock::given(method("GET"))
        .and(path(base.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stargazers_count": stars,
            "fork": false,
            "created_at": "2020-01-01T00:00:00Z",
            "size": size,
        })))
        .mount(server)
        .await;

    let branches: Vec<_> = branches.iter().map(|b| json!({ "name": b })).collect();
    Mock::given(method("GET"))
        .and(path(format!("{}/branches", base).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(branches)))
        .mount(server)
        .await;

    for (state, count) in [("open", issues.0), ("closed", issues.1)] {
        let items: Vec<_> = (0..count).map(|n| json!({ "number": n })).collect();
        Mock::given(method("GET"))
            .and(path(format!("{}/issues", base).as_str()))
            .and(query_param("state", state))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(items)))
            .mount(server)
            .await;
    }
}
