// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::Settings;
use crate::engines::traits::{FetchError, FetchResponse};
use metrics::counter;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// 连接上下文
///
/// 与一个凭证绑定；凭证变化时整体替换，旧连接池随之关闭
struct Session {
    token: Option<String>,
    client: reqwest::Client,
}

/// 限流抓取器
///
/// 所有组件共享同一个并发信号量，任何时刻在途请求数不超过容量。
/// 抓取器只读取当前选中的凭证，凭证的选择和淘汰由令牌池负责。
pub struct RateLimitedFetcher {
    limiter: Arc<Semaphore>,
    session: RwLock<Session>,
    user_agent: String,
    timeout: Duration,
}

impl RateLimitedFetcher {
    /// 创建新的抓取器
    ///
    /// # 参数
    ///
    /// * `max_concurrency` - 同时在途的最大请求数
    /// * `user_agent` - 请求使用的User-Agent
    /// * `timeout` - 单个请求超时时间
    pub fn new(
        max_concurrency: usize,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let user_agent = user_agent.into();
        let client = build_client(&user_agent, timeout)?;

        Ok(Self {
            limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
            session: RwLock::new(Session {
                token: None,
                client,
            }),
            user_agent,
            timeout,
        })
    }

    /// 根据配置创建抓取器
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        Self::new(
            settings.fetcher.max_concurrency,
            settings.api.user_agent.clone(),
            Duration::from_secs(settings.api.request_timeout_secs),
        )
    }

    /// 当前空闲的并发槽位数
    pub fn available_permits(&self) -> usize {
        self.limiter.available_permits()
    }

    /// 当前用于请求的凭证
    pub fn current_credential(&self) -> Option<String> {
        self.session.read().token.clone()
    }

    /// 切换请求凭证
    ///
    /// 凭证变化时关闭旧的连接上下文并重新建立；相同凭证不做任何事。
    pub(crate) fn set_credential(&self, token: Option<&str>) -> Result<(), FetchError> {
        let mut session = self.session.write();
        if session.token.as_deref() == token {
            return Ok(());
        }

        let client = build_client(&self.user_agent, self.timeout)?;
        *session = Session {
            token: token.map(str::to_string),
            client,
        };
        debug!("Fetcher session reopened for a new credential");
        Ok(())
    }

    /// 执行GET请求
    ///
    /// 请求前先获取一个并发槽位，槽位不足时挂起当前任务。
    ///
    /// # 参数
    ///
    /// * `url` - 完整请求地址
    /// * `needs_auth` - 是否附带当前凭证
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 2xx响应
    /// * `Err(FetchError)` - 按状态码分类的错误
    pub async fn fetch(&self, url: &str, needs_auth: bool) -> Result<FetchResponse, FetchError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| FetchError::Transport("concurrency limiter closed".to_string()))?;

        let (client, token) = {
            let session = self.session.read();
            (session.client.clone(), session.token.clone())
        };

        let mut request = client.get(url);
        if needs_auth {
            if let Some(token) = token.as_deref() {
                request = request.bearer_auth(token);
            }
        }

        let start = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                counter!("gitpulse_http_requests_total", "status" => "error").increment(1);
                return Err(e.into());
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        debug!(
            "{} [{}] in {}ms",
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );
        counter!("gitpulse_http_requests_total", "status" => status_class(status)).increment(1);

        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(classify_failure(status, url, &body));
        }

        let payload = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body)?
        };

        Ok(FetchResponse {
            status: status.as_u16(),
            headers,
            payload,
        })
    }
}

fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

    Ok(reqwest::Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}

fn classify_failure(status: StatusCode, url: &str, body: &[u8]) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED => FetchError::Auth {
            url: url.to_string(),
        },
        StatusCode::FORBIDDEN => FetchError::RateLimit {
            url: url.to_string(),
        },
        StatusCode::NOT_FOUND => FetchError::NotFound {
            url: url.to_string(),
        },
        _ => FetchError::Transport(format!(
            "{} returned {}: {}",
            url,
            status.as_u16(),
            api_message(body)
        )),
    }
}

/// 从错误响应体中提取 `message` 字段
fn api_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).chars().take(200).collect())
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        200..=299 => "2xx",
        401 => "401",
        403 => "403",
        404 => "404",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
