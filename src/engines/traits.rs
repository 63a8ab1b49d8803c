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

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// 请求错误类型
///
/// 抓取层只做分类，不做任何重试；恢复策略由调用方决定
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// 凭证无效 (401)
    #[error("Bad credentials: {url}")]
    Auth { url: String },
    /// 凭证配额耗尽 (403)
    #[error("Rate limit exceeded: {url}")]
    RateLimit { url: String },
    /// 资源不存在 (404)
    #[error("Not found: {url}")]
    NotFound { url: String },
    /// 网络、解析或其他非2xx错误
    #[error("Transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// 错误类别标签，用于日志和指标
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Auth { .. } => "auth",
            FetchError::RateLimit { .. } => "rate_limit",
            FetchError::NotFound { .. } => "not_found",
            FetchError::Transport(_) => "transport",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Transport(format!("invalid payload: {}", e))
    }
}

/// 抓取响应
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP状态码
    pub status: u16,
    /// 响应头
    pub headers: HeaderMap,
    /// 解析后的JSON内容，空响应体为 `Value::Null`
    pub payload: Value,
}

impl FetchResponse {
    /// 将响应内容反序列化为指定类型
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        Ok(serde_json::from_value(self.payload)?)
    }

    /// 响应内容作为数组返回
    pub fn into_items(self) -> Result<Vec<Value>, FetchError> {
        match self.payload {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(FetchError::Transport(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
