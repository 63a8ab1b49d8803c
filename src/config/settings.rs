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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含远程API、抓取并发、令牌池、数据源、工作器、输出和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 远程API配置
    pub api: ApiSettings,
    /// 抓取器配置
    pub fetcher: FetcherSettings,
    /// 令牌池配置
    pub token_pool: TokenPoolSettings,
    /// 数据源配置
    pub sources: SourceSettings,
    /// 工作器配置
    pub worker: WorkerSettings,
    /// 编排器配置
    pub orchestrator: OrchestratorSettings,
    /// 输出配置
    pub sink: SinkSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 日志配置
    pub logging: LoggingSettings,
}

/// 远程API配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// API根地址
    pub base_url: String,
    /// 请求User-Agent
    pub user_agent: String,
    /// 单个请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 提交遍历的分页大小
    pub commit_page_size: u32,
    /// 仓库、成员、分支列表的分页大小
    pub listing_page_size: u32,
}

/// 抓取器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherSettings {
    /// 全局最大并发请求数
    pub max_concurrency: usize,
}

/// 令牌池配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPoolSettings {
    /// 剩余配额高于该值时按最大剩余配额选择
    pub min_remaining: u64,
    /// 等待配额重置时额外的缓冲时间（秒）
    pub reset_buffer_secs: u64,
}

/// 数据源配置设置
///
/// 值可以是 http(s) 地址，也可以是本地文件路径
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    /// 项目列表来源
    pub projects: String,
    /// 令牌列表来源
    pub tokens: String,
}

/// 工作器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    /// 两次运行开始之间的间隔（秒）
    pub update_interval_secs: u64,
    /// 存活检查间隔（秒）
    pub ping_interval_secs: u64,
}

/// 编排器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSettings {
    /// 单个项目在一次运行内的最大尝试次数
    pub max_attempts: u32,
}

/// 输出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SinkSettings {
    /// 输出类型 (log, jsonl)
    pub kind: String,
    /// jsonl 文件路径 (当 kind=jsonl 时使用)
    pub path: Option<String>,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启动Prometheus导出器
    pub enabled: bool,
    /// 导出器监听地址
    pub listen_addr: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 输出格式 (text, json)
    pub format: String,
    /// `RUST_LOG` 未设置时使用的过滤规则
    pub filter: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、配置文件和环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("GITPULSE").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 仅使用内置默认值的配置
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Remote API
            .set_default("api.base_url", "https://api.github.com")?
            .set_default("api.user_agent", "gitpulse")?
            .set_default("api.request_timeout_secs", 30)?
            .set_default("api.commit_page_size", 100)?
            .set_default("api.listing_page_size", 100)?
            // Fetcher
            .set_default("fetcher.max_concurrency", 5)?
            // Token pool
            .set_default("token_pool.min_remaining", 10)?
            .set_default("token_pool.reset_buffer_secs", 5)?
            // Sources
            .set_default("sources.projects", "config/projects.json")?
            .set_default("sources.tokens", "config/tokens.json")?
            // Worker
            .set_default("worker.update_interval_secs", 600)?
            .set_default("worker.ping_interval_secs", 10)?
            // Orchestrator
            .set_default("orchestrator.max_attempts", 20)?
            // Sink
            .set_default("sink.kind", "log")?
            // Metrics
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            // Logging
            .set_default("logging.format", "text")?
            .set_default("logging.filter", "info,gitpulse=debug")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
