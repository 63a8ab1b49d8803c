// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::entity::RepoRef;
use crate::domain::models::project::Project;
use crate::domain::models::repo_stats::RepoStats;
use crate::domain::models::summary::{ReferenceError, Summary};
use crate::domain::repositories::source_repository::{ProjectSource, SourceError, TokenSource};
use crate::domain::repositories::summary_sink::{SinkError, SummarySink};
use crate::domain::services::aggregator;
use crate::domain::services::entity_resolver::{EntityResolver, Expansion, ResolveError};
use crate::domain::services::repo_stats_collector::RepoStatsCollector;
use crate::domain::services::token_pool::{TokenPoolError, TokenPoolManager};
use crate::engines::endpoints::ApiEndpoints;
use crate::engines::fetcher::RateLimitedFetcher;
use crate::engines::pagination::PaginationResolver;
use crate::engines::traits::FetchError;
use chrono::Utc;
use metrics::counter;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 令牌池耗尽，本次运行剩余项目全部放弃
    #[error("No valid tokens left")]
    NoValidTokens,
    /// 单个项目的终止性失败
    #[error("Project {project} failed: {source}")]
    Project { project: String, source: FetchError },
    /// 轮换次数超过上限
    #[error("Project {project} gave up after {attempts} attempts")]
    AttemptsExhausted { project: String, attempts: u32 },
    /// 请求失败
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    /// 数据源加载失败
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    /// 汇总输出失败
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

impl From<TokenPoolError> for EngineError {
    fn from(e: TokenPoolError) -> Self {
        match e {
            TokenPoolError::NoValidTokens => EngineError::NoValidTokens,
            TokenPoolError::Source(e) => EngineError::Source(e),
            TokenPoolError::Probe(e) => EngineError::Fetch(e),
        }
    }
}

/// 项目尝试的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Resolving,
    Collecting,
    Aggregating,
    Done,
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttemptState::Resolving => write!(f, "resolving"),
            AttemptState::Collecting => write!(f, "collecting"),
            AttemptState::Aggregating => write!(f, "aggregating"),
            AttemptState::Done => write!(f, "done"),
        }
    }
}

/// 状态及其携带的中间数据
enum Phase {
    Resolving,
    Collecting {
        expansion: Expansion,
        errors: Vec<ReferenceError>,
    },
    Aggregating {
        stats: Vec<RepoStats>,
        contributors: HashSet<String>,
        errors: Vec<ReferenceError>,
    },
    Done(Summary),
}

impl Phase {
    fn state(&self) -> AttemptState {
        match self {
            Phase::Resolving => AttemptState::Resolving,
            Phase::Collecting { .. } => AttemptState::Collecting,
            Phase::Aggregating { .. } => AttemptState::Aggregating,
            Phase::Done(_) => AttemptState::Done,
        }
    }
}

/// 一次运行的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// 已输出汇总的项目数
    pub completed: usize,
    /// 失败的项目及原因
    pub failed: Vec<(String, String)>,
}

/// 统计引擎
///
/// 逐个处理项目：解析引用 → 并发采集仓库 → 聚合 → 输出。
/// 速率限制或凭证失效时轮换令牌并从头重新开始该项目，上一次尝试的结果全部丢弃。
pub struct StatsEngine {
    fetcher: Arc<RateLimitedFetcher>,
    endpoints: ApiEndpoints,
    resolver: EntityResolver,
    collector: Arc<RepoStatsCollector>,
    projects: Arc<dyn ProjectSource>,
    tokens: Arc<dyn TokenSource>,
    sink: Arc<dyn SummarySink>,
    runtime: Handle,
    max_attempts: u32,
    min_remaining: u64,
    reset_buffer: Duration,
}

impl StatsEngine {
    /// 创建统计引擎
    ///
    /// # 参数
    ///
    /// * `runtime` - 仓库采集任务所使用的执行器
    pub fn new(
        settings: &Settings,
        fetcher: Arc<RateLimitedFetcher>,
        projects: Arc<dyn ProjectSource>,
        tokens: Arc<dyn TokenSource>,
        sink: Arc<dyn SummarySink>,
        runtime: Handle,
    ) -> Result<Self, FetchError> {
        let endpoints = ApiEndpoints::new(&settings.api.base_url)?;
        let pagination = Arc::new(PaginationResolver::new(fetcher.clone()));
        let resolver = EntityResolver::new(
            fetcher.clone(),
            pagination.clone(),
            endpoints.clone(),
            settings.api.listing_page_size,
        );
        let collector = Arc::new(RepoStatsCollector::new(
            fetcher.clone(),
            pagination,
            endpoints.clone(),
            settings.api.commit_page_size,
            settings.api.listing_page_size,
        ));

        Ok(Self {
            fetcher,
            endpoints,
            resolver,
            collector,
            projects,
            tokens,
            sink,
            runtime,
            max_attempts: settings.orchestrator.max_attempts.max(1),
            min_remaining: settings.token_pool.min_remaining,
            reset_buffer: Duration::from_secs(settings.token_pool.reset_buffer_secs),
        })
    }

    /// 执行一次完整运行
    ///
    /// 令牌池在每次运行开始时重建；单个项目失败不影响后续项目，
    /// 只有令牌耗尽会终止本次运行。
    pub async fn run_once(&self) -> Result<RunReport, EngineError> {
        self.fetcher.set_credential(None)?;
        let projects = self.projects.load_projects().await?;
        info!("Starting run over {} projects", projects.len());

        let pool = TokenPoolManager::new(
            self.tokens.clone(),
            self.fetcher.clone(),
            self.endpoints.clone(),
            self.min_remaining,
            self.reset_buffer,
        );
        pool.select().await?;

        let mut report = RunReport::default();
        for project in &projects {
            match self.process_project(&pool, project).await {
                Ok(summary) => match self.sink.emit(&project.id, &summary).await {
                    Ok(()) => {
                        counter!("gitpulse_projects_total", "outcome" => "completed").increment(1);
                        report.completed += 1;
                    }
                    Err(e) => {
                        error!("Project {}: failed to emit summary: {}", project.id, e);
                        counter!("gitpulse_projects_total", "outcome" => "failed").increment(1);
                        report.failed.push((project.id.clone(), e.to_string()));
                    }
                },
                Err(EngineError::NoValidTokens) => {
                    error!(
                        "Project {}: no valid tokens left, aborting the remaining projects",
                        project.id
                    );
                    return Err(EngineError::NoValidTokens);
                }
                Err(e) => {
                    error!(project = %project.id, "Project failed: {}", e);
                    counter!("gitpulse_projects_total", "outcome" => "failed").increment(1);
                    report.failed.push((project.id.clone(), e.to_string()));
                }
            }
        }

        info!(
            "Run finished: {} completed, {} failed",
            report.completed,
            report.failed.len()
        );
        Ok(report)
    }

    /// 处理单个项目直到完成或终止
    pub async fn process_project(
        &self,
        pool: &TokenPoolManager,
        project: &Project,
    ) -> Result<Summary, EngineError> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let err = match self.attempt(project).await {
                Ok(summary) => return Ok(summary),
                Err(e) => e,
            };

            match err {
                FetchError::RateLimit { url } => {
                    warn!(
                        "Project {}: rate limit hit at {}, rotating token",
                        project.id, url
                    );
                    counter!("gitpulse_rate_limit_rotations_total").increment(1);
                }
                FetchError::Auth { url } => {
                    warn!("Project {}: credential rejected at {}", project.id, url);
                    if let Some(token) = self.fetcher.current_credential() {
                        pool.invalidate(&token);
                    }
                }
                other => {
                    return Err(EngineError::Project {
                        project: project.id.clone(),
                        source: other,
                    });
                }
            }

            if attempts >= self.max_attempts {
                return Err(EngineError::AttemptsExhausted {
                    project: project.id.clone(),
                    attempts,
                });
            }
            pool.select().await?;
        }
    }

    /// 单次尝试：RESOLVING → COLLECTING → AGGREGATING → DONE
    async fn attempt(&self, project: &Project) -> Result<Summary, FetchError> {
        let mut phase = Phase::Resolving;

        loop {
            debug!("Project {}: {}", project.id, phase.state());
            phase = match phase {
                Phase::Resolving => {
                    let (expansion, errors) = self.resolve_references(project).await?;
                    Phase::Collecting { expansion, errors }
                }
                Phase::Collecting { expansion, errors } => {
                    let stats = self.collect_repositories(&expansion.repositories).await?;
                    Phase::Aggregating {
                        stats,
                        contributors: expansion.contributors,
                        errors,
                    }
                }
                Phase::Aggregating {
                    stats,
                    contributors,
                    errors,
                } => Phase::Done(aggregator::merge(stats, contributors, errors, Utc::now())),
                Phase::Done(summary) => return Ok(summary),
            };
        }
    }

    /// 解析全部引用；不存在或无法识别的引用记为诊断信息后跳过
    async fn resolve_references(
        &self,
        project: &Project,
    ) -> Result<(Expansion, Vec<ReferenceError>), FetchError> {
        let mut expansion = Expansion::default();
        let mut errors = Vec::new();

        for reference in &project.references {
            match self.resolver.resolve(reference).await {
                Ok(resolved) => expansion.absorb(resolved),
                Err(e) => match e {
                    ResolveError::Fetch(FetchError::NotFound { .. })
                    | ResolveError::InvalidReference(_) => {
                        warn!("Project {}: skipping {}: {}", project.id, reference, e);
                        errors.push(ReferenceError {
                            reference: reference.clone(),
                            reason: e.to_string(),
                        });
                    }
                    ResolveError::Fetch(e) => return Err(e),
                },
            }
        }

        Ok((expansion, errors))
    }

    /// 每个仓库一个任务并发采集，任一失败即中止其余任务
    async fn collect_repositories(
        &self,
        repositories: &BTreeSet<RepoRef>,
    ) -> Result<Vec<RepoStats>, FetchError> {
        let mut tasks = JoinSet::new();
        for repo in repositories {
            let collector = self.collector.clone();
            let repo = repo.clone();
            tasks.spawn_on(async move { collector.collect(&repo).await }, &self.runtime);
        }

        let mut results = Vec::with_capacity(repositories.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(stats)) => results.push(stats),
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(FetchError::Transport(format!(
                        "repository task failed: {}",
                        e
                    )));
                }
            }
        }

        Ok(results)
    }
}
