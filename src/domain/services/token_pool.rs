// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::source_repository::{SourceError, TokenSource};
use crate::engines::endpoints::ApiEndpoints;
use crate::engines::fetcher::RateLimitedFetcher;
use crate::engines::traits::FetchError;
use chrono::Utc;
use metrics::counter;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// 令牌池错误类型
///
/// 凭证无效的情况在池内部消化，不会出现在这里
#[derive(Error, Debug)]
pub enum TokenPoolError {
    /// 没有可用令牌
    #[error("No valid tokens left")]
    NoValidTokens,
    /// 令牌来源加载失败
    #[error("Token source error: {0}")]
    Source(#[from] SourceError),
    /// 配额探测失败
    #[error("Quota probe failed: {0}")]
    Probe(#[from] FetchError),
}

/// 单个令牌的配额快照，只在一次选择决策内有效
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenQuota {
    pub token: String,
    pub remaining: u64,
    /// 配额重置时间（Unix秒）
    pub reset: i64,
}

/// 选择结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenChoice {
    pub token: String,
    /// 返回前需要等待的时间
    pub wait: Option<Duration>,
}

/// 选择策略
///
/// 存在剩余配额大于 `min_remaining` 的令牌时选剩余配额最大的；
/// 否则选重置时间最早的，并等待 `|now - reset| + buffer`。
pub fn choose_token(
    candidates: &[TokenQuota],
    min_remaining: u64,
    reset_buffer: Duration,
    now: i64,
) -> Option<TokenChoice> {
    let richest = candidates
        .iter()
        .reduce(|best, q| if q.remaining > best.remaining { q } else { best })?;

    if richest.remaining > min_remaining {
        return Some(TokenChoice {
            token: richest.token.clone(),
            wait: None,
        });
    }

    let soonest = candidates
        .iter()
        .reduce(|best, q| if q.reset < best.reset { q } else { best })?;
    let wait = Duration::from_secs(now.abs_diff(soonest.reset)) + reset_buffer;

    Some(TokenChoice {
        token: soonest.token.clone(),
        wait: Some(wait),
    })
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: CoreQuota,
}

#[derive(Debug, Deserialize)]
struct CoreQuota {
    remaining: u64,
    reset: i64,
}

/// 令牌池管理器
///
/// 独占令牌状态：活跃集合来自令牌来源，移除集合在本次运行内只增不减。
/// 当前选中的令牌写入抓取器，抓取器本身只读。
pub struct TokenPoolManager {
    source: Arc<dyn TokenSource>,
    fetcher: Arc<RateLimitedFetcher>,
    endpoints: ApiEndpoints,
    removed: Mutex<HashSet<String>>,
    min_remaining: u64,
    reset_buffer: Duration,
}

impl TokenPoolManager {
    pub fn new(
        source: Arc<dyn TokenSource>,
        fetcher: Arc<RateLimitedFetcher>,
        endpoints: ApiEndpoints,
        min_remaining: u64,
        reset_buffer: Duration,
    ) -> Self {
        Self {
            source,
            fetcher,
            endpoints,
            removed: Mutex::new(HashSet::new()),
            min_remaining,
            reset_buffer,
        }
    }

    /// 选择一个可用令牌并设为抓取器的当前凭证
    ///
    /// 所有令牌都需要等待重置时会挂起调用方，返回前再次探测确认选中的令牌可用。
    pub async fn select(&self) -> Result<String, TokenPoolError> {
        loop {
            let active = self.active_tokens().await?;
            if active.is_empty() {
                return Err(TokenPoolError::NoValidTokens);
            }

            let mut candidates = Vec::with_capacity(active.len());
            for token in active {
                if let Some(quota) = self.probe(&token).await? {
                    candidates.push(quota);
                }
            }

            let Some(choice) = choose_token(
                &candidates,
                self.min_remaining,
                self.reset_buffer,
                Utc::now().timestamp(),
            ) else {
                // Every candidate was invalidated while probing
                continue;
            };

            if let Some(wait) = choice.wait {
                info!("All tokens are exhausted, waiting {}s for quota reset", wait.as_secs());
                tokio::time::sleep(wait).await;
            }

            if self.probe(&choice.token).await?.is_some() {
                counter!("gitpulse_token_selections_total").increment(1);
                return Ok(choice.token);
            }
        }
    }

    /// 将令牌移入移除集合，本次运行内不再考虑
    pub fn invalidate(&self, token: &str) {
        if self.removed.lock().insert(token.to_string()) {
            counter!("gitpulse_token_invalidations_total").increment(1);
            warn!("Token {} is invalid and was removed from the pool", mask(token));
        }
    }

    /// 已移除的令牌数
    pub fn removed_count(&self) -> usize {
        self.removed.lock().len()
    }

    async fn active_tokens(&self) -> Result<Vec<String>, TokenPoolError> {
        let tokens = self.source.load_tokens().await?;
        let removed = self.removed.lock().clone();

        let mut seen = HashSet::new();
        Ok(tokens
            .into_iter()
            .filter(|t| !t.is_empty() && !removed.contains(t))
            .filter(|t| seen.insert(t.clone()))
            .collect())
    }

    /// 用指定令牌探测配额
    ///
    /// 凭证无效时立即移除并返回 `None`
    async fn probe(&self, token: &str) -> Result<Option<TokenQuota>, TokenPoolError> {
        self.fetcher.set_credential(Some(token))?;

        match self.fetcher.fetch(&self.endpoints.rate_limit()?, true).await {
            Ok(response) => {
                let body: RateLimitBody = response.parse()?;
                Ok(Some(TokenQuota {
                    token: token.to_string(),
                    remaining: body.resources.core.remaining,
                    reset: body.resources.core.reset,
                }))
            }
            Err(FetchError::Auth { .. }) => {
                self.invalidate(token);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// 日志中只显示令牌末4位
fn mask(token: &str) -> String {
    let tail: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("***{}", tail)
}

#[cfg(test)]
#[path = "token_pool_test.rs"]
mod tests;
