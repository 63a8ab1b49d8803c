// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity::RepoRef;
use crate::domain::models::repo_stats::RepoStats;
use crate::domain::models::summary::IssueCounts;
use crate::engines::endpoints::{ApiEndpoints, IssueState};
use crate::engines::fetcher::RateLimitedFetcher;
use crate::engines::pagination::{first_page, next_page, PaginationResolver};
use crate::engines::traits::FetchError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// 仓库元数据
#[derive(Debug, Deserialize)]
struct RepoMetadata {
    stargazers_count: u64,
    #[serde(default)]
    fork: bool,
    created_at: DateTime<Utc>,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct Branch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitDetail,
    /// 关联的账号，作者未关联账号时为null
    committer: Option<Account>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Account {
    login: Option<String>,
}

/// 仓库统计采集器
pub struct RepoStatsCollector {
    fetcher: Arc<RateLimitedFetcher>,
    pagination: Arc<PaginationResolver>,
    endpoints: ApiEndpoints,
    commit_page_size: u32,
    listing_page_size: u32,
}

impl RepoStatsCollector {
    pub fn new(
        fetcher: Arc<RateLimitedFetcher>,
        pagination: Arc<PaginationResolver>,
        endpoints: ApiEndpoints,
        commit_page_size: u32,
        listing_page_size: u32,
    ) -> Self {
        Self {
            fetcher,
            pagination,
            endpoints,
            commit_page_size,
            listing_page_size,
        }
    }

    /// 采集单个仓库的统计
    ///
    /// 非空仓库遍历每个分支的完整提交历史，按sha在仓库内去重；
    /// fork只统计自身创建之后的提交。空仓库跳过提交遍历，不发出任何提交请求。
    pub async fn collect(&self, repo: &RepoRef) -> Result<RepoStats, FetchError> {
        let metadata: RepoMetadata = self
            .fetcher
            .fetch(&self.endpoints.repository(&repo.owner, &repo.name)?, true)
            .await?
            .parse()?;

        let branches = self
            .pagination
            .collect_all(
                &self.endpoints.branches(&repo.owner, &repo.name)?,
                self.listing_page_size,
            )
            .await?
            .into_iter()
            .map(serde_json::from_value::<Branch>)
            .collect::<Result<Vec<_>, _>>()?;

        let mut stats = RepoStats::new(repo.clone());
        stats.stars = metadata.stargazers_count;
        stats.branches = branches.len() as u64;

        if metadata.size > 0 {
            let since = metadata.fork.then_some(&metadata.created_at);
            for branch in &branches {
                self.walk_branch(&mut stats, &branch.name, since).await?;
            }
        } else {
            debug!("{} is empty, skipping commit history", repo);
        }

        stats.issues = self.issue_counts(repo).await?;

        debug!(
            "{}: {} stars, {} branches, {} commits, {} contributors",
            repo,
            stats.stars,
            stats.branches,
            stats.distinct_commits(),
            stats.contributors.len()
        );
        Ok(stats)
    }

    /// 逐页遍历分支的提交历史，每页记录完毕后才请求下一页
    async fn walk_branch(
        &self,
        stats: &mut RepoStats,
        branch: &str,
        since: Option<&DateTime<Utc>>,
    ) -> Result<(), FetchError> {
        let url = self
            .endpoints
            .commits(&stats.repo.owner, &stats.repo.name, branch, since)?;
        let mut next = Some(first_page(&url, self.commit_page_size)?);

        while let Some(url) = next {
            let response = self.fetcher.fetch(&url, true).await?;
            next = next_page(&response.headers);

            let page: Option<Vec<CommitItem>> = response.parse()?;
            for commit in page.unwrap_or_default() {
                let committed_at = commit.commit.committer.and_then(|c| c.date);
                stats.record_commit(&commit.sha, committed_at);

                if let Some(login) = commit.committer.and_then(|a| a.login) {
                    stats.contributors.insert(login);
                }
            }
        }
        Ok(())
    }

    async fn issue_counts(&self, repo: &RepoRef) -> Result<IssueCounts, FetchError> {
        let open_url = self
            .endpoints
            .issues(&repo.owner, &repo.name, IssueState::Open)?;
        let closed_url = self
            .endpoints
            .issues(&repo.owner, &repo.name, IssueState::Closed)?;

        let (open, closed) = futures::future::try_join(
            self.pagination.count(&open_url),
            self.pagination.count(&closed_url),
        )
        .await?;
        Ok(IssueCounts { open, closed })
    }
}

#[cfg(test)]
#[path = "repo_stats_collector_test.rs"]
mod tests;
