// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity::RepoRef;
use crate::domain::models::summary::IssueCounts;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// 单个仓库的统计结果
///
/// 只在聚合前存在；提交以sha为键在仓库内去重，时间戳仅作信息保留
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStats {
    pub repo: RepoRef,
    pub stars: u64,
    pub branches: u64,
    pub commits: HashMap<String, Option<DateTime<Utc>>>,
    pub contributors: HashSet<String>,
    pub issues: IssueCounts,
}

impl RepoStats {
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            stars: 0,
            branches: 0,
            commits: HashMap::new(),
            contributors: HashSet::new(),
            issues: IssueCounts::default(),
        }
    }

    /// 记录一个提交，返回是否为新提交
    ///
    /// 同一sha再次出现时保留首次记录的时间戳
    pub fn record_commit(&mut self, sha: &str, committed_at: Option<DateTime<Utc>>) -> bool {
        if self.commits.contains_key(sha) {
            return false;
        }
        self.commits.insert(sha.to_string(), committed_at);
        true
    }

    /// 仓库内去重后的提交数
    pub fn distinct_commits(&self) -> u64 {
        self.commits.len() as u64
    }

    /// 所有已知的提交时间
    pub fn commit_times(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.commits.values().flatten()
    }
}
