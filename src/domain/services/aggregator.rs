// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::repo_stats::RepoStats;
use crate::domain::models::summary::{IssueCounts, ReferenceError, Summary};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::collections::HashSet;

/// 近期提交统计窗口（天）
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// 近期窗口起点：当天UTC零点往前30天
pub fn recent_threshold(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc() - Duration::days(RECENT_WINDOW_DAYS)
}

/// 合并仓库统计为项目汇总
///
/// 数值字段直接求和；提交只在仓库内去重，跨仓库相同sha会重复计数；
/// 贡献者（提交者、组织成员、仓库所有者）全局去重。
/// 贡献者集合为空时退化为仓库所有者的去重数。结果与仓库顺序无关。
pub fn merge(
    repo_stats: Vec<RepoStats>,
    direct_contributors: HashSet<String>,
    errors: Vec<ReferenceError>,
    now: DateTime<Utc>,
) -> Summary {
    let threshold = recent_threshold(now);
    let mut contributors = direct_contributors;
    let mut owners = HashSet::new();
    let mut issues = IssueCounts::default();
    let mut summary = Summary::default();

    for stats in repo_stats {
        summary.stars += stats.stars;
        summary.branches += stats.branches;
        summary.commits += stats.distinct_commits();
        issues += stats.issues;

        for committed_at in stats.commit_times() {
            if *committed_at >= threshold {
                summary.commits_last_30d += 1;
            }
            summary.last_commit = summary.last_commit.max(Some(*committed_at));
        }

        owners.insert(stats.repo.owner);
        contributors.extend(stats.contributors);
    }

    summary.issues = issues;
    summary.contributors = if contributors.is_empty() {
        owners.len() as u64
    } else {
        contributors.len() as u64
    };
    summary.errors = errors;
    summary
}
