// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Issue计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub open: u64,
    pub closed: u64,
}

impl AddAssign for IssueCounts {
    fn add_assign(&mut self, other: Self) {
        self.open += other.open;
        self.closed += other.closed;
    }
}

/// 引用解析失败的诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceError {
    pub reference: String,
    pub reason: String,
}

/// 项目级汇总
///
/// 每次完成的项目尝试（可能带有引用错误）产出一份
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// 星标总数
    pub stars: u64,
    /// 分支总数
    pub branches: u64,
    /// 各仓库内去重后的提交数之和
    pub commits: u64,
    /// 全局去重后的贡献者数
    pub contributors: u64,
    /// Issue计数
    pub issues: IssueCounts,
    /// 最近一次提交时间
    pub last_commit: Option<DateTime<Utc>>,
    /// 近30天的提交数
    pub commits_last_30d: u64,
    /// 引用解析错误
    pub errors: Vec<ReferenceError>,
}
