// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?github\.com/([\w.\-]+)(?:/([\w.\-]+))?/?$")
        .expect("reference pattern is valid")
});

/// 仓库标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// 引用解析出的实体
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entity {
    /// 个人账号
    User(String),
    /// 组织账号
    Organization(String),
    /// 单个仓库
    Repository(RepoRef),
}

/// 引用地址的语法解析结果，尚未经过远程确认
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub owner: String,
    pub name: Option<String>,
}

/// 解析 `[https://]github.com/<owner>[/<name>][/]` 形式的引用地址
///
/// 其他主机和不带主机的 `owner/name` 都不接受。仓库名末尾的一个 `.git` 会被去掉
pub fn parse_reference(reference: &str) -> Option<ParsedReference> {
    let captures = REFERENCE_PATTERN.captures(reference.trim())?;
    let owner = captures.get(1)?.as_str().to_string();
    let name = captures
        .get(2)
        .map(|m| {
            let name = m.as_str();
            name.strip_suffix(".git").unwrap_or(name).to_string()
        })
        .filter(|name| !name.is_empty());

    Some(ParsedReference { owner, name })
}
