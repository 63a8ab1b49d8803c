// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::FetchError;
use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

/// Issue状态过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

/// 远程API地址构造器
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    base: String,
}

impl ApiEndpoints {
    /// 创建地址构造器
    ///
    /// `base_url` 可以带路径前缀（例如企业版的 `/api/v3`）
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Url::parse(base_url)
            .map_err(|e| FetchError::Transport(format!("invalid api base url {}: {}", base_url, e)))?;
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn rate_limit(&self) -> Result<String, FetchError> {
        self.build("rate_limit", &[])
    }

    pub fn account(&self, login: &str) -> Result<String, FetchError> {
        self.build(&format!("users/{}", login), &[])
    }

    pub fn account_repos(&self, login: &str) -> Result<String, FetchError> {
        self.build(&format!("users/{}/repos", login), &[])
    }

    pub fn org_members(&self, org: &str) -> Result<String, FetchError> {
        self.build(&format!("orgs/{}/members", org), &[])
    }

    pub fn repository(&self, owner: &str, name: &str) -> Result<String, FetchError> {
        self.build(&format!("repos/{}/{}", owner, name), &[])
    }

    pub fn branches(&self, owner: &str, name: &str) -> Result<String, FetchError> {
        self.build(&format!("repos/{}/{}/branches", owner, name), &[])
    }

    /// 某个分支的提交列表，`since` 用于截断fork之前继承的历史
    pub fn commits(
        &self,
        owner: &str,
        name: &str,
        branch: &str,
        since: Option<&DateTime<Utc>>,
    ) -> Result<String, FetchError> {
        let since = since.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
        let mut params = vec![("sha", branch)];
        if let Some(since) = since.as_deref() {
            params.push(("since", since));
        }
        self.build(&format!("repos/{}/{}/commits", owner, name), &params)
    }

    pub fn issues(&self, owner: &str, name: &str, state: IssueState) -> Result<String, FetchError> {
        self.build(
            &format!("repos/{}/{}/issues", owner, name),
            &[("state", state.as_str()), ("filter", "all")],
        )
    }

    fn build(&self, path: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let mut url = Url::parse(&format!("{}/{}", self.base, path))
            .map_err(|e| FetchError::Transport(format!("invalid url for {}: {}", path, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url.into())
    }
}
