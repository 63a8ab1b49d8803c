// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity::{parse_reference, Entity, RepoRef};
use crate::engines::endpoints::ApiEndpoints;
use crate::engines::fetcher::RateLimitedFetcher;
use crate::engines::pagination::PaginationResolver;
use crate::engines::traits::FetchError;
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// 引用解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// 引用地址无法解析
    #[error("Unrecognized reference: {0}")]
    InvalidReference(String),
    /// 远程请求失败
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// 一个引用展开后的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// `(owner, name)` 仓库集合
    pub repositories: BTreeSet<RepoRef>,
    /// 直接得到的贡献者（组织成员、仓库所有者）
    pub contributors: HashSet<String>,
}

impl Expansion {
    /// 并入另一个展开结果
    pub fn absorb(&mut self, other: Expansion) {
        self.repositories.extend(other.repositories);
        self.contributors.extend(other.contributors);
    }
}

#[derive(Debug, Deserialize)]
struct Account {
    #[serde(rename = "type")]
    account_type: String,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Member {
    login: String,
}

/// 实体解析器
///
/// 将引用地址分类为用户、组织或仓库，并展开为仓库集合
pub struct EntityResolver {
    fetcher: Arc<RateLimitedFetcher>,
    pagination: Arc<PaginationResolver>,
    endpoints: ApiEndpoints,
    listing_page_size: u32,
}

impl EntityResolver {
    pub fn new(
        fetcher: Arc<RateLimitedFetcher>,
        pagination: Arc<PaginationResolver>,
        endpoints: ApiEndpoints,
        listing_page_size: u32,
    ) -> Self {
        Self {
            fetcher,
            pagination,
            endpoints,
            listing_page_size,
        }
    }

    /// 分类并展开一个引用
    pub async fn resolve(&self, reference: &str) -> Result<Expansion, ResolveError> {
        let entity = self.classify(reference).await?;
        debug!("{} resolved to {:?}", reference, entity);
        Ok(self.expand(&entity).await?)
    }

    /// 分类引用地址
    ///
    /// 带仓库名的引用通过一次查询确认仓库存在（不存在时返回 `NotFound`）；
    /// 只有账号的引用按账号类型区分用户和组织。
    pub async fn classify(&self, reference: &str) -> Result<Entity, ResolveError> {
        let parsed = parse_reference(reference)
            .ok_or_else(|| ResolveError::InvalidReference(reference.to_string()))?;

        if let Some(name) = parsed.name {
            self.fetcher
                .fetch(&self.endpoints.repository(&parsed.owner, &name)?, true)
                .await?;
            return Ok(Entity::Repository(RepoRef::new(parsed.owner, name)));
        }

        let account: Account = self
            .fetcher
            .fetch(&self.endpoints.account(&parsed.owner)?, true)
            .await?
            .parse()?;

        if account.account_type == "Organization" {
            Ok(Entity::Organization(parsed.owner))
        } else {
            Ok(Entity::User(parsed.owner))
        }
    }

    /// 展开实体
    ///
    /// 用户和组织展开为其名下全部仓库；组织另外把成员计入贡献者；
    /// 单个仓库直接加入，并把所有者计入贡献者。
    pub async fn expand(&self, entity: &Entity) -> Result<Expansion, FetchError> {
        let mut expansion = Expansion::default();

        match entity {
            Entity::User(login) => {
                self.add_owned_repositories(login, &mut expansion).await?;
            }
            Entity::Organization(login) => {
                self.add_owned_repositories(login, &mut expansion).await?;

                let members = self
                    .pagination
                    .collect_all(&self.endpoints.org_members(login)?, self.listing_page_size)
                    .await?;
                for member in members {
                    let member: Member = serde_json::from_value(member)?;
                    expansion.contributors.insert(member.login);
                }
            }
            Entity::Repository(repo) => {
                expansion.contributors.insert(repo.owner.clone());
                expansion.repositories.insert(repo.clone());
            }
        }

        Ok(expansion)
    }

    async fn add_owned_repositories(
        &self,
        login: &str,
        expansion: &mut Expansion,
    ) -> Result<(), FetchError> {
        let repos = self
            .pagination
            .collect_all(&self.endpoints.account_repos(login)?, self.listing_page_size)
            .await?;

        for repo in repos {
            let repo: NamedItem = serde_json::from_value(repo)?;
            expansion.repositories.insert(RepoRef::new(login, repo.name));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "entity_resolver_test.rs"]
mod tests;
