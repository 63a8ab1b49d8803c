// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::project::Project;
use crate::engines::traits::FetchError;
use async_trait::async_trait;
use thiserror::Error;

/// 数据源错误类型
#[derive(Error, Debug)]
pub enum SourceError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 远程数据源请求失败
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    /// 数据格式错误
    #[error("Invalid source data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 项目列表来源特质
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// 加载当前的项目列表
    async fn load_projects(&self) -> Result<Vec<Project>, SourceError>;
}

/// 令牌列表来源特质
///
/// 引擎只读取令牌，从不回写
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// 加载当前的令牌列表
    async fn load_tokens(&self) -> Result<Vec<String>, SourceError>;
}
