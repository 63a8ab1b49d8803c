// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::summary::Summary;
use async_trait::async_trait;
use thiserror::Error;

/// 输出错误类型
#[derive(Error, Debug)]
pub enum SinkError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 汇总输出特质
///
/// 每次完成的项目尝试调用一次
#[async_trait]
pub trait SummarySink: Send + Sync {
    async fn emit(&self, project_id: &str, summary: &Summary) -> Result<(), SinkError>;
}
