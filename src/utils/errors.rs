// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("引擎错误: {0}")]
    EngineError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}
