// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info};

/// 周期性工作器
///
/// 实现方只提供单次周期的逻辑和间隔；`run` 按开始到开始的节奏重复执行，
/// 单次失败记录日志后继续下一周期。
#[async_trait]
pub trait Worker: Send + Sync {
    /// 执行一个周期
    async fn run_cycle(&self) -> Result<(), WorkerError>;

    /// 两个周期开始之间的间隔
    fn interval(&self) -> Duration;

    /// 获取工作器名称
    fn name(&self) -> &str;

    /// 运行工作器，正常情况下不会返回
    async fn run(&self) -> Result<(), WorkerError> {
        info!(
            "Worker {} started, interval {}s",
            self.name(),
            self.interval().as_secs()
        );
        loop {
            let started = Instant::now();
            if let Err(e) = self.run_cycle().await {
                error!("Worker {} cycle failed: {}", self.name(), e);
            }
            tokio::time::sleep(remaining_interval(started.elapsed(), self.interval())).await;
        }
    }
}

/// 本周期剩余时间，超时运行不等待
pub fn remaining_interval(elapsed: Duration, interval: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}
