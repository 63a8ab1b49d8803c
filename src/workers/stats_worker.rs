// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::orchestrator::StatsEngine;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// 统计工作器
///
/// 每个周期执行一次完整的统计运行
pub struct StatsWorker {
    engine: Arc<StatsEngine>,
    interval: Duration,
}

impl StatsWorker {
    pub fn new(engine: Arc<StatsEngine>, interval: Duration) -> Self {
        Self { engine, interval }
    }
}

#[async_trait]
impl Worker for StatsWorker {
    async fn run_cycle(&self) -> Result<(), WorkerError> {
        let started = Instant::now();
        let report = self
            .engine
            .run_once()
            .await
            .map_err(|e| WorkerError::EngineError(e.to_string()))?;

        info!(
            "Stats run finished in {:.1}s: {} completed, {} failed",
            started.elapsed().as_secs_f64(),
            report.completed,
            report.failed.len()
        );
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn name(&self) -> &str {
        "stats"
    }
}
