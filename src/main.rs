// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use gitpulse::config::settings::Settings;
use gitpulse::domain::services::orchestrator::StatsEngine;
use gitpulse::engines::fetcher::RateLimitedFetcher;
use gitpulse::infrastructure::sinks::build_sink;
use gitpulse::infrastructure::sources::JsonSource;
use gitpulse::utils::telemetry;
use gitpulse::workers::manager::WorkerSupervisor;
use gitpulse::workers::stats_worker::StatsWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动统计工作器
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging
    telemetry::init_telemetry(&settings.logging);
    info!("Starting gitpulse...");

    if settings.metrics.enabled {
        gitpulse::infrastructure::metrics::init_metrics(&settings.metrics.listen_addr);
    }

    // 3. Build the engine
    let fetcher = Arc::new(RateLimitedFetcher::from_settings(&settings)?);
    let projects = Arc::new(JsonSource::new(&settings.sources.projects, fetcher.clone()));
    let tokens = Arc::new(JsonSource::new(&settings.sources.tokens, fetcher.clone()));
    let sink = build_sink(&settings.sink)?;
    let engine = Arc::new(StatsEngine::new(
        &settings,
        fetcher,
        projects,
        tokens,
        sink,
        Handle::current(),
    )?);

    // 4. Start the worker and keep it alive
    let worker = Arc::new(StatsWorker::new(
        engine,
        Duration::from_secs(settings.worker.update_interval_secs),
    ));
    let mut supervisor = WorkerSupervisor::new(worker, Handle::current());
    supervisor.start();

    let mut ping = tokio::time::interval(Duration::from_secs(
        settings.worker.ping_interval_secs.max(1),
    ));
    loop {
        tokio::select! {
            _ = ping.tick() => {
                supervisor.ping();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    supervisor.shutdown();
    info!("gitpulse stopped");
    Ok(())
}
