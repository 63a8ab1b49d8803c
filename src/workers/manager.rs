// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::workers::worker::Worker;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 工作器监管者
///
/// 在后台任务中运行工作器；存活检查发现任务已退出时重新启动
pub struct WorkerSupervisor {
    worker: Arc<dyn Worker>,
    runtime: Handle,
    handle: Option<JoinHandle<()>>,
    restarts: u64,
}

impl WorkerSupervisor {
    pub fn new(worker: Arc<dyn Worker>, runtime: Handle) -> Self {
        Self {
            worker,
            runtime,
            handle: None,
            restarts: 0,
        }
    }

    /// 启动后台任务
    pub fn start(&mut self) {
        let worker = self.worker.clone();
        let handle = self.runtime.spawn(async move {
            match worker.run().await {
                Ok(()) => warn!("Worker {} exited", worker.name()),
                Err(e) => error!("Worker {} failed: {}", worker.name(), e),
            }
        });
        self.handle = Some(handle);
        info!("Worker {} started", self.worker.name());
    }

    /// 后台任务是否仍在运行
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 存活检查，任务已退出时重启
    ///
    /// 返回本次是否发生了重启
    pub fn ping(&mut self) -> bool {
        if self.is_active() {
            return false;
        }

        warn!("Worker {} is not running, restarting", self.worker.name());
        self.restarts += 1;
        self.start();
        true
    }

    /// 累计重启次数
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// 停止后台任务
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        info!("Worker {} shut down", self.worker.name());
    }
}
