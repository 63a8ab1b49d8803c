// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SinkSettings;
use crate::domain::models::summary::Summary;
use crate::domain::repositories::summary_sink::{SinkError, SummarySink};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// 以结构化日志输出汇总
pub struct LogSink;

#[async_trait]
impl SummarySink for LogSink {
    async fn emit(&self, project_id: &str, summary: &Summary) -> Result<(), SinkError> {
        let body = serde_json::to_string(summary)?;
        info!(project_id = %project_id, summary = %body, "Project summary");
        Ok(())
    }
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    project_id: &'a str,
    emitted_at: DateTime<Utc>,
    summary: &'a Summary,
}

/// 以JSON Lines追加写入文件
pub struct JsonLinesSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl SummarySink for JsonLinesSink {
    async fn emit(&self, project_id: &str, summary: &Summary) -> Result<(), SinkError> {
        let record = SummaryRecord {
            project_id,
            emitted_at: Utc::now(),
            summary,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// 根据配置创建输出
pub fn build_sink(settings: &SinkSettings) -> Result<Arc<dyn SummarySink>, SinkError> {
    match settings.kind.as_str() {
        "jsonl" => {
            let path = settings.path.clone().ok_or_else(|| {
                SinkError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "sink.path is required for the jsonl sink",
                ))
            })?;
            Ok(Arc::new(JsonLinesSink::new(path)))
        }
        "log" => Ok(Arc::new(LogSink)),
        other => Err(SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("unknown sink kind: {}", other),
        ))),
    }
}
