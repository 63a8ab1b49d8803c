// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::project::Project;
use crate::domain::repositories::source_repository::{ProjectSource, SourceError, TokenSource};
use crate::engines::fetcher::RateLimitedFetcher;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// JSON数据位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonLocation {
    /// 远程地址，不带凭证请求
    Remote(String),
    /// 本地文件
    File(PathBuf),
}

impl JsonLocation {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            JsonLocation::Remote(location.to_string())
        } else {
            JsonLocation::File(PathBuf::from(location))
        }
    }
}

/// JSON数据源
///
/// 同一个实现既可作为项目来源，也可作为令牌来源
pub struct JsonSource {
    location: JsonLocation,
    fetcher: Arc<RateLimitedFetcher>,
}

impl JsonSource {
    pub fn new(location: &str, fetcher: Arc<RateLimitedFetcher>) -> Self {
        Self {
            location: JsonLocation::parse(location),
            fetcher,
        }
    }

    async fn load<T: DeserializeOwned>(&self) -> Result<T, SourceError> {
        match &self.location {
            JsonLocation::Remote(url) => {
                debug!("Loading {}", url);
                Ok(self.fetcher.fetch(url, false).await?.parse()?)
            }
            JsonLocation::File(path) => {
                debug!("Loading {}", path.display());
                let raw = tokio::fs::read(path).await?;
                Ok(serde_json::from_slice(&raw)?)
            }
        }
    }
}

#[async_trait]
impl ProjectSource for JsonSource {
    async fn load_projects(&self) -> Result<Vec<Project>, SourceError> {
        let projects: Vec<Project> = self.load().await?;
        Ok(projects
            .into_iter()
            .filter(|p| !p.references.is_empty())
            .collect())
    }
}

#[async_trait]
impl TokenSource for JsonSource {
    async fn load_tokens(&self) -> Result<Vec<String>, SourceError> {
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::time::Duration;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Arc<RateLimitedFetcher> {
        Arc::new(RateLimitedFetcher::new(2, "gitpulse-test", Duration::from_secs(10)).unwrap())
    }

    #[test]
    fn test_location_parsing() {
        assert_eq!(
            JsonLocation::parse("https://example.com/tokens.json"),
            JsonLocation::Remote("https://example.com/tokens.json".to_string())
        );
        assert_eq!(
            JsonLocation::parse("config/tokens.json"),
            JsonLocation::File(PathBuf::from("config/tokens.json"))
        );
    }

    #[tokio::test]
    async fn test_projects_from_file_skip_empty_references() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 1, "references": ["https://github.com/acme"]}}, {{"id": 2, "references": []}}]"#
        )
        .unwrap();

        let source = JsonSource::new(file.path().to_str().unwrap(), fetcher());
        let projects = source.load_projects().await.unwrap();

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "1");
    }

    #[tokio::test]
    async fn test_tokens_from_remote_without_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokens.json"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tokens.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["a", "b"])))
            .mount(&server)
            .await;

        let fetcher = fetcher();
        fetcher.set_credential(Some("secret")).unwrap();
        let source = JsonSource::new(&format!("{}/tokens.json", server.uri()), fetcher);

        assert_eq!(source.load_tokens().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = JsonSource::new("/nonexistent/gitpulse/tokens.json", fetcher());
        assert!(matches!(source.load_tokens().await, Err(SourceError::Io(_))));
    }
}
