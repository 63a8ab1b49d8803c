// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::fetcher::RateLimitedFetcher;
use crate::engines::traits::FetchError;
use reqwest::header::{HeaderMap, LINK};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// 分页解析器
///
/// 利用 `Link` 头中的 `rel="last"` 在一次请求内得到集合大小
pub struct PaginationResolver {
    fetcher: Arc<RateLimitedFetcher>,
}

impl PaginationResolver {
    pub fn new(fetcher: Arc<RateLimitedFetcher>) -> Self {
        Self { fetcher }
    }

    /// 统计集合元素个数
    ///
    /// 以 `per_page=1` 请求第一页：若存在 `rel="last"`，其页码即为总数；
    /// 否则总数为该页的元素个数。无论集合多大都只发出一次请求。
    pub async fn count(&self, url: &str) -> Result<u64, FetchError> {
        let url = with_query(url, &[("per_page", "1")])?;
        let response = self.fetcher.fetch(&url, true).await?;

        if let Some(last) = last_page(&response.headers) {
            debug!("{} counted via last page link: {}", url, last);
            return Ok(last);
        }

        Ok(response.into_items()?.len() as u64)
    }

    /// 沿 `rel="next"` 逐页取回全部元素
    ///
    /// 结果整体驻留内存，只用于仓库、成员、分支这类较小的列表
    pub async fn collect_all(&self, url: &str, page_size: u32) -> Result<Vec<Value>, FetchError> {
        let mut next = Some(first_page(url, page_size)?);
        let mut items = Vec::new();

        while let Some(url) = next {
            let response = self.fetcher.fetch(&url, true).await?;
            next = next_page(&response.headers);
            items.extend(response.into_items()?);
        }

        Ok(items)
    }
}

/// 设置分页大小后的第一页地址
pub fn first_page(url: &str, page_size: u32) -> Result<String, FetchError> {
    with_query(url, &[("per_page", &page_size.to_string())])
}

/// 提取 `rel="next"` 链接
pub fn next_page(headers: &HeaderMap) -> Option<String> {
    link_target(headers, "next")
}

/// 提取 `rel="last"` 链接中的页码
pub fn last_page(headers: &HeaderMap) -> Option<u64> {
    let target = link_target(headers, "last")?;
    let url = Url::parse(&target).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

/// 解析 `Link` 头，返回指定关系的目标地址
///
/// 格式: `<https://...?page=2>; rel="next", <https://...?page=5>; rel="last"`
pub fn link_target(headers: &HeaderMap, rel: &str) -> Option<String> {
    let wanted = format!("rel=\"{}\"", rel);

    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|part| {
            let mut segments = part.split(';').map(str::trim);
            let target = segments.next()?;
            if !segments.any(|param| param == wanted) {
                return None;
            }
            let start = target.find('<')? + 1;
            let end = target.rfind('>')?;
            (start <= end).then(|| target[start..end].to_string())
        })
}

/// 设置查询参数，覆盖同名参数
fn with_query(url: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
    let mut parsed =
        Url::parse(url).map_err(|e| FetchError::Transport(format!("invalid url {}: {}", url, e)))?;

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !params.iter().any(|(name, _)| &**k == *name))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .extend_pairs(params);

    Ok(parsed.into())
}

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;
