// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 项目实体
///
/// 一个项目引用一个或多个账号、组织或仓库地址，每次成功的尝试产出一份汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// 项目ID，源数据中可以是数字或字符串
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// 引用地址，按源数据顺序保存
    #[serde(default)]
    pub references: Vec<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, references: Vec<String>) -> Self {
        Self {
            id: id.into(),
            references,
        }
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "project id must be a string or number, got {}",
            other
        ))),
    }
}
