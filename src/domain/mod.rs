// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：项目、实体、仓库统计和汇总
/// - 仓库接口（repositories）：数据源和输出的抽象接口
/// - 服务（services）：令牌池、实体解析、采集、聚合和编排
///
/// 领域层只通过抽象接口与外部协作方交互。
pub mod models;
pub mod repositories;
pub mod services;
