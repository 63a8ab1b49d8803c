// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 统计引擎的核心逻辑：
/// - 令牌池（token_pool）：凭证选择、校验与轮换
/// - 实体解析（entity_resolver）：引用分类与仓库展开
/// - 仓库采集（repo_stats_collector）：单仓库指标
/// - 聚合（aggregator）：项目级汇总
/// - 编排（orchestrator）：项目重试状态机
pub mod aggregator;
pub mod entity_resolver;
pub mod orchestrator;
pub mod repo_stats_collector;
pub mod token_pool;
