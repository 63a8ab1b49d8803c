// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义引擎与外部协作方之间的抽象接口：
/// - 数据源（source_repository）：项目列表和令牌列表
/// - 汇总输出（summary_sink）：项目汇总的落地
pub mod source_repository;
pub mod summary_sink;
