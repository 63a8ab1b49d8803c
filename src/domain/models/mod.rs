// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 项目（project）：待统计的项目及其引用地址
/// - 实体（entity）：引用解析出的用户、组织或仓库
/// - 仓库统计（repo_stats）：单个仓库的中间结果
/// - 汇总（summary）：项目级的最终统计结果
pub mod entity;
pub mod project;
pub mod repo_stats;
pub mod summary;
