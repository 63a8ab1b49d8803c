// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含统计模型、服务和数据源接口
pub mod domain;

/// 引擎模块
///
/// 实现限流请求、分页解析和接口地址构建
pub mod engines;

/// 基础设施模块
///
/// 提供数据源、汇总输出和指标导出的具体实现
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现周期性统计运行和工作器管理
pub mod workers;
