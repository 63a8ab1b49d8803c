// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施模块
///
/// 提供外部协作方的具体实现，包括JSON数据源、汇总输出和指标导出
pub mod metrics;
pub mod sinks;
pub mod sources;
