// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 集成测试模块
///
/// 以模拟的远程接口驱动完整的统计运行
pub mod engine_test;
pub mod helpers;
