// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod endpoints;
pub mod fetcher;
pub mod pagination;
pub mod traits;
