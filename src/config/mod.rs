// SPDX-License-Identifier: GPL-3.0-only
pub mod config;
pub mod schema;

pub use config::{CamaConfig, Config, ContourConfig};
