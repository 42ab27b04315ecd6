// SPDX-License-Identifier: GPL-3.0-only
pub mod layout;
pub mod report;
pub mod request;
pub mod service;

pub use request::{parse_cama_flag, split_feature_list, ExtractionRequest, OutputFormat, RequestError};
pub use service::{ExtractionService, ExtractionSettings};
