// SPDX-License-Identifier: GPL-3.0-only
pub mod http;
pub mod models;
pub mod traits;

pub use http::HttpSpatialEngine;
pub use models::{BufferDistance, FieldVisibility, JoinType, RelationshipClass};
pub use traits::SpatialEngine;
