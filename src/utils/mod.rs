// SPDX-License-Identifier: GPL-3.0-only
pub mod fs;
pub mod path_sanitizer;

pub use fs::{copy_directory, recreate_dir, DirState};
pub use path_sanitizer::{feature_name, is_single_component, last_segment};
