// SPDX-License-Identifier: GPL-3.0-only
pub mod error;
pub mod traits;
pub mod zip;

pub use traits::Archiver;
pub use self::zip::ZipArchiver;
