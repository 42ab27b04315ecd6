// SPDX-License-Identifier: GPL-3.0-only
use std::path::{Component, Path};

/// Check that a user-supplied name is exactly one plain path component
///
/// Rejects empty names, separators, `.`/`..`, roots and drive prefixes, so
/// joining the name onto a base directory can never leave that directory.
pub fn is_single_component(name: &str) -> bool {
    if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Last `\`- or `/`-separated segment of an identifier, on any platform
pub fn last_segment(identifier: &str) -> &str {
    identifier.trim().rsplit(['\\', '/']).next().unwrap_or_default()
}

/// Feature class name from a source identifier
///
/// Identifiers may be full paths and/or qualified names, e.g.
/// `GIS.sde\County.GIS.Parcels` → `Parcels`.
pub fn feature_name(identifier: &str) -> Option<&str> {
    let name = last_segment(identifier).rsplit('.').next()?;
    (!name.is_empty()).then_some(name)
}
