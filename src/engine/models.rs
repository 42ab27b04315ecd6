// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferDistanceError {
    #[error("buffer distance is empty")]
    Empty,

    #[error("buffer distance '{0}' is not a finite number")]
    NotANumber(String),
}

/// Buffer offset with an optional linear unit, e.g. `500 Feet`
///
/// A zero distance is valid; the buffer step still runs and yields the
/// selection's own outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferDistance {
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl BufferDistance {
    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

impl FromStr for BufferDistance {
    type Err = BufferDistanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let number = parts.next().ok_or(BufferDistanceError::Empty)?;

        let value: f64 = number
            .parse()
            .map_err(|_| BufferDistanceError::NotANumber(number.to_string()))?;
        if !value.is_finite() {
            return Err(BufferDistanceError::NotANumber(number.to_string()));
        }

        let unit = parts.collect::<Vec<_>>().join(" ");
        Ok(Self {
            value,
            unit: (!unit.is_empty()).then_some(unit),
        })
    }
}

impl fmt::Display for BufferDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} {}", self.value, unit),
            None => write!(f, "{}", self.value),
        }
    }
}

fn default_visible() -> bool {
    true
}

/// Visibility of one field in a table view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldVisibility {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl FieldVisibility {
    pub fn visible(name: &str) -> Self {
        Self {
            name: name.to_string(),
            visible: true,
        }
    }

    /// `NAME NAME VISIBLE NONE` form used by field-info strings
    pub fn to_field_info(&self) -> String {
        let visibility = if self.visible { "VISIBLE" } else { "HIDDEN" };
        format!("{0} {0} {1} NONE", self.name, visibility)
    }
}

/// Semicolon-joined field-info string for a whole schema
pub fn field_info(fields: &[FieldVisibility]) -> String {
    fields
        .iter()
        .map(FieldVisibility::to_field_info)
        .collect::<Vec<_>>()
        .join(";")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    /// Only rows with a match in the join table are kept
    KeepCommon,
    KeepAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageDirection {
    None,
    Forward,
    Backward,
    Both,
}

/// Simple (non-composite, non-attributed) relationship class definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipClass {
    pub origin: PathBuf,
    pub destination: PathBuf,
    pub output: PathBuf,
    pub forward_label: String,
    pub backward_label: String,
    pub message_direction: MessageDirection,
    pub cardinality: Cardinality,
    pub origin_primary_key: String,
    pub origin_foreign_key: String,
}
