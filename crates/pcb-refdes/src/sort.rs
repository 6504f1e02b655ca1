//! Total orders over flattened references.
//!
//! Every order groups references by prefix and then by number, with
//! unannotated references after all annotated ones, except
//! [`SortOrder::TimeStamp`] which groups by sheet path. Each chain ends on the
//! instance identity so no two distinct references compare equal.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::reference::Reference;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Reference, sheet number, X, Y.
    #[default]
    XPosition,
    /// Reference, sheet number, Y, X.
    YPosition,
    /// Sheet path, then component identity.
    TimeStamp,
    /// Reference, value, unit, sheet number, X, Y.
    ReferenceAndValue,
    /// Reference, unit.
    ReferenceOnly,
}

impl SortOrder {
    pub const ALL: [SortOrder; 5] = [
        SortOrder::XPosition,
        SortOrder::YPosition,
        SortOrder::TimeStamp,
        SortOrder::ReferenceAndValue,
        SortOrder::ReferenceOnly,
    ];

    pub fn compare(self, a: &Reference, b: &Reference) -> Ordering {
        match self {
            SortOrder::XPosition => by_x_position(a, b),
            SortOrder::YPosition => by_y_position(a, b),
            SortOrder::TimeStamp => by_time_stamp(a, b),
            SortOrder::ReferenceAndValue => by_reference_and_value(a, b),
            SortOrder::ReferenceOnly => by_reference_only(a, b),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SortOrder::XPosition => "x-position",
            SortOrder::YPosition => "y-position",
            SortOrder::TimeStamp => "time-stamp",
            SortOrder::ReferenceAndValue => "reference-and-value",
            SortOrder::ReferenceOnly => "reference-only",
        })
    }
}

/// Unannotated (`None`) sorts after every number.
fn cmp_number(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_reference(a: &Reference, b: &Reference) -> Ordering {
    a.prefix()
        .cmp(b.prefix())
        .then_with(|| cmp_number(a.number(), b.number()))
}

fn cmp_identity(a: &Reference, b: &Reference) -> Ordering {
    a.uuid
        .cmp(&b.uuid)
        .then_with(|| a.sheet_path.cmp(&b.sheet_path))
}

fn by_x_position(a: &Reference, b: &Reference) -> Ordering {
    cmp_reference(a, b)
        .then(a.sheet_number.cmp(&b.sheet_number))
        .then(a.position.x.cmp(&b.position.x))
        .then(a.position.y.cmp(&b.position.y))
        .then_with(|| cmp_identity(a, b))
}

fn by_y_position(a: &Reference, b: &Reference) -> Ordering {
    cmp_reference(a, b)
        .then(a.sheet_number.cmp(&b.sheet_number))
        .then(a.position.y.cmp(&b.position.y))
        .then(a.position.x.cmp(&b.position.x))
        .then_with(|| cmp_identity(a, b))
}

fn by_time_stamp(a: &Reference, b: &Reference) -> Ordering {
    natord::compare(&a.sheet_path.to_string(), &b.sheet_path.to_string())
        .then_with(|| a.sheet_path.cmp(&b.sheet_path))
        .then(a.uuid.cmp(&b.uuid))
}

fn by_reference_and_value(a: &Reference, b: &Reference) -> Ordering {
    cmp_reference(a, b)
        .then_with(|| a.value.cmp(&b.value))
        .then(a.unit.cmp(&b.unit))
        .then(a.sheet_number.cmp(&b.sheet_number))
        .then(a.position.x.cmp(&b.position.x))
        .then(a.position.y.cmp(&b.position.y))
        .then_with(|| cmp_identity(a, b))
}

fn by_reference_only(a: &Reference, b: &Reference) -> Ordering {
    cmp_reference(a, b)
        .then(a.unit.cmp(&b.unit))
        .then_with(|| cmp_identity(a, b))
}
