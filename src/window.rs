//! Ordering the full group set and slicing out the requested window.
//!
//! The requested sort keys compare first (`size` and `numdocs` largest-first
//! by default, `identity` ascending; a `-` prefix reverses a key). A final
//! comparison on the canonical serialized identity, ascending and never
//! reversed, is always appended: identities are unique within a result, so
//! the order is total and byte-stable across runs.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::GroupError;
use crate::group::{AggregationResult, Group, ResultTotals};

/// Default number of groups per window when the request does not say.
pub const DEFAULT_WINDOW_SIZE: u64 = 20;

/// A sortable field of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSortKey {
    /// Group size (hit count), largest first by default.
    Size,
    /// Canonical identity, ascending by default.
    Identity,
    /// Distinct contributing documents, largest first by default.
    NumberOfDocs,
}

/// One sort key with an optional direction flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSort {
    pub key: GroupSortKey,
    pub reverse: bool,
}

impl GroupSort {
    fn compare(self, a: &Group, b: &Group) -> Ordering {
        let ordering = match self.key {
            GroupSortKey::Size => b.size.cmp(&a.size),
            GroupSortKey::NumberOfDocs => b.number_of_docs().cmp(&a.number_of_docs()),
            GroupSortKey::Identity => a.identity.cmp(&b.identity),
        };
        if self.reverse {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// The requested composite sort order, e.g. `size,identity` or `-size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder(Vec<GroupSort>);

impl SortOrder {
    pub fn new(keys: Vec<GroupSort>) -> Self {
        SortOrder(keys)
    }

    pub fn keys(&self) -> &[GroupSort] {
        &self.0
    }

    /// Total order over groups: requested keys, then the unconditional
    /// serialized-identity tie-break.
    pub fn compare(&self, a: &Group, b: &Group) -> Ordering {
        for sort in &self.0 {
            let ordering = sort.compare(a, b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.identity.serialize().cmp(&b.identity.serialize())
    }
}

impl Default for SortOrder {
    /// `size,identity`: largest groups first, identity breaking ties.
    fn default() -> Self {
        SortOrder(vec![
            GroupSort {
                key: GroupSortKey::Size,
                reverse: false,
            },
            GroupSort {
                key: GroupSortKey::Identity,
                reverse: false,
            },
        ])
    }
}

impl FromStr for SortOrder {
    type Err = GroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(SortOrder::default());
        }
        let mut keys = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            let (reverse, name) = match part.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, part),
            };
            let key = match name {
                "size" => GroupSortKey::Size,
                "identity" => GroupSortKey::Identity,
                "numdocs" => GroupSortKey::NumberOfDocs,
                _ => return Err(GroupError::InvalidSort(s.to_string())),
            };
            keys.push(GroupSort { key, reverse });
        }
        Ok(SortOrder(keys))
    }
}

/// A contiguous page of the sorted group list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    /// First group to include, 0-based.
    pub first_result: u64,
    /// Requested page size.
    pub requested_size: u64,
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec {
            first_result: 0,
            requested_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Pagination metadata computed alongside the windowed slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStats {
    pub number_of_groups: u64,
    pub largest_group_size: u64,
    pub window_first_result: u64,
    pub requested_window_size: u64,
    pub actual_window_size: u64,
    pub window_has_previous: bool,
    pub window_has_next: bool,
}

/// Sort the full group set, slice the window, report pagination metadata.
///
/// Consumes the result: aggregation output is produced once per request and
/// the windower is its only downstream owner.
pub fn window(
    result: AggregationResult,
    sort: &SortOrder,
    spec: &WindowSpec,
) -> (Vec<Group>, WindowStats, ResultTotals) {
    let number_of_groups = result.number_of_groups();
    let largest_group_size = result.largest_group_size();
    let totals = result.totals;

    let mut groups: Vec<Group> = result.groups.into_values().collect();
    groups.sort_by(|a, b| sort.compare(a, b));

    let first = spec.first_result.min(number_of_groups);
    let actual = spec
        .requested_size
        .min(number_of_groups - first);
    let windowed: Vec<Group> = groups
        .into_iter()
        .skip(first as usize)
        .take(actual as usize)
        .collect();

    let stats = WindowStats {
        number_of_groups,
        largest_group_size,
        window_first_result: spec.first_result,
        requested_window_size: spec.requested_size,
        actual_window_size: actual,
        window_has_previous: spec.first_result > 0,
        window_has_next: spec.first_result + actual < number_of_groups,
    };
    (windowed, stats, totals)
}
