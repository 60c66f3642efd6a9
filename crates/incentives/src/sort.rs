// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stable multi-column sorting shared by the LST table and the incentive breakdown.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Input order.
    #[default]
    None,
    Ascending,
    Descending,
}

/// Active sort column and direction. Only a fresh state has no direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState<C> {
    pub column: Option<C>,
    pub direction: SortDirection,
}

impl<C> Default for SortState<C> {
    fn default() -> Self {
        Self { column: None, direction: SortDirection::None }
    }
}

impl<C: PartialEq> SortState<C> {
    pub fn by(column: C, direction: SortDirection) -> Self {
        Self { column: Some(column), direction }
    }

    /// State after clicking `column`. A new column starts descending; the active column flips
    /// between descending and ascending.
    pub fn toggle(self, column: C) -> Self {
        let direction = if self.column.as_ref() == Some(&column) {
            match self.direction {
                SortDirection::Descending => SortDirection::Ascending,
                SortDirection::Ascending | SortDirection::None => SortDirection::Descending,
            }
        } else {
            SortDirection::Descending
        };
        Self { column: Some(column), direction }
    }
}

fn numeric(key: f64) -> f64 {
    if key.is_nan() {
        0.0
    } else {
        key
    }
}

fn compare(a: f64, b: f64, direction: SortDirection) -> Ordering {
    let ordering = numeric(a).partial_cmp(&numeric(b)).unwrap_or(Ordering::Equal);
    match direction {
        SortDirection::Descending => ordering.reverse(),
        SortDirection::Ascending => ordering,
        SortDirection::None => Ordering::Equal,
    }
}

/// Sort `rows` in place. Ties keep their input order; NaN keys sort as zero.
pub fn sort_in_place<R, C, K>(rows: &mut Vec<R>, key_of: K, state: &SortState<C>)
where
    K: Fn(&R, &C) -> f64,
{
    let Some(column) = state.column.as_ref() else {
        return;
    };
    if state.direction == SortDirection::None {
        return;
    }

    let mut keyed: Vec<(f64, R)> = rows.drain(..).map(|row| (key_of(&row, column), row)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare(*a, *b, state.direction));
    rows.extend(keyed.into_iter().map(|(_, row)| row));
}

/// Sorted copy of `rows`.
pub fn sort_rows<R, C, K>(rows: &[R], key_of: K, state: &SortState<C>) -> Vec<R>
where
    R: Clone,
    K: Fn(&R, &C) -> f64,
{
    let mut sorted = rows.to_vec();
    sort_in_place(&mut sorted, key_of, state);
    sorted
}

/// Sorted copy of `rows` in which rows matching `is_pinned` keep their input position and never
/// reach the comparator. The remaining rows are sorted into the remaining positions.
pub fn sort_rows_pinned<R, C, K, P>(
    rows: &[R],
    is_pinned: P,
    key_of: K,
    state: &SortState<C>,
) -> Vec<R>
where
    R: Clone,
    K: Fn(&R, &C) -> f64,
    P: Fn(&R) -> bool,
{
    let mut movable: Vec<R> = rows.iter().filter(|row| !is_pinned(row)).cloned().collect();
    sort_in_place(&mut movable, key_of, state);

    let mut movable = movable.into_iter();
    rows.iter()
        .map(|row| {
            if is_pinned(row) {
                row.clone()
            } else {
                movable.next().unwrap_or_else(|| row.clone())
            }
        })
        .collect()
}
