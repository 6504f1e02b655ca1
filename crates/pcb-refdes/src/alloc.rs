//! Reference number allocation with gap filling.

use serde::{Deserialize, Serialize};

/// Smallest value `>= first` that is not in `used`.
///
/// `used` must be sorted ascending without duplicates. Values below `first`
/// are ignored; an empty pool returns `first`. When every number from `first`
/// up to `u32::MAX` is taken the search wraps around and returns the lowest
/// free number from 1 (then 0).
pub fn first_free_number(used: &[u32], first: u32) -> u32 {
    free_from(used, first)
        .or_else(|| free_from(used, 1))
        .or_else(|| free_from(used, 0))
        // Only reachable with a pool holding every u32.
        .unwrap_or(first)
}

fn free_from(used: &[u32], first: u32) -> Option<u32> {
    let start = used.partition_point(|&n| n < first);
    let mut candidate = first;
    for &n in &used[start..] {
        if n != candidate {
            break;
        }
        candidate = candidate.checked_add(1)?;
    }
    Some(candidate)
}

/// Where numbering starts for a prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberingScheme {
    /// One shared sequence starting at the configured start number.
    #[default]
    Sequential,
    /// Each sheet numbers from `sheet_number * sheet_interval + 1`. A sheet
    /// with more parts than the interval spills into the next sheet's block.
    PerSheet,
}

impl NumberingScheme {
    /// First candidate number for a reference on `sheet_number`.
    pub fn first_candidate(
        self,
        sheet_number: u32,
        sheet_interval: u32,
        start_number: u32,
    ) -> u32 {
        match self {
            NumberingScheme::Sequential => start_number,
            NumberingScheme::PerSheet => sheet_number
                .saturating_mul(sheet_interval)
                .saturating_add(1),
        }
    }
}

/// Sorted set of numbers already taken for one prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberPool {
    used: Vec<u32>,
}

impl NumberPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_numbers(numbers: impl IntoIterator<Item = u32>) -> Self {
        let mut used: Vec<u32> = numbers.into_iter().collect();
        used.sort_unstable();
        used.dedup();
        Self { used }
    }

    /// Take the first free number `>= first` and mark it used.
    pub fn claim(&mut self, first: u32) -> u32 {
        let number = first_free_number(&self.used, first);
        let at = self.used.partition_point(|&n| n < number);
        self.used.insert(at, number);
        number
    }

    pub fn contains(&self, number: u32) -> bool {
        self.used.binary_search(&number).is_ok()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.used
    }

    pub fn last(&self) -> Option<u32> {
        self.used.last().copied()
    }
}
