//! Per-subpopulation cell counts.

use crate::types::Label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of cells holding each label. Every label of the type table is
/// present, with zero for types that are absent from the patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    counts: BTreeMap<Label, usize>,
}

impl Census {
    /// A census with every label `0..subpop_count` at zero
    pub fn new(subpop_count: usize) -> Self {
        Self {
            counts: (0..subpop_count).map(|k| (Label::new(k), 0)).collect(),
        }
    }

    /// Count `labels` against a table of `subpop_count` types
    pub fn from_labels<'a>(subpop_count: usize, labels: impl IntoIterator<Item = &'a Label>) -> Self {
        let mut census = Self::new(subpop_count);
        for label in labels {
            census.record(*label);
        }
        census
    }

    pub fn record(&mut self, label: Label) {
        *self.counts.entry(label).or_insert(0) += 1;
    }

    pub fn get(&self, label: Label) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Cells holding any non-empty label
    pub fn occupied(&self) -> usize {
        self.counts
            .iter()
            .filter(|(label, _)| label.is_occupied())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, usize)> + '_ {
        self.counts.iter().map(|(label, count)| (*label, *count))
    }

    pub fn as_map(&self) -> &BTreeMap<Label, usize> {
        &self.counts
    }
}
