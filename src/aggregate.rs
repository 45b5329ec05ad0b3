//! Grouped counts and mean scores
//!
//! Scores are summed as integers (ten-thousandths, which is all the precision a score has), so
//! merging partial summaries gives exactly the same result in any order or grouping.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::{to_units, Label, SentimentResult, SCORE_SCALE};
use crate::config::TimeBucket;

/// Bucket name for tweets whose timestamp is missing or unreadable
pub const UNKNOWN_BUCKET: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Label(Label),
    LabelBucket(Label, String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GroupKey::Label(label) => write!(f, "{}", label),
            GroupKey::LabelBucket(label, ref bucket) => write!(f, "{}/{}", label, bucket),
        }
    }
}

/// Count and score total for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: u64,
    pub score_units: i64,
}

impl Tally {
    pub fn add(&mut self, score_units: i64) {
        self.count += 1;
        self.score_units += score_units;
    }

    pub fn merge(&mut self, other: &Tally) {
        self.count += other.count;
        self.score_units += other.score_units;
    }

    /// Mean score rounded to 4 places; 0 for an empty group
    pub fn mean_score(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean_units = (self.score_units as f64 / self.count as f64).round();
        mean_units / SCORE_SCALE
    }
}

/// One line of the summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub group_key: String,
    pub count: u64,
    pub mean_score: f64,
}

/// Every group seen in a run (or a partition of one)
///
/// The three overall label groups are always present, even when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    groups: BTreeMap<GroupKey, Tally>,
}

impl Default for Summary {
    fn default() -> Self {
        Summary::new()
    }
}

impl Summary {
    pub fn new() -> Self {
        let groups = Label::ALL.iter()
            .map(|&label| (GroupKey::Label(label), Tally::default()))
            .collect();
        Summary { groups }
    }

    /// Count one result. `bucket` decides the time grouping; `TimeBucket::None` turns it off.
    pub fn record(&mut self, result: &SentimentResult, bucket: TimeBucket) {
        let units = to_units(result.score);
        self.tally(GroupKey::Label(result.label)).add(units);
        if bucket != TimeBucket::None {
            let name = result.text.record.timestamp.as_ref()
                .and_then(|ts| bucket.bucket(ts))
                .unwrap_or_else(|| UNKNOWN_BUCKET.to_string());
            self.tally(GroupKey::LabelBucket(result.label, name)).add(units);
        }
    }

    fn tally(&mut self, key: GroupKey) -> &mut Tally {
        self.groups.entry(key).or_insert_with(Tally::default)
    }

    /// Fold another summary into this one
    pub fn merge(mut self, other: Summary) -> Summary {
        for (key, tally) in other.groups {
            self.tally(key).merge(&tally);
        }
        self
    }

    pub fn get(&self, key: &GroupKey) -> Tally {
        self.groups.get(key).cloned().unwrap_or_default()
    }

    pub fn label(&self, label: Label) -> Tally {
        self.get(&GroupKey::Label(label))
    }

    /// How many results were counted (each is in exactly one label group)
    pub fn total(&self) -> u64 {
        Label::ALL.iter().map(|&label| self.label(label).count).sum()
    }

    /// Overall label rows first, then label × time rows, each in key order
    pub fn rows(&self) -> Vec<SummaryRow> {
        let overall = self.groups.iter().filter(|&(key, _)| match *key {
            GroupKey::Label(_) => true,
            _ => false,
        });
        let bucketed = self.groups.iter().filter(|&(key, _)| match *key {
            GroupKey::LabelBucket(_, _) => true,
            _ => false,
        });
        overall.chain(bucketed)
            .map(|(key, tally)| SummaryRow {
                group_key: key.to_string(),
                count: tally.count,
                mean_score: tally.mean_score(),
            })
            .collect()
    }
}
