//! Run-level accounting
//!
//! Each partition counts its own rows and the counts are merged at the end, so no counter is
//! ever shared between threads.
use std::collections::BTreeMap;
use std::fmt;

use crate::record::RejectReason;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Rows read (the header is not a row)
    pub input: u64,
    /// Rows that became a sentiment result
    pub successful: u64,
    /// Successful rows whose score was unusable and fell back to neutral
    pub ambiguous: u64,
    rejects: BTreeMap<RejectReason, u64>,
}

impl RunStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_success(&mut self, ambiguous: bool) {
        self.input += 1;
        self.successful += 1;
        if ambiguous {
            self.ambiguous += 1;
        }
    }

    pub fn record_reject(&mut self, reason: RejectReason) {
        self.input += 1;
        *self.rejects.entry(reason).or_insert(0) += 1;
    }

    pub fn merge(mut self, other: RunStats) -> RunStats {
        self.input += other.input;
        self.successful += other.successful;
        self.ambiguous += other.ambiguous;
        for (reason, count) in other.rejects {
            *self.rejects.entry(reason).or_insert(0) += count;
        }
        self
    }

    pub fn rejected(&self) -> u64 {
        self.rejects.values().sum()
    }

    pub fn rejected_for(&self, reason: RejectReason) -> u64 {
        self.rejects.get(&reason).cloned().unwrap_or(0)
    }

    /// successful + rejected == input
    pub fn is_balanced(&self) -> bool {
        self.successful + self.rejected() == self.input
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "input={} successful={} rejected={}", self.input, self.successful, self.rejected())?;
        for reason in RejectReason::ALL.iter() {
            let count = self.rejected_for(*reason);
            if count > 0 {
                write!(f, " {}={}", reason, count)?;
            }
        }
        if self.ambiguous > 0 {
            write!(f, " ambiguous={}", self.ambiguous)?;
        }
        Ok(())
    }
}
