//! Read → normalize → classify → (summarize, write)
//!
//! Rows are taken from the reader a partition at a time. Inside a partition every row is
//! handled independently on the rayon pool, and the partition's counts are folded and reduced
//! there too. Merging partition counts into the run totals is the only place results meet.
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::aggregate::Summary;
use crate::classify::{Classifier, Scorer, SentimentResult};
use crate::config::{Config, TimeBucket};
use crate::errors::*;
use crate::normalize::Normalizer;
use crate::record::{ReadOutcome, RecordReader, Reject};
use crate::stats::RunStats;
use crate::writer::StagedOutput;

/// What became of one input row by the end of the pipeline
pub type Outcome = ::std::result::Result<SentimentResult, Reject>;

/// Everything one partition produced, in input order
pub struct Partition {
    pub outcomes: Vec<Outcome>,
    pub summary: Summary,
    pub stats: RunStats,
}

/// What a finished run reports back
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: RunStats,
    pub summary: Summary,
    pub output: PathBuf,
}

pub struct Pipeline<S> {
    config: Config,
    normalizer: Normalizer,
    classifier: Classifier<S>,
}

impl<S: Scorer + Sync> Pipeline<S> {
    pub fn new(config: Config, scorer: S) -> Result<Self> {
        config.validate()?;
        Ok(Pipeline {
            normalizer: Normalizer::with_min_chars(config.min_chars),
            classifier: Classifier::new(scorer, config.thresholds)?,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Carry one row as far as it will go
    pub fn process(&self, row: ReadOutcome) -> Outcome {
        let record = row?;
        let text = self.normalizer.normalize(record)?;
        Ok(self.classifier.classify(text))
    }

    /// Process a batch of rows in parallel and count what happened
    pub fn process_partition(&self, rows: Vec<ReadOutcome>, bucket: TimeBucket) -> Partition {
        let outcomes: Vec<Outcome> = rows.into_par_iter()
            .map(|row| self.process(row))
            .collect();
        let (summary, stats) = outcomes.par_iter()
            .fold(|| (Summary::new(), RunStats::new()), |(mut summary, mut stats), outcome| {
                match *outcome {
                    Ok(ref result) => {
                        summary.record(result, bucket);
                        stats.record_success(result.ambiguous);
                    }
                    Err(ref reject) => stats.record_reject(reject.reason),
                }
                (summary, stats)
            })
            .reduce(|| (Summary::new(), RunStats::new()),
                |(left_summary, left_stats), (right_summary, right_stats)| {
                    (left_summary.merge(right_summary), left_stats.merge(right_stats))
                });
        Partition { outcomes, summary, stats }
    }

    /// Analyze the CSV at `input` and publish the results at `output`
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<RunReport> {
        let reader = RecordReader::open(input, &self.config)?;
        self.run_reader(reader, output)
    }

    /// Same as `run`, for a reader that is already open
    pub fn run_reader<R: io::Read, Q: AsRef<Path>>(&self, mut reader: RecordReader<R>, output: Q)
        -> Result<RunReport> {
        let bucket = if reader.schema().has_timestamp() {
            self.config.time_bucket
        } else {
            TimeBucket::None
        };
        let mut staged = StagedOutput::create(output)?;
        let mut summary = Summary::new();
        let mut stats = RunStats::new();
        let mut partition_i = 0;
        loop {
            let rows = reader.by_ref()
                .take(self.config.partition_size)
                .collect::<Result<Vec<ReadOutcome>>>()?;
            if rows.is_empty() {
                break;
            }
            let partition = self.process_partition(rows, bucket);
            for outcome in &partition.outcomes {
                match *outcome {
                    Ok(ref result) => staged.write_result(result)?,
                    Err(ref reject) => staged.write_reject(reject)?,
                }
            }
            summary = summary.merge(partition.summary);
            stats = stats.merge(partition.stats);
            partition_i += 1;
            info!("Finished partition {}, {} so far", partition_i, stats);
        }

        if !stats.is_balanced() || summary.total() != stats.successful {
            return Err(Error::Other(format!(
                "Row accounting is off ({}, {} summarized); refusing to publish", stats, summary.total())));
        }
        let output = staged.publish(&summary)?;
        info!("Run complete: {}", stats);
        Ok(RunReport { stats, summary, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Label, LexiconScorer};
    use crate::record::{RawRecord, RejectReason};

    fn pipeline() -> Pipeline<LexiconScorer> {
        Pipeline::new(Config::default(), LexiconScorer::embedded().unwrap()).unwrap()
    }

    fn raw(row: u64, text: &str) -> ReadOutcome {
        Ok(RawRecord { row, text: text.to_string(), ..RawRecord::default() })
    }

    #[test]
    fn rejects_pass_straight_through() {
        let reject = Reject { row: 4, id: None, reason: RejectReason::Malformed };
        assert_eq!(pipeline().process(Err(reject.clone())).unwrap_err(), reject);
    }

    #[test]
    fn process_classifies_or_rejects() {
        let p = pipeline();
        assert_eq!(p.process(raw(1, "I love this!")).unwrap().label, Label::Positive);
        assert_eq!(p.process(raw(2, "🔥🔥")).unwrap_err().reason, RejectReason::EmptyAfterNormalization);
    }

    #[test]
    fn partitions_keep_input_order() {
        let rows: Vec<ReadOutcome> = (1..200).map(|i| raw(i, "good stuff")).collect();
        let partition = pipeline().process_partition(rows, TimeBucket::None);
        let order: Vec<u64> = partition.outcomes.iter()
            .map(|o| o.as_ref().unwrap().text.record.row)
            .collect();
        assert_eq!(order, (1..200).collect::<Vec<u64>>());
        assert_eq!(partition.stats.successful, 199);
        assert_eq!(partition.summary.label(Label::Positive).count, 199);
    }

    #[test]
    fn bad_config_is_refused() {
        let config = Config { partition_size: 0, ..Config::default() };
        assert!(Pipeline::new(config, LexiconScorer::embedded().unwrap()).is_err());
    }
}
