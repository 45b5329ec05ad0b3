//! Print the label distribution of a published result directory
//!
//! This reads the output the way a report or chart would: only from a finished directory, and
//! only through the published column schema. The counts are recomputed from `records.csv` and
//! checked against `summary.csv`.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate tweet_sentiment;

use std::collections::BTreeMap;

use tweet_sentiment::errors::*;
use tweet_sentiment::writer;
use tweet_sentiment::Label;

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = app_from_crate!()
        .arg_from_usage("<results> 'directory published by ts-analyze'")
        .get_matches();
    let dir = args.value_of("results").unwrap();

    let records = writer::read_records(dir)?;
    let mut counts: BTreeMap<Label, u64> = Label::ALL.iter().map(|&label| (label, 0)).collect();
    for record in &records {
        *counts.entry(record.label).or_insert(0) += 1;
    }

    let summary = writer::read_summary(dir)?;
    for (label, count) in &counts {
        match summary.iter().find(|row| row.group_key == label.as_str()) {
            Some(row) if row.count == *count => (),
            Some(row) => warn!("summary.csv says {} {} tweets, records.csv has {}", row.count, label, count),
            None => warn!("summary.csv has no row for {}", label),
        }
    }

    let total = records.len() as f64;
    println!("{} classified tweets in {}", records.len(), dir);
    for (label, count) in &counts {
        let share = if total > 0.0 { 100.0 * *count as f64 / total } else { 0.0 };
        println!("{:<10} {:>10} {:>7.2}%", label.as_str(), count, share);
    }
    Ok(())
}
