//! Classify the sentiment of every tweet in a CSV file
//!
//! The input needs a header row and a text column (`content` unless told otherwise). Optional
//! `id`, `author` and `date_time` columns are carried through to the output.
//!
//! The output is a directory with `records.csv` (one row per classified tweet), `summary.csv`
//! (count and mean score per label, and per label and time bucket), `rejects.csv` (rows that
//! could not be classified, and why) and an empty `_SUCCESS` marker. The directory only appears
//! once all of it is written.
//!
//! Set RUST_LOG=debug to see every reject as it happens.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate tweet_sentiment;

use clap::Arg;

use tweet_sentiment::errors::*;
use tweet_sentiment::{Config, LexiconScorer, Pipeline};

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = app_from_crate!()
        .arg(Arg::with_name("input_path")
            .long("input_path")
            .value_name("PATH")
            .takes_value(true)
            .required(true)
            .help("CSV of tweets, with a header row"))
        .arg(Arg::with_name("output_path")
            .long("output_path")
            .value_name("PATH")
            .takes_value(true)
            .required(true)
            .help("directory to publish the results in (replaced if it exists)"))
        .arg_from_usage("--lexicon [FILE] 'lexicon to score with instead of the built-in one'")
        .arg_from_usage("--lower [SCORE] 'scores below this are negative [default: -0.1]'")
        .arg_from_usage("--upper [SCORE] 'scores above this are positive [default: 0.1]'")
        .arg_from_usage("--bucket [SIZE] 'time grouping for the summary: none, hour, day or month [default: day]'")
        .arg_from_usage("--partition-size [ROWS] 'rows handed to the thread pool at once [default: 10000]'")
        .arg_from_usage("--min-chars [N] 'reject tweets with fewer cleaned characters than this [default: 0, off]'")
        .arg_from_usage("--text-column [NAME] 'column holding the tweet text [default: content]'")
        .get_matches();

    let mut config = Config::default();
    if args.is_present("lower") {
        config.thresholds.lower = value_t!(args, "lower", f64).unwrap_or_else(|e| e.exit());
    }
    if args.is_present("upper") {
        config.thresholds.upper = value_t!(args, "upper", f64).unwrap_or_else(|e| e.exit());
    }
    if let Some(bucket) = args.value_of("bucket") {
        config.time_bucket = bucket.parse()?;
    }
    if args.is_present("partition-size") {
        config.partition_size = value_t!(args, "partition-size", usize).unwrap_or_else(|e| e.exit());
    }
    if args.is_present("min-chars") {
        config.min_chars = value_t!(args, "min-chars", usize).unwrap_or_else(|e| e.exit());
    }
    if let Some(column) = args.value_of("text-column") {
        config.text_column = column.to_string();
    }

    let scorer = match args.value_of("lexicon") {
        Some(path) => LexiconScorer::load(path)?,
        None => LexiconScorer::embedded()?,
    };
    info!("Scoring with {} lexicon tokens, neutral band [{}, {}], {} time buckets",
        scorer.len(), config.thresholds.lower, config.thresholds.upper, config.time_bucket);

    // Both are required, so clap has already checked they are there
    let input = args.value_of("input_path").unwrap();
    let output = args.value_of("output_path").unwrap();
    let report = Pipeline::new(config, scorer)?.run(input, output)?;

    println!("{}", report.stats);
    println!("{:<32} {:>10} {:>10}", "group_key", "count", "mean_score");
    for row in report.summary.rows() {
        println!("{:<32} {:>10} {:>10.4}", row.group_key, row.count, row.mean_score);
    }
    println!("Results saved to: {}", report.output.display());
    Ok(())
}
