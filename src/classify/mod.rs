//! Sentiment classification
//!
//! A `Scorer` turns tokens into a number in `[-1, 1]`; the `Classifier` owns the policy around
//! it: rounding, the neutral band, and what to do when a scorer has nothing to say or says
//! something nonsensical.
//!
//! The policy, which results depend on:
//!
//! - scores are rounded to 4 decimal places before anything else looks at them
//! - `score < lower` is negative, `score > upper` is positive, everything else is neutral
//! - a text the scorer can't score at all (no known tokens) is neutral with score 0
//! - a score that is NaN, infinite or outside `[-1, 1]` is also neutral with score 0, but it is
//!   logged and flagged as ambiguous so the run can count it
//!
//! Subjectivity rides along: whatever the scorer reports in `[0, 1]`, rounded the same way, or
//! 0.5 when it reports nothing usable.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::errors::*;
use crate::normalize::NormalizedText;

pub mod lexicon;

pub use self::lexicon::LexiconScorer;

/// Decimal places kept in a score
pub const SCORE_DECIMALS: i32 = 4;
/// Scores are kept as integer multiples of 1 / SCORE_SCALE when summed
pub const SCORE_SCALE: f64 = 10_000.0;
/// Subjectivity of a text the scorer has no opinion about
pub const DEFAULT_SUBJECTIVITY: f64 = 0.5;

/// The closed set of labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Negative,
    Neutral,
    Positive,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Negative, Label::Neutral, Label::Positive];

    pub fn as_str(&self) -> &'static str {
        match *self {
            Label::Negative => "negative",
            Label::Neutral => "neutral",
            Label::Positive => "positive",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Label {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Label::ALL.iter()
            .find(|label| label.as_str() == s)
            .cloned()
            .ok_or_else(|| Error::Other(format!("{:?} is not a sentiment label", s)))
    }
}

/// Anything that can put a number on a token sequence
///
/// Implementations must be pure: the same tokens always get the same score. `None` means there
/// was nothing to score.
pub trait Scorer {
    fn score(&self, tokens: &[String]) -> Option<f64>;

    /// How much of the text is opinion rather than fact, from 0 to 1
    fn subjectivity(&self, _tokens: &[String]) -> Option<f64> {
        None
    }
}

impl<'a, S: Scorer + ?Sized> Scorer for &'a S {
    fn score(&self, tokens: &[String]) -> Option<f64> {
        (**self).score(tokens)
    }
    fn subjectivity(&self, tokens: &[String]) -> Option<f64> {
        (**self).subjectivity(tokens)
    }
}

impl<S: Scorer + ?Sized> Scorer for Box<S> {
    fn score(&self, tokens: &[String]) -> Option<f64> {
        (**self).score(tokens)
    }
    fn subjectivity(&self, tokens: &[String]) -> Option<f64> {
        (**self).subjectivity(tokens)
    }
}

/// A normalized tweet with its sentiment attached
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentResult {
    pub text: NormalizedText,
    pub label: Label,
    /// Rounded to `SCORE_DECIMALS` places
    pub score: f64,
    /// In `[0, 1]`, rounded like the score
    pub subjectivity: f64,
    /// The scorer produced an unusable score and this result fell back to neutral
    pub ambiguous: bool,
}

impl SentimentResult {
    /// The score as an exact integer count of 1 / SCORE_SCALE
    pub fn score_units(&self) -> i64 {
        to_units(self.score)
    }
}

pub fn round_score(score: f64) -> f64 {
    (score * SCORE_SCALE).round() / SCORE_SCALE
}

pub fn to_units(score: f64) -> i64 {
    (score * SCORE_SCALE).round() as i64
}

/// Map a (rounded) score to its label
pub fn label_for(score: f64, thresholds: &Thresholds) -> Label {
    if score > thresholds.upper {
        Label::Positive
    } else if score < thresholds.lower {
        Label::Negative
    } else {
        Label::Neutral
    }
}

pub struct Classifier<S> {
    scorer: S,
    thresholds: Thresholds,
}

impl<S: Scorer> Classifier<S> {
    pub fn new(scorer: S, thresholds: Thresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Classifier { scorer, thresholds })
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Label and score for a token sequence, plus whether the score had to be thrown out
    pub fn assess(&self, tokens: &[String]) -> (Label, f64, bool) {
        match self.scorer.score(tokens) {
            None => (Label::Neutral, 0.0, false),
            Some(raw) if raw.is_finite() && raw >= -1.0 && raw <= 1.0 => {
                let score = round_score(raw);
                (label_for(score, &self.thresholds), score, false)
            }
            Some(raw) => {
                warn!("Scorer returned {} for {:?}; treating it as neutral", raw, tokens);
                (Label::Neutral, 0.0, true)
            }
        }
    }

    /// The scorer's subjectivity if it gave a usable one, else `DEFAULT_SUBJECTIVITY`
    pub fn subjectivity(&self, tokens: &[String]) -> f64 {
        match self.scorer.subjectivity(tokens) {
            Some(raw) if raw >= 0.0 && raw <= 1.0 => round_score(raw),
            _ => DEFAULT_SUBJECTIVITY,
        }
    }

    pub fn classify(&self, text: NormalizedText) -> SentimentResult {
        let (label, score, ambiguous) = self.assess(&text.tokens);
        let subjectivity = self.subjectivity(&text.tokens);
        SentimentResult { text, label, score, subjectivity, ambiguous }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    /// Returns the same thing no matter what
    struct Fixed(Option<f64>);
    impl Scorer for Fixed {
        fn score(&self, _tokens: &[String]) -> Option<f64> { self.0 }
    }

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn assess(score: Option<f64>) -> (Label, f64, bool) {
        Classifier::new(Fixed(score), Thresholds::default()).unwrap().assess(&toks(&["x"]))
    }

    #[test]
    fn neutral_band_is_closed() {
        let t = Thresholds::default();
        assert_eq!(label_for(0.1, &t), Label::Neutral);
        assert_eq!(label_for(-0.1, &t), Label::Neutral);
        assert_eq!(label_for(0.0, &t), Label::Neutral);
        assert_eq!(label_for(0.1001, &t), Label::Positive);
        assert_eq!(label_for(-0.1001, &t), Label::Negative);
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(assess(Some(0.5)), (Label::Positive, 0.5, false));
        assert_eq!(assess(Some(-0.5)), (Label::Negative, -0.5, false));
        assert_eq!(assess(Some(0.05)), (Label::Neutral, 0.05, false));
    }

    #[test]
    fn thresholds_are_configuration() {
        let wide = Thresholds::new(-0.6, 0.6).unwrap();
        let classifier = Classifier::new(Fixed(Some(0.5)), wide).unwrap();
        assert_eq!(classifier.assess(&toks(&["x"])).0, Label::Neutral);
    }

    #[test]
    fn unscoreable_is_neutral_zero() {
        assert_eq!(assess(None), (Label::Neutral, 0.0, false));
    }

    #[test]
    fn nonsense_scores_fall_back_to_neutral() {
        assert_eq!(assess(Some(::std::f64::NAN)), (Label::Neutral, 0.0, true));
        assert_eq!(assess(Some(::std::f64::INFINITY)), (Label::Neutral, 0.0, true));
        assert_eq!(assess(Some(3.0)), (Label::Neutral, 0.0, true));
    }

    #[test]
    fn scores_round_to_four_places() {
        assert_eq!(assess(Some(0.123456)).1, 0.1235);
        assert_eq!(assess(Some(-0.99996)).1, -1.0);
        // just above the band before rounding, on its edge after
        assert_eq!(assess(Some(0.10004)), (Label::Neutral, 0.1, false));
    }

    #[test]
    fn classification_is_repeatable() {
        let classifier = Classifier::new(LexiconScorer::embedded().unwrap(), Thresholds::default()).unwrap();
        let tokens = toks(&["not", "very", "good", "but", "fun", ":)"]);
        let first = classifier.assess(&tokens);
        for _ in 0..10 {
            assert_eq!(classifier.assess(&tokens), first);
        }
    }

    #[test]
    fn classify_keeps_the_text() {
        let text = NormalizedText {
            record: RawRecord { row: 3, text: "Yay".to_string(), ..RawRecord::default() },
            cleaned: "Yay".to_string(),
            tokens: toks(&["yay"]),
        };
        let result = Classifier::new(Fixed(Some(0.7)), Thresholds::default()).unwrap().classify(text.clone());
        assert_eq!(result.text, text);
        assert_eq!(result.label, Label::Positive);
        assert_eq!(result.score_units(), 7000);
        assert_eq!(result.subjectivity, DEFAULT_SUBJECTIVITY);
    }

    #[test]
    fn subjectivity_comes_from_the_scorer() {
        let classifier = Classifier::new(LexiconScorer::embedded().unwrap(), Thresholds::default()).unwrap();
        assert_eq!(classifier.subjectivity(&toks(&["i", "love", "this"])), 0.3333);
        assert_eq!(classifier.subjectivity(&toks(&["the", "quick", "fox"])), 0.0);
        assert_eq!(classifier.subjectivity(&[]), DEFAULT_SUBJECTIVITY);
    }

    #[test]
    fn inverted_thresholds_are_refused() {
        assert!(Classifier::new(Fixed(None), Thresholds { lower: 1.0, upper: -1.0 }).is_err());
    }

    #[test]
    fn labels_round_trip_through_text() {
        for label in Label::ALL.iter() {
            assert_eq!(label.as_str().parse::<Label>().unwrap(), *label);
        }
        assert!("angry".parse::<Label>().is_err());
    }
}
