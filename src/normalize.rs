//! Tweet text cleanup and tokenization
//!
//! The steps always run in the same order:
//!
//! 1. decode the handful of HTML entities the Twitter API leaves in text
//! 2. remove links (`http://..`, `https://..`, `www...`) and `@mentions`
//! 3. collapse whitespace, which gives the cleaned text that is reported back
//! 4. pull out ASCII emoticons like `:)` or `<3` as tokens of their own, but only where they
//!    stand alone: at the start or after whitespace, and not running into a letter or digit
//! 5. split everything else at unicode word bounds (and colons), keeping only pieces with a
//!    letter or digit
//! 6. lowercase, straighten curly apostrophes, and drop the retweet marker
//!
//! Pictographic emoji are not letters or digits, so step 5 drops them. A tweet made of nothing
//! but emoji and punctuation ends up with no tokens and is rejected.
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::record::{RawRecord, Reject, RejectReason};

/// The cleaned and tokenized form of one tweet
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    /// The record this came from, kept for ids and the original text
    pub record: RawRecord,
    /// Text after entity decoding, link and mention removal, and whitespace collapse
    pub cleaned: String,
    /// Never empty, all lowercase
    pub tokens: Vec<String>,
}

/// Stateless apart from its compiled patterns, so one can be shared by every worker
pub struct Normalizer {
    links: Regex,
    mentions: Regex,
    emoticons: Regex,
    min_chars: usize,
}

const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    // last, so "&amp;lt;" becomes "&lt;" and not "<"
    ("&amp;", "&"),
];

const RETWEET_MARKER: &str = "rt";

impl Normalizer {
    pub fn new() -> Self {
        Normalizer::with_min_chars(0)
    }

    /// A normalizer that also rejects tweets whose cleaned text is shorter than `min_chars`
    pub fn with_min_chars(min_chars: usize) -> Self {
        // These are fixed patterns, so failing to compile them is a bug, not an input problem.
        Normalizer {
            links: Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap(),
            mentions: Regex::new(r"@\w+").unwrap(),
            emoticons: Regex::new(r"(?:^|\s)(</3|<3|[:;=][-o*']?[()\[\]dDpP/\\|])").unwrap(),
            min_chars,
        }
    }

    /// Clean a tweet without tokenizing it
    pub fn clean(&self, text: &str) -> String {
        let mut decoded = text.to_string();
        for &(entity, plain) in ENTITIES {
            if decoded.contains(entity) {
                decoded = decoded.replace(entity, plain);
            }
        }
        let no_links = self.links.replace_all(&decoded, " ");
        let no_mentions = self.mentions.replace_all(&no_links, " ");
        no_mentions.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Split cleaned text into lowercase tokens
    pub fn tokenize(&self, cleaned: &str) -> Vec<String> {
        let mut tokens = vec![];
        let mut rest_from = 0;
        for found in self.emoticons.captures_iter(cleaned) {
            let emoticon = match found.get(1) {
                Some(emoticon) => emoticon,
                None => continue,
            };
            // ":p" in ":post" is the start of a word
            let runs_on = cleaned[emoticon.end()..].chars().next().map_or(false, char::is_alphanumeric);
            if runs_on {
                continue;
            }
            push_words(&cleaned[rest_from..emoticon.start()], &mut tokens);
            tokens.push(emoticon.as_str().to_lowercase());
            rest_from = emoticon.end();
        }
        push_words(&cleaned[rest_from..], &mut tokens);
        tokens
    }

    /// Normalize one record. Depends on nothing but the record itself.
    pub fn normalize(&self, record: RawRecord) -> Result<NormalizedText, Reject> {
        let cleaned = self.clean(&record.text);
        if self.min_chars > 0 && cleaned.chars().count() < self.min_chars {
            return Err(Reject::of(&record, RejectReason::TooShort));
        }
        let tokens = self.tokenize(&cleaned);
        if tokens.is_empty() {
            return Err(Reject::of(&record, RejectReason::EmptyAfterNormalization));
        }
        Ok(NormalizedText { record, cleaned, tokens })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new()
    }
}

fn push_words(span: &str, tokens: &mut Vec<String>) {
    // Word bounds keep "re:post" together, but in tweets a colon separates words
    tokens.extend(span
        .unicode_words()
        .flat_map(|word| word.split(':'))
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase().replace('\u{2019}', "'"))
        .filter(|word| word != RETWEET_MARKER));
}
