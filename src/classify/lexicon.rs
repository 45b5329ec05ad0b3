//! Lexicon scoring
//!
//! A lexicon file is plain text, one entry per line. Lines starting with `#` are comments. Each
//! entry is a token and a tab-separated value, which is one of:
//!
//! ```text
//! love	0.5       a valence in [-1, 1]
//! very	*1.3      an intensifier, which multiplies the next scored token
//! not	!         a negator, which flips and dampens the next scored token
//! ```
//!
//! A modifier only reaches the next token. Any other token in between cancels it.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::classify::Scorer;
use crate::errors::*;
use crate::farm::{new_farm, FarmMap};

/// What a negator multiplies the next valence by
pub const NEGATION_FACTOR: f64 = -0.5;

enum Entry {
    Valence(f64),
    Intensifier(f64),
    Negator,
}

/// Score = mean valence of the tokens found in the lexicon, after modifiers, clamped to [-1, 1]
pub struct LexiconScorer {
    entries: FarmMap<String, Entry>,
    valences: usize,
}

impl LexiconScorer {
    /// The lexicon compiled into the binary
    pub fn embedded() -> Result<Self> {
        LexiconScorer::parse(include_str!("default-lexicon.tsv"), "the embedded lexicon")
    }

    /// Read a lexicon file, in the same format as the embedded one
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let origin = path.as_ref().display().to_string();
        let mut content = String::new();
        File::open(path.as_ref())
            .and_then(|mut file| file.read_to_string(&mut content))
            .map_err(|err| Error::InvalidConfig(format!("can't read lexicon {}: {}", origin, err)))?;
        LexiconScorer::parse(&content, &origin)
    }

    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let mut entries = new_farm();
        let mut valences = 0;
        for (line_i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let complain = |why: String| Error::InvalidConfig(
                format!("{} line {}: {}", origin, line_i + 1, why));
            let mut parts = line.splitn(2, '\t');
            let token = parts.next().unwrap_or("").trim().to_lowercase();
            let value = parts.next()
                .map(str::trim)
                .ok_or_else(|| complain(format!("expected a tab after {:?}", token)))?;
            let entry = if value == "!" {
                Entry::Negator
            } else if value.starts_with('*') {
                let factor: f64 = value[1..].parse()
                    .map_err(|err| complain(format!("bad intensifier {:?}: {}", value, err)))?;
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(complain(format!("intensifier must be positive, got {}", factor)));
                }
                Entry::Intensifier(factor)
            } else {
                let valence: f64 = value.parse()
                    .map_err(|err| complain(format!("bad valence {:?}: {}", value, err)))?;
                if !(valence >= -1.0 && valence <= 1.0) {
                    return Err(complain(format!("valence must be within [-1, 1], got {}", valence)));
                }
                valences += 1;
                Entry::Valence(valence)
            };
            if let Some(Entry::Valence(_)) = entries.insert(token, entry) {
                valences -= 1;
            }
        }
        if valences == 0 {
            return Err(Error::InvalidConfig(format!("{} has no scored tokens", origin)));
        }
        debug!("Loaded {} lexicon entries ({} scored) from {}", entries.len(), valences, origin);
        Ok(LexiconScorer { entries, valences })
    }

    /// How many tokens carry a valence
    pub fn len(&self) -> usize {
        self.valences
    }

    pub fn valence(&self, token: &str) -> Option<f64> {
        match self.entries.get(token) {
            Some(&Entry::Valence(v)) => Some(v),
            _ => None,
        }
    }
}

impl Scorer for LexiconScorer {
    fn score(&self, tokens: &[String]) -> Option<f64> {
        let mut total = 0.0;
        let mut hits = 0;
        let mut negated = false;
        let mut boost = 1.0;
        for token in tokens {
            match self.entries.get(token.as_str()) {
                Some(&Entry::Negator) => {
                    negated = true;
                    continue;
                }
                Some(&Entry::Intensifier(factor)) => {
                    boost *= factor;
                    continue;
                }
                Some(&Entry::Valence(valence)) => {
                    let mut adjusted = valence * boost;
                    if negated {
                        adjusted *= NEGATION_FACTOR;
                    }
                    total += adjusted;
                    hits += 1;
                }
                None => (),
            }
            negated = false;
            boost = 1.0;
        }
        if hits == 0 {
            None
        } else {
            Some((total / hits as f64).max(-1.0).min(1.0))
        }
    }

    /// Share of tokens that carry a valence
    fn subjectivity(&self, tokens: &[String]) -> Option<f64> {
        if tokens.is_empty() {
            return None;
        }
        let scored = tokens.iter().filter(|token| self.valence(token).is_some()).count();
        Some(scored as f64 / tokens.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(text: &str) -> Vec<String> {
        text.split_whitespace().map(|w| w.to_string()).collect()
    }

    fn score(text: &str) -> Option<f64> {
        LexiconScorer::embedded().unwrap().score(&toks(text))
    }

    #[test]
    fn embedded_lexicon_parses() {
        let lexicon = LexiconScorer::embedded().unwrap();
        assert!(lexicon.len() > 100);
        assert_eq!(lexicon.valence("love"), Some(0.5));
        assert_eq!(lexicon.valence("not"), None);
    }

    #[test]
    fn polarity_of_plain_words() {
        assert!(score("i love this").unwrap() > 0.1);
        assert!(score("i hate this").unwrap() < -0.1);
        assert_eq!(score("meh it's fine"), Some(0.0));
    }

    #[test]
    fn subjectivity_is_the_share_of_scored_tokens() {
        let lexicon = LexiconScorer::embedded().unwrap();
        assert_eq!(lexicon.subjectivity(&toks("good bad weather day")), Some(0.5));
        assert_eq!(lexicon.subjectivity(&toks("not very")), Some(0.0));
        assert_eq!(lexicon.subjectivity(&[]), None);
    }

    #[test]
    fn out_of_vocabulary_is_unscoreable() {
        assert_eq!(score("the quick brown fox"), None);
    }

    #[test]
    fn negation_flips_and_dampens() {
        let plain = score("good").unwrap();
        let negated = score("not good").unwrap();
        assert_eq!(negated, plain * NEGATION_FACTOR);
    }

    #[test]
    fn modifiers_only_reach_the_next_token() {
        assert_eq!(score("not the good"), score("good"));
        assert_eq!(score("very much good"), score("good"));
    }

    #[test]
    fn intensifiers_scale() {
        assert!(score("very good").unwrap() > score("good").unwrap());
        assert!(score("slightly good").unwrap() < score("good").unwrap());
    }

    #[test]
    fn emoticons_are_scored() {
        assert!(score(":)").unwrap() > 0.0);
        assert!(score(":(").unwrap() < 0.0);
        assert!(score("<3").unwrap() > 0.0);
    }

    #[test]
    fn scores_stay_in_range() {
        let lexicon = LexiconScorer::parse("best\t1.0\nultra\t*5\n", "test").unwrap();
        assert_eq!(lexicon.score(&toks("ultra best")), Some(1.0));
    }

    #[test]
    fn custom_lexicon_format() {
        let lexicon = LexiconScorer::parse(
            "# comment\nyay\t0.8\n\n  boo\t-0.6\nnah\t!\nYay\t0.8\n", "test").unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.score(&toks("nah yay")), Some(-0.4));
        assert_eq!(lexicon.valence("boo"), Some(-0.6));
    }

    #[test]
    fn bad_lexicon_lines_are_config_errors() {
        for bad in &["yay 0.8\n", "yay\tlots\n", "yay\t2.0\n", "very\t*-1\n", "not\t!\n"] {
            match LexiconScorer::parse(bad, "test") {
                Err(Error::InvalidConfig(_)) => (),
                _ => panic!("{:?} should not parse", bad),
            }
        }
    }
}
