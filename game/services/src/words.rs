//! Word corpora loaded once on first use, grounded on the original
//! `MatchService::loadWords`/`getRandomWord`.

use rand::Rng;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Length bounds per round: round 1 is 4-7 letters, round 2 is 8-12, round 3 is 10-15.
const ROUND_BOUNDS: [(usize, usize); 3] = [(4, 7), (8, 12), (10, 15)];

/// Fallback words used when a round's corpus file is empty or missing,
/// matching the original's hardcoded fallback.
const FALLBACKS: [&str; 3] = ["GAME", "COMPUTER", "PROGRAMMING"];

pub struct WordLists {
    rounds: [Vec<String>; 3],
}

impl WordLists {
    /// Loads the three round corpora from `<dir>/words_round{1,2,3}.txt`,
    /// uppercasing and stripping whitespace from every line, and filtering
    /// by each round's length bounds.
    pub fn load(dir: &Path) -> WordLists {
        let rounds = std::array::from_fn(|i| {
            let (min_len, max_len) = ROUND_BOUNDS[i];
            let path = dir.join(format!("words_round{}.txt", i + 1));
            load_one(&path, min_len, max_len)
        });
        WordLists { rounds }
    }

    /// Picks a word for the given round (1-indexed) using the supplied
    /// selection strategy, falling back to a fixed word if the corpus is empty.
    pub fn pick(&self, round: u8, selector: &dyn WordSelection) -> String {
        let words = &self.rounds[(round - 1) as usize];
        if words.is_empty() {
            return FALLBACKS[(round - 1) as usize].to_string();
        }
        words[selector.select(words.len())].clone()
    }
}

fn load_one(path: &Path, min_len: usize, max_len: usize) -> Vec<String> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    contents
        .lines()
        .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase())
        .filter(|word| word.len() >= min_len && word.len() <= max_len)
        .collect()
}

/// Strategy for choosing a word out of a round's corpus.
pub trait WordSelection: Send + Sync {
    /// Returns an index in `[0, len)`.
    fn select(&self, len: usize) -> usize;
}

/// Uniformly random selection, used in production.
pub struct Uniform;

impl WordSelection for Uniform {
    fn select(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always returns the first word, matching the original's test-mode comment
/// ("For testing: always return first word").
pub struct FirstWord;

impl WordSelection for FirstWord {
    fn select(&self, _len: usize) -> usize {
        0
    }
}

static DEFAULT_SELECTOR: OnceLock<Uniform> = OnceLock::new();

pub fn default_selector() -> &'static Uniform {
    DEFAULT_SELECTOR.get_or_init(|| Uniform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn filters_by_round_length_bounds() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("words_round1.txt"), "hi\nGAME\nTOOLONGWORDHERE\n").unwrap();

        let lists = WordLists::load(dir.path());
        let picked = lists.pick(1, &FirstWord);
        assert_eq!(picked, "GAME");
    }

    #[test]
    fn falls_back_when_corpus_missing() {
        let dir = tempdir().unwrap();
        let lists = WordLists::load(dir.path());
        assert_eq!(lists.pick(2, &FirstWord), "COMPUTER");
    }
}
