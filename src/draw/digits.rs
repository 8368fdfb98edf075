//! Digit permutations mapping board rows and columns to score last digits.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Board axis selector for digit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Axis {
    /// The row axis only.
    Rows,
    /// The column axis only.
    Cols,
    /// Both axes.
    Both,
}

/// A permutation of `{0..9}` assigned to one board axis.
///
/// Index `i` holds the last digit mapped to row (or column) `i`. The
/// constructor guarantees every digit appears exactly once, so a digit
/// lookup always resolves to a single board index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Digits([u8; 10]);

impl Digits {
    /// Validates a candidate permutation: exactly ten digits, each in
    /// `0..=9`, no repeats.
    pub fn try_new(values: &[u8]) -> Option<Self> {
        if values.len() != 10 {
            return None;
        }
        let mut seen = [false; 10];
        let mut digits = [0u8; 10];
        for (slot, &value) in digits.iter_mut().zip(values) {
            if value > 9 || seen[value as usize] {
                return None;
            }
            seen[value as usize] = true;
            *slot = value;
        }
        Some(Self(digits))
    }

    /// Draws a uniformly random permutation (Fisher-Yates shuffle).
    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut digits = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        digits.shuffle(rng);
        Self(digits)
    }

    /// Parses the persisted JSON representation.
    ///
    /// Returns `None` for the empty string and for any value that is not
    /// an array of exactly ten distinct integers in `0..=9` - malformed
    /// stored assignments are treated as unset, never partially applied.
    pub fn parse_json(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let values: Vec<u8> = serde_json::from_str(raw).ok()?;
        Self::try_new(&values)
    }

    /// Serializes to the persisted JSON representation.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0.to_vec()).unwrap_or_default()
    }

    /// Returns the board index holding the given last digit.
    ///
    /// `digit` is reduced mod 10 first, so any score value may be passed.
    pub fn index_of(&self, digit: u8) -> usize {
        let digit = digit % 10;
        self.0
            .iter()
            .position(|d| *d == digit)
            .expect("permutation contains every digit")
    }

    /// Returns the digit assigned to the given board index in `0..=9`.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// Returns the permutation as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for Digits {
    type Error = String;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        Self::try_new(&values).ok_or_else(|| "not a permutation of 0..=9".to_string())
    }
}

impl From<Digits> for Vec<u8> {
    fn from(digits: Digits) -> Self {
        digits.0.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_accepts_permutation() {
        let digits = Digits::try_new(&[3, 0, 1, 9, 8, 7, 6, 5, 4, 2]).expect("valid");
        assert_eq!(digits.index_of(3), 0);
        assert_eq!(digits.index_of(2), 9);
    }

    #[test]
    fn test_try_new_rejects_bad_input() {
        assert!(Digits::try_new(&[0, 1, 2]).is_none());
        assert!(Digits::try_new(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 8]).is_none());
        assert!(Digits::try_new(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 10]).is_none());
    }

    #[test]
    fn test_parse_json_treats_malformed_as_unset() {
        assert!(Digits::parse_json("").is_none());
        assert!(Digits::parse_json("not json").is_none());
        assert!(Digits::parse_json("{\"a\":1}").is_none());
        assert!(Digits::parse_json("[0,1,2]").is_none());
        assert!(Digits::parse_json("[0,1,2,3,4,5,6,7,8,8]").is_none());
        assert!(Digits::parse_json("[0,1,2,3,4,5,6,7,8,9]").is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let digits = Digits::try_new(&[9, 8, 7, 6, 5, 4, 3, 2, 1, 0]).expect("valid");
        let parsed = Digits::parse_json(&digits.to_json()).expect("round trip");
        assert_eq!(parsed, digits);
    }

    #[test]
    fn test_random_is_permutation() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let digits = Digits::random(&mut rng);
            let mut seen = [false; 10];
            for &d in digits.as_slice() {
                assert!(d <= 9);
                assert!(!seen[d as usize], "digit repeated");
                seen[d as usize] = true;
            }
        }
    }

    #[test]
    fn test_index_of_reduces_mod_ten() {
        let digits = Digits::try_new(&[3, 0, 1, 9, 8, 7, 6, 5, 4, 2]).expect("valid");
        // A score of 23 has last digit 3, which sits at index 0.
        assert_eq!(digits.index_of(23 % 10), 0);
        assert_eq!(digits.index_of(13), 0);
    }
}
