//! Typed view over the persisted board settings.
//!
//! Settings live in a key-value table and are read fresh at the start of
//! every operation rather than cached in process memory, so concurrent
//! callers never act on stale lock or capacity state.

use std::collections::HashMap;

use derive_getters::Getters;
use derive_new::new;

use crate::draw::Digits;

/// Row-axis team display name.
pub(crate) const KEY_TEAM_ROWS: &str = "team_rows";
/// Column-axis team display name.
pub(crate) const KEY_TEAM_COLUMNS: &str = "team_columns";
/// Price per square, display only.
pub(crate) const KEY_PRICE_PER_SQUARE: &str = "price_per_square";
/// Board lock flag, "1" or "0".
pub(crate) const KEY_BOARD_LOCKED: &str = "board_locked";
/// Row-axis digit permutation JSON, empty when unset.
pub(crate) const KEY_ROW_DIGITS: &str = "row_digits_json";
/// Column-axis digit permutation JSON, empty when unset.
pub(crate) const KEY_COL_DIGITS: &str = "col_digits_json";
/// Capacity cap per user, "0" meaning unlimited.
pub(crate) const KEY_MAX_SQUARES_PER_USER: &str = "max_squares_per_user";

/// Default value for a settings key, used both for seeding and as the
/// fallback when a row is missing.
pub(crate) fn default_setting(key: &str) -> &'static str {
    match key {
        KEY_TEAM_ROWS => "Away",
        KEY_TEAM_COLUMNS => "Home",
        KEY_PRICE_PER_SQUARE => "5",
        KEY_BOARD_LOCKED => "0",
        KEY_MAX_SQUARES_PER_USER => "0",
        _ => "",
    }
}

/// All settings keys, in seeding order.
pub(crate) const ALL_KEYS: [&str; 7] = [
    KEY_TEAM_ROWS,
    KEY_TEAM_COLUMNS,
    KEY_PRICE_PER_SQUARE,
    KEY_BOARD_LOCKED,
    KEY_ROW_DIGITS,
    KEY_COL_DIGITS,
    KEY_MAX_SQUARES_PER_USER,
];

/// A parsed snapshot of every board setting.
#[derive(Debug, Clone, Getters)]
pub struct BoardSettings {
    /// Row-axis team name.
    team_rows: String,
    /// Column-axis team name.
    team_columns: String,
    /// Price per square in whole currency units, display only.
    price_per_square: u32,
    /// When set, all ownership-mutating operations are rejected.
    board_locked: bool,
    /// Maximum squares one user may own concurrently, 0 = unlimited.
    max_squares_per_user: u32,
    /// Row-axis digit permutation, `None` while unset.
    row_digits: Option<Digits>,
    /// Column-axis digit permutation, `None` while unset.
    col_digits: Option<Digits>,
}

impl BoardSettings {
    /// Builds a settings snapshot from raw key-value rows, falling back to
    /// defaults for missing keys and treating unparseable values the way
    /// the defaults would read.
    pub(crate) fn from_rows(rows: &HashMap<String, String>) -> Self {
        let get = |key: &str| -> String {
            rows.get(key)
                .cloned()
                .unwrap_or_else(|| default_setting(key).to_string())
        };
        Self {
            team_rows: get(KEY_TEAM_ROWS),
            team_columns: get(KEY_TEAM_COLUMNS),
            price_per_square: get(KEY_PRICE_PER_SQUARE).parse().unwrap_or(0),
            board_locked: get(KEY_BOARD_LOCKED) == "1",
            max_squares_per_user: get(KEY_MAX_SQUARES_PER_USER).parse().unwrap_or(0),
            row_digits: Digits::parse_json(&get(KEY_ROW_DIGITS)),
            col_digits: Digits::parse_json(&get(KEY_COL_DIGITS)),
        }
    }

    /// Returns both digit permutations when both axes are assigned.
    ///
    /// Winner computation is undefined until this returns `Some`.
    pub fn digit_assignment(&self) -> Option<(Digits, Digits)> {
        Some((self.row_digits?, self.col_digits?))
    }
}

/// Administrator-editable settings, written as one batch.
#[derive(Debug, Clone, Getters, new)]
pub struct SettingsUpdate {
    /// Row-axis team name.
    team_rows: String,
    /// Column-axis team name.
    team_columns: String,
    /// Price per square, display only.
    price_per_square: u32,
    /// Capacity cap per user, 0 = unlimited.
    max_squares_per_user: u32,
    /// Board lock flag.
    board_locked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_rows_missing() {
        let settings = BoardSettings::from_rows(&HashMap::new());
        assert_eq!(settings.team_rows(), "Away");
        assert_eq!(settings.team_columns(), "Home");
        assert_eq!(*settings.price_per_square(), 5);
        assert!(!*settings.board_locked());
        assert_eq!(*settings.max_squares_per_user(), 0);
        assert!(settings.digit_assignment().is_none());
    }

    #[test]
    fn test_malformed_digits_read_as_unset() {
        let mut rows = HashMap::new();
        rows.insert(KEY_ROW_DIGITS.to_string(), "[0,1,2]".to_string());
        rows.insert(
            KEY_COL_DIGITS.to_string(),
            "[0,1,2,3,4,5,6,7,8,9]".to_string(),
        );
        let settings = BoardSettings::from_rows(&rows);
        assert!(settings.row_digits().is_none());
        assert!(settings.col_digits().is_some());
        // One axis alone never yields an assignment.
        assert!(settings.digit_assignment().is_none());
    }

    #[test]
    fn test_lock_and_cap_parsing() {
        let mut rows = HashMap::new();
        rows.insert(KEY_BOARD_LOCKED.to_string(), "1".to_string());
        rows.insert(KEY_MAX_SQUARES_PER_USER.to_string(), "7".to_string());
        let settings = BoardSettings::from_rows(&rows);
        assert!(*settings.board_locked());
        assert_eq!(*settings.max_squares_per_user(), 7);
    }
}
