//! Outcome manifest for claim/release batches.

use derive_getters::Getters;

use crate::grid::SquareId;

/// Why a desired change was skipped instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SkipReason {
    /// The square was already owned by someone when re-read.
    #[strum(serialize = "taken")]
    Taken,
    /// The square was no longer owned by the requester when re-read.
    #[strum(serialize = "not yours anymore")]
    NotYours,
    /// The remaining-slot counter ran out mid-batch.
    #[strum(serialize = "limit reached")]
    LimitReached,
}

/// What a claim/release batch actually did.
///
/// Races never surface as errors here: each desired change either
/// applied or was skipped with a reason.
#[derive(Debug, Clone, Default, Getters)]
pub struct ChangeOutcome {
    /// Squares newly claimed by the requester.
    claimed: Vec<SquareId>,
    /// Squares released by the requester.
    released: Vec<SquareId>,
    /// Desired changes that did not apply, with the reason.
    skipped: Vec<(SquareId, SkipReason)>,
}

impl ChangeOutcome {
    pub(crate) fn record_claim(&mut self, square: SquareId) {
        self.claimed.push(square);
    }

    pub(crate) fn record_release(&mut self, square: SquareId) {
        self.released.push(square);
    }

    pub(crate) fn record_skip(&mut self, square: SquareId, reason: SkipReason) {
        self.skipped.push((square, reason));
    }

    /// Squares skipped because the per-batch capacity counter ran out.
    pub fn skipped_for_limit(&self) -> Vec<SquareId> {
        self.skipped_with(SkipReason::LimitReached)
    }

    /// Squares skipped because another caller changed them first.
    pub fn skipped_for_contention(&self) -> Vec<SquareId> {
        self.skipped
            .iter()
            .filter(|(_, r)| *r != SkipReason::LimitReached)
            .map(|(sq, _)| *sq)
            .collect()
    }

    fn skipped_with(&self, reason: SkipReason) -> Vec<SquareId> {
        self.skipped
            .iter()
            .filter(|(_, r)| *r == reason)
            .map(|(sq, _)| *sq)
            .collect()
    }

    /// Whether nothing was applied and nothing was skipped.
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty() && self.released.is_empty() && self.skipped.is_empty()
    }

    /// Human-readable applied-vs-skipped summary, e.g.
    /// `"claimed 2, released 1, skipped 1 (changed by someone else)"`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.claimed.is_empty() {
            parts.push(format!("claimed {}", self.claimed.len()));
        }
        if !self.released.is_empty() {
            parts.push(format!("released {}", self.released.len()));
        }
        let contended = self.skipped_for_contention();
        if !contended.is_empty() {
            parts.push(format!(
                "skipped {} (changed by someone else)",
                contended.len()
            ));
        }
        let limited = self.skipped_for_limit();
        if !limited.is_empty() {
            parts.push(format!("skipped {} (limit reached)", limited.len()));
        }
        if parts.is_empty() {
            "no changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(id: i32) -> SquareId {
        SquareId::new(id).expect("valid id")
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(ChangeOutcome::default().summary(), "no changes");
    }

    #[test]
    fn test_summary_counts_by_category() {
        let mut outcome = ChangeOutcome::default();
        outcome.record_claim(sq(0));
        outcome.record_claim(sq(1));
        outcome.record_release(sq(5));
        outcome.record_skip(sq(7), SkipReason::Taken);
        outcome.record_skip(sq(8), SkipReason::LimitReached);
        assert_eq!(
            outcome.summary(),
            "claimed 2, released 1, skipped 1 (changed by someone else), skipped 1 (limit reached)"
        );
    }

    #[test]
    fn test_skip_buckets() {
        let mut outcome = ChangeOutcome::default();
        outcome.record_skip(sq(1), SkipReason::Taken);
        outcome.record_skip(sq(2), SkipReason::NotYours);
        outcome.record_skip(sq(3), SkipReason::LimitReached);
        assert_eq!(outcome.skipped_for_contention(), vec![sq(1), sq(2)]);
        assert_eq!(outcome.skipped_for_limit(), vec![sq(3)]);
    }
}
