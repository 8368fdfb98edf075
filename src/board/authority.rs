//! Board Authority: mediates all square ownership transitions.

use std::collections::BTreeSet;

use derive_getters::Getters;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::board::{BoardError, ChangeOutcome, SkipReason};
use crate::db::{AuditAction, BoardRepository, SquareView, User};
use crate::grid::SquareId;
use crate::settings::{
    KEY_BOARD_LOCKED, KEY_MAX_SQUARES_PER_USER, KEY_PRICE_PER_SQUARE, KEY_TEAM_COLUMNS,
    KEY_TEAM_ROWS, SettingsUpdate,
};

/// Presentation-facing board state: all 100 squares plus status flags.
#[derive(Debug, Clone, Getters)]
pub struct BoardSnapshot {
    /// All squares in id order, with owner display names.
    squares: Vec<SquareView>,
    /// How many squares are currently owned.
    claimed_count: usize,
    /// Whether the board lock flag is set.
    board_locked: bool,
    /// Capacity cap, 0 = unlimited.
    max_squares_per_user: u32,
    /// Price per square, display only.
    price_per_square: u32,
    /// Row-axis team name.
    team_rows: String,
    /// Column-axis team name.
    team_columns: String,
    /// Whether both digit permutations are assigned.
    digits_assigned: bool,
}

/// Mediates all transitions of square ownership, enforcing exclusivity,
/// capacity, and lock invariants under concurrent access.
///
/// Correctness under concurrency relies on the persistence layer's
/// per-statement atomicity and the per-square re-read policy in
/// [`apply_changes`](Self::apply_changes); there is no in-process lock.
#[derive(Debug, Clone)]
pub struct BoardAuthority {
    repo: BoardRepository,
}

impl BoardAuthority {
    /// Creates a board authority over the given repository.
    #[instrument(skip(repo))]
    pub fn new(repo: BoardRepository) -> Self {
        Self { repo }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &BoardRepository {
        &self.repo
    }

    /// Applies a batch of desired claims and releases for a user.
    ///
    /// Hard gates, checked before any write:
    /// - the board lock rejects the whole batch with [`BoardError::BoardLocked`];
    /// - any id outside `0..=99` rejects the whole batch with
    ///   [`BoardError::InvalidSquareId`];
    /// - if the cap is set and the batch's *projected* ownership (current
    ///   owned + claimable − releasable, measured against a board snapshot)
    ///   exceeds it, the whole batch fails with
    ///   [`BoardError::CapacityExceeded`].
    ///
    /// Past the gates, each square is processed individually against a
    /// freshly-read owner, so a concurrent caller's change turns into a
    /// per-item skip rather than corrupted ownership. A remaining-slot
    /// counter, seeded from a fresh ownership count minus the planned
    /// releases, enforces the cap a second time at write level; claims
    /// beyond it are skipped with "limit reached".
    ///
    /// # Errors
    ///
    /// [`BoardError::BoardLocked`], [`BoardError::InvalidSquareId`],
    /// [`BoardError::CapacityExceeded`] (all with zero side effects), or
    /// [`BoardError::Db`] on persistence failure.
    #[instrument(skip(self, user), fields(user_id = user.id()))]
    pub fn apply_changes(
        &self,
        user: &User,
        desired_claims: &[i32],
        desired_releases: &[i32],
    ) -> Result<ChangeOutcome, BoardError> {
        let claims = validate_ids(desired_claims)?;
        let releases = validate_ids(desired_releases)?;
        debug!(
            claims = claims.len(),
            releases = releases.len(),
            "Validated batch"
        );

        let settings = self.repo.load_settings()?;
        if *settings.board_locked() {
            warn!(user_id = user.id(), "Batch rejected: board locked");
            return Err(BoardError::BoardLocked);
        }
        let cap = *settings.max_squares_per_user();

        // Capacity pre-check against the projected result of the whole
        // batch, measured on one board snapshot.
        let squares = self.repo.list_squares()?;
        let open: BTreeSet<i32> = squares
            .iter()
            .filter(|s| s.is_open())
            .map(|s| *s.id())
            .collect();
        let mine: BTreeSet<i32> = squares
            .iter()
            .filter(|s| *s.owner_user_id() == Some(*user.id()))
            .map(|s| *s.id())
            .collect();
        let claimable = claims.iter().filter(|sq| open.contains(&sq.index())).count();
        let releasable = releases
            .iter()
            .filter(|sq| mine.contains(&sq.index()))
            .count();
        let projected = mine.len() as i64 + claimable as i64 - releasable as i64;
        if cap > 0 && projected > cap as i64 {
            warn!(
                user_id = user.id(),
                cap, projected, "Batch rejected: capacity exceeded"
            );
            return Err(BoardError::CapacityExceeded {
                cap,
                projected: projected.max(0) as u32,
            });
        }

        // Write-time slot counter, seeded from a fresh ownership count so
        // a claim that raced in through another session still counts.
        let owned_now = self.repo.count_owned_by(*user.id())?;
        let mut remaining: Option<u32> = (cap > 0)
            .then(|| cap.saturating_sub((owned_now - releasable as i64).max(0) as u32));

        let mut outcome = ChangeOutcome::default();

        for square in &claims {
            if remaining == Some(0) {
                outcome.record_skip(*square, SkipReason::LimitReached);
                continue;
            }
            // Re-read this square's owner: another caller may have
            // claimed it since the snapshot.
            match self.repo.get_square_owner(square.index())? {
                Some(_) => outcome.record_skip(*square, SkipReason::Taken),
                None => {
                    self.repo
                        .set_square_owner(square.index(), Some(*user.id()))?;
                    self.repo.log_event(
                        Some(*user.id()),
                        AuditAction::ClaimSquare,
                        json!({ "square_id": square.index() }),
                    )?;
                    outcome.record_claim(*square);
                    remaining = remaining.map(|n| n - 1);
                }
            }
        }

        for square in &releases {
            match self.repo.get_square_owner(square.index())? {
                Some(owner) if owner == *user.id() => {
                    self.repo.set_square_owner(square.index(), None)?;
                    self.repo.log_event(
                        Some(*user.id()),
                        AuditAction::ReleaseSquare,
                        json!({ "square_id": square.index() }),
                    )?;
                    outcome.record_release(*square);
                }
                _ => outcome.record_skip(*square, SkipReason::NotYours),
            }
        }

        info!(user_id = user.id(), summary = %outcome.summary(), "Batch applied");
        Ok(outcome)
    }

    /// Reassigns a square to a new owner (or to nobody), bypassing
    /// capacity and lock checks. Administrator-only.
    ///
    /// # Errors
    ///
    /// [`BoardError::AdminRequired`] for a non-admin actor,
    /// [`BoardError::InvalidSquareId`] for an id outside `0..=99`, or
    /// [`BoardError::Db`] on persistence failure.
    #[instrument(skip(self, actor), fields(actor_id = actor.id()))]
    pub fn reassign(
        &self,
        actor: &User,
        square_id: i32,
        new_owner: Option<i32>,
    ) -> Result<(), BoardError> {
        require_admin(actor)?;
        let square =
            SquareId::new(square_id).ok_or(BoardError::InvalidSquareId { id: square_id })?;

        self.repo.set_square_owner(square.index(), new_owner)?;
        self.repo.log_event(
            Some(*actor.id()),
            AuditAction::ReassignSquare,
            json!({ "square_id": square.index(), "new_owner_user_id": new_owner }),
        )?;
        info!(actor_id = actor.id(), %square, ?new_owner, "Square reassigned");
        Ok(())
    }

    /// Clears all ownership, zeroes all quarter scores, unsets both digit
    /// permutations, and clears the lock flag. User accounts survive.
    /// Administrator-only; atomic from the caller's perspective.
    ///
    /// # Errors
    ///
    /// [`BoardError::AdminRequired`] for a non-admin actor, or
    /// [`BoardError::Db`] on persistence failure.
    #[instrument(skip(self, actor), fields(actor_id = actor.id()))]
    pub fn reset_board(&self, actor: &User) -> Result<(), BoardError> {
        require_admin(actor)?;

        self.repo.reset_board_keep_users()?;
        self.repo
            .log_event(Some(*actor.id()), AuditAction::ResetBoard, json!({}))?;
        info!(actor_id = actor.id(), "Board reset");
        Ok(())
    }

    /// Writes team names, price, capacity cap, and lock flag as one
    /// batch. Administrator-only.
    ///
    /// # Errors
    ///
    /// [`BoardError::AdminRequired`] for a non-admin actor, or
    /// [`BoardError::Db`] on persistence failure.
    #[instrument(skip(self, actor, update), fields(actor_id = actor.id()))]
    pub fn update_settings(&self, actor: &User, update: &SettingsUpdate) -> Result<(), BoardError> {
        require_admin(actor)?;

        self.repo.set_settings(&[
            (KEY_TEAM_ROWS, update.team_rows().clone()),
            (KEY_TEAM_COLUMNS, update.team_columns().clone()),
            (KEY_PRICE_PER_SQUARE, update.price_per_square().to_string()),
            (
                KEY_MAX_SQUARES_PER_USER,
                update.max_squares_per_user().to_string(),
            ),
            (
                KEY_BOARD_LOCKED,
                if *update.board_locked() { "1" } else { "0" }.to_string(),
            ),
        ])?;
        self.repo.log_event(
            Some(*actor.id()),
            AuditAction::UpdateSettings,
            json!({
                "team_rows": update.team_rows(),
                "team_columns": update.team_columns(),
                "price_per_square": update.price_per_square(),
                "max_squares_per_user": update.max_squares_per_user(),
                "board_locked": update.board_locked(),
            }),
        )?;
        info!(actor_id = actor.id(), "Settings updated");
        Ok(())
    }

    /// Reads a presentation-facing snapshot of the whole board.
    ///
    /// # Errors
    ///
    /// [`BoardError::Db`] on persistence failure.
    #[instrument(skip(self))]
    pub fn snapshot(&self) -> Result<BoardSnapshot, BoardError> {
        let settings = self.repo.load_settings()?;
        let squares = self.repo.list_squares()?;
        let claimed_count = squares.iter().filter(|s| !s.is_open()).count();

        Ok(BoardSnapshot {
            claimed_count,
            board_locked: *settings.board_locked(),
            max_squares_per_user: *settings.max_squares_per_user(),
            price_per_square: *settings.price_per_square(),
            team_rows: settings.team_rows().clone(),
            team_columns: settings.team_columns().clone(),
            digits_assigned: settings.digit_assignment().is_some(),
            squares,
        })
    }
}

/// Validates and deduplicates raw square ids, ascending.
fn validate_ids(ids: &[i32]) -> Result<Vec<SquareId>, BoardError> {
    let mut validated = BTreeSet::new();
    for &id in ids {
        let square = SquareId::new(id).ok_or(BoardError::InvalidSquareId { id })?;
        validated.insert(square);
    }
    Ok(validated.into_iter().collect())
}

fn require_admin(actor: &User) -> Result<(), BoardError> {
    if *actor.is_admin() {
        Ok(())
    } else {
        warn!(actor_id = actor.id(), "Administrator check failed");
        Err(BoardError::AdminRequired)
    }
}
