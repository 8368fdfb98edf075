//! Draw & Scoring Engine: digit permutations and quarter winners.

use derive_getters::Getters;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::db::{AuditAction, BoardRepository, QUARTERS, User};
use crate::draw::{Axis, Digits, DrawError};
use crate::grid::SquareId;
use crate::settings::{KEY_COL_DIGITS, KEY_ROW_DIGITS};

/// The winning square for one quarter, derived from the stored score and
/// the digit assignment.
#[derive(Debug, Clone, Getters)]
pub struct QuarterWinner {
    /// Quarter number in `1..=4`.
    quarter: i32,
    /// Row-axis team score as stored.
    rows_score: i32,
    /// Column-axis team score as stored.
    cols_score: i32,
    /// Last digit of the row-axis score.
    rows_last_digit: u8,
    /// Last digit of the column-axis score.
    cols_last_digit: u8,
    /// The winning square.
    square: SquareId,
    /// Display name of the winning square's owner, if claimed.
    owner_display_name: Option<String>,
}

/// Produces and stores digit permutations and computes quarter winners.
///
/// The winner is a pure function of the stored score and the stored
/// permutations, recomputed on every read - changing a score or
/// re-randomizing digits changes the reported winner immediately.
#[derive(Debug, Clone)]
pub struct DrawEngine {
    repo: BoardRepository,
}

impl DrawEngine {
    /// Creates a draw engine over the given repository.
    #[instrument(skip(repo))]
    pub fn new(repo: BoardRepository) -> Self {
        Self { repo }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &BoardRepository {
        &self.repo
    }

    /// Randomizes the digit permutation for the given axis or axes with an
    /// unbiased shuffle and persists the result immediately.
    /// Administrator-only.
    ///
    /// Randomizing a single axis overwrites only that axis - unless the
    /// other axis has no prior assignment, in which case it is drawn too,
    /// so a valid pair always results. Returns the persisted pair.
    ///
    /// # Errors
    ///
    /// [`DrawError::AdminRequired`] for a non-admin actor, or
    /// [`DrawError::Db`] on persistence failure.
    #[instrument(skip(self, actor), fields(actor_id = actor.id()))]
    pub fn randomize_digits(&self, actor: &User, scope: Axis) -> Result<(Digits, Digits), DrawError> {
        require_admin(actor)?;

        let settings = self.repo.load_settings()?;
        let mut rng = rand::thread_rng();
        let (rows, cols) = match scope {
            Axis::Both => (Digits::random(&mut rng), Digits::random(&mut rng)),
            Axis::Rows => (
                Digits::random(&mut rng),
                (*settings.col_digits()).unwrap_or_else(|| Digits::random(&mut rng)),
            ),
            Axis::Cols => (
                (*settings.row_digits()).unwrap_or_else(|| Digits::random(&mut rng)),
                Digits::random(&mut rng),
            ),
        };

        self.store_digits(actor, rows, cols, AuditAction::AssignDigits, scope)?;
        info!(actor_id = actor.id(), %scope, "Digits randomized");
        Ok((rows, cols))
    }

    /// Assigns both digit permutations from explicit values.
    /// Administrator-only.
    ///
    /// # Errors
    ///
    /// [`DrawError::InvalidDigitAssignment`] if either axis is not a
    /// permutation of `{0..9}` (nothing is written),
    /// [`DrawError::AdminRequired`] for a non-admin actor, or
    /// [`DrawError::Db`] on persistence failure.
    #[instrument(skip(self, actor), fields(actor_id = actor.id()))]
    pub fn set_digits(&self, actor: &User, rows: &[u8], cols: &[u8]) -> Result<(), DrawError> {
        require_admin(actor)?;

        let rows = Digits::try_new(rows).ok_or(DrawError::InvalidDigitAssignment)?;
        let cols = Digits::try_new(cols).ok_or(DrawError::InvalidDigitAssignment)?;

        self.store_digits(actor, rows, cols, AuditAction::SetDigits, Axis::Both)?;
        info!(actor_id = actor.id(), "Digits set manually");
        Ok(())
    }

    /// Unsets both digit permutations atomically. Administrator-only.
    ///
    /// # Errors
    ///
    /// [`DrawError::AdminRequired`] for a non-admin actor, or
    /// [`DrawError::Db`] on persistence failure.
    #[instrument(skip(self, actor), fields(actor_id = actor.id()))]
    pub fn clear_digits(&self, actor: &User) -> Result<(), DrawError> {
        require_admin(actor)?;

        self.repo.set_settings(&[
            (KEY_ROW_DIGITS, String::new()),
            (KEY_COL_DIGITS, String::new()),
        ])?;
        self.repo
            .log_event(Some(*actor.id()), AuditAction::ClearDigits, json!({}))?;
        info!(actor_id = actor.id(), "Digits cleared");
        Ok(())
    }

    /// Whether both axes currently have a digit assignment.
    ///
    /// # Errors
    ///
    /// [`DrawError::Db`] on persistence failure.
    #[instrument(skip(self))]
    pub fn digits_assigned(&self) -> Result<bool, DrawError> {
        Ok(self.repo.load_settings()?.digit_assignment().is_some())
    }

    /// Reads the current per-axis assignments, `None` per unset axis.
    ///
    /// # Errors
    ///
    /// [`DrawError::Db`] on persistence failure.
    #[instrument(skip(self))]
    pub fn digits(&self) -> Result<(Option<Digits>, Option<Digits>), DrawError> {
        let settings = self.repo.load_settings()?;
        Ok((*settings.row_digits(), *settings.col_digits()))
    }

    /// Overwrites the stored score pair for a quarter unconditionally.
    /// Administrator-only.
    ///
    /// # Errors
    ///
    /// [`DrawError::InvalidQuarter`] outside `1..=4`,
    /// [`DrawError::InvalidScore`] for negative scores,
    /// [`DrawError::AdminRequired`] for a non-admin actor, or
    /// [`DrawError::Db`] on persistence failure.
    #[instrument(skip(self, actor), fields(actor_id = actor.id()))]
    pub fn record_score(
        &self,
        actor: &User,
        quarter: i32,
        rows_score: i32,
        cols_score: i32,
    ) -> Result<(), DrawError> {
        require_admin(actor)?;
        validate_quarter(quarter)?;
        if rows_score < 0 || cols_score < 0 {
            return Err(DrawError::InvalidScore {
                rows_score,
                cols_score,
            });
        }

        self.repo
            .set_score(quarter, rows_score, cols_score, *actor.id())?;
        self.repo.log_event(
            Some(*actor.id()),
            AuditAction::UpdateScore,
            json!({ "quarter": quarter, "rows_score": rows_score, "cols_score": cols_score }),
        )?;
        Ok(())
    }

    /// Computes the winning square for one quarter from the stored score
    /// and digit assignment.
    ///
    /// Returns `None` while either axis is unset: the engine never
    /// defaults a missing assignment, callers must check.
    ///
    /// # Errors
    ///
    /// [`DrawError::InvalidQuarter`] outside `1..=4`, or
    /// [`DrawError::Db`] on persistence failure.
    #[instrument(skip(self))]
    pub fn winner_square(&self, quarter: i32) -> Result<Option<QuarterWinner>, DrawError> {
        validate_quarter(quarter)?;

        let settings = self.repo.load_settings()?;
        let Some((row_digits, col_digits)) = settings.digit_assignment() else {
            debug!(quarter, "Digits unset, no winner");
            return Ok(None);
        };

        let score = self.repo.get_score(quarter)?;
        let rows_last_digit = (score.rows_score() % 10) as u8;
        let cols_last_digit = (score.cols_score() % 10) as u8;
        let row = row_digits.index_of(rows_last_digit);
        let col = col_digits.index_of(cols_last_digit);
        let square = SquareId::from_row_col(row as i32, col as i32)
            .expect("digit indices stay within the grid");

        let owner_display_name = match self.repo.get_square_owner(square.index())? {
            Some(owner) => self
                .repo
                .get_user(owner)?
                .map(|u| u.display_name().clone()),
            None => None,
        };

        debug!(quarter, %square, "Winner computed");
        Ok(Some(QuarterWinner {
            quarter,
            rows_score: *score.rows_score(),
            cols_score: *score.cols_score(),
            rows_last_digit,
            cols_last_digit,
            square,
            owner_display_name,
        }))
    }

    /// Computes winners for all four quarters, `None` while either axis
    /// is unset.
    ///
    /// # Errors
    ///
    /// [`DrawError::Db`] on persistence failure.
    #[instrument(skip(self))]
    pub fn quarter_winners(&self) -> Result<Option<Vec<QuarterWinner>>, DrawError> {
        let mut winners = Vec::with_capacity(QUARTERS as usize);
        for quarter in 1..=QUARTERS {
            match self.winner_square(quarter)? {
                Some(winner) => winners.push(winner),
                None => return Ok(None),
            }
        }
        Ok(Some(winners))
    }

    fn store_digits(
        &self,
        actor: &User,
        rows: Digits,
        cols: Digits,
        action: AuditAction,
        scope: Axis,
    ) -> Result<(), DrawError> {
        self.repo.set_settings(&[
            (KEY_ROW_DIGITS, rows.to_json()),
            (KEY_COL_DIGITS, cols.to_json()),
        ])?;
        self.repo.log_event(
            Some(*actor.id()),
            action,
            json!({
                "scope": scope.to_string(),
                "row_digits": rows.as_slice(),
                "col_digits": cols.as_slice(),
            }),
        )?;
        Ok(())
    }
}

fn validate_quarter(quarter: i32) -> Result<(), DrawError> {
    if (1..=QUARTERS).contains(&quarter) {
        Ok(())
    } else {
        Err(DrawError::InvalidQuarter { quarter })
    }
}

fn require_admin(actor: &User) -> Result<(), DrawError> {
    if *actor.is_admin() {
        Ok(())
    } else {
        warn!(actor_id = actor.id(), "Administrator check failed");
        Err(DrawError::AdminRequired)
    }
}
