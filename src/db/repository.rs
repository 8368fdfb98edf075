//! Database repository for board state, settings, scores, and audit events.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::{
    AuditAction, AuditEvent, DbError, NewAuditEvent, NewUser, ScoreRow, SquareView, User, schema,
};
use crate::grid::SQUARE_COUNT;
use crate::settings::{
    ALL_KEYS, BoardSettings, KEY_BOARD_LOCKED, KEY_COL_DIGITS, KEY_ROW_DIGITS, default_setting,
};

/// Number of quarters with a stored score row.
pub const QUARTERS: i32 = 4;

fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Database repository for all persisted board state.
///
/// Each call opens its own connection and performs one read-modify-write
/// step; nothing is cached across calls, so every operation observes the
/// latest committed state.
#[derive(Debug, Clone)]
pub struct BoardRepository {
    db_path: String,
}

impl BoardRepository {
    /// Creates a new repository connected to the database at the given path.
    ///
    /// Use `":memory:"` for an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is invalid.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        info!(path = %db_path, "Creating BoardRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Seeds the 100 squares, default settings, and four score rows.
    ///
    /// Idempotent: existing rows are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> Result<(), DbError> {
        debug!("Seeding board state");
        let mut conn = self.connection()?;

        let square_rows: Vec<_> = (0..SQUARE_COUNT)
            .map(|id| schema::squares::id.eq(id))
            .collect();
        diesel::insert_or_ignore_into(schema::squares::table)
            .values(&square_rows)
            .execute(&mut conn)?;

        let setting_rows: Vec<_> = ALL_KEYS
            .iter()
            .map(|key| {
                (
                    schema::settings::key.eq(*key),
                    schema::settings::value.eq(default_setting(key)),
                )
            })
            .collect();
        diesel::insert_or_ignore_into(schema::settings::table)
            .values(&setting_rows)
            .execute(&mut conn)?;

        let score_rows: Vec<_> = (1..=QUARTERS)
            .map(|q| schema::scores::quarter.eq(q))
            .collect();
        diesel::insert_or_ignore_into(schema::scores::table)
            .values(&score_rows)
            .execute(&mut conn)?;

        info!("Board state seeded");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Squares
    // ─────────────────────────────────────────────────────────────

    /// Reads the current owner of one square.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the square row is missing or a database
    /// error occurs.
    #[instrument(skip(self))]
    pub fn get_square_owner(&self, square_id: i32) -> Result<Option<i32>, DbError> {
        debug!(square_id, "Reading square owner");
        let mut conn = self.connection()?;

        schema::squares::table
            .find(square_id)
            .select(schema::squares::owner_user_id)
            .first::<Option<i32>>(&mut conn)
            .optional()?
            .ok_or_else(|| DbError::new(format!("Square {} not seeded", square_id)))
    }

    /// Sets or clears the owner of one square.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn set_square_owner(&self, square_id: i32, owner: Option<i32>) -> Result<(), DbError> {
        debug!(square_id, ?owner, "Writing square owner");
        let mut conn = self.connection()?;

        diesel::update(schema::squares::table.find(square_id))
            .set((
                schema::squares::owner_user_id.eq(owner),
                schema::squares::updated_at.eq(now()),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    /// Counts how many squares a user currently owns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn count_owned_by(&self, user_id: i32) -> Result<i64, DbError> {
        let mut conn = self.connection()?;

        let count = schema::squares::table
            .filter(schema::squares::owner_user_id.eq(user_id))
            .count()
            .get_result(&mut conn)?;
        debug!(user_id, count, "Counted owned squares");
        Ok(count)
    }

    /// Lists the ids of the squares a user currently owns, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn owned_square_ids(&self, user_id: i32) -> Result<Vec<i32>, DbError> {
        let mut conn = self.connection()?;

        let ids = schema::squares::table
            .filter(schema::squares::owner_user_id.eq(user_id))
            .select(schema::squares::id)
            .order(schema::squares::id.asc())
            .load(&mut conn)?;
        Ok(ids)
    }

    /// Loads all 100 squares with owner display names, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_squares(&self) -> Result<Vec<SquareView>, DbError> {
        debug!("Loading board squares");
        let mut conn = self.connection()?;

        let rows = schema::squares::table
            .left_join(schema::users::table)
            .select((
                schema::squares::id,
                schema::squares::owner_user_id,
                schema::users::display_name.nullable(),
                schema::squares::updated_at,
            ))
            .order(schema::squares::id.asc())
            .load::<(i32, Option<i32>, Option<String>, NaiveDateTime)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(id, owner, name, at)| SquareView::new(id, owner, name, at))
            .collect())
    }

    // ─────────────────────────────────────────────────────────────
    //  Settings
    // ─────────────────────────────────────────────────────────────

    /// Reads one setting, falling back to its default when missing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_setting(&self, key: &str) -> Result<String, DbError> {
        let mut conn = self.connection()?;

        let value = schema::settings::table
            .find(key)
            .select(schema::settings::value)
            .first::<String>(&mut conn)
            .optional()?;
        Ok(value.unwrap_or_else(|| default_setting(key).to_string()))
    }

    /// Writes one setting (insert or update).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, value))]
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), DbError> {
        debug!(key, "Writing setting");
        let mut conn = self.connection()?;
        upsert_setting(&mut conn, key, value)
    }

    /// Writes several settings in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs; no partial writes
    /// remain on failure.
    #[instrument(skip(self, pairs), fields(count = pairs.len()))]
    pub fn set_settings(&self, pairs: &[(&str, String)]) -> Result<(), DbError> {
        debug!("Writing settings batch");
        let mut conn = self.connection()?;

        conn.transaction::<_, DbError, _>(|conn| {
            for (key, value) in pairs {
                upsert_setting(conn, key, value)?;
            }
            Ok(())
        })
    }

    /// Loads every settings row as raw key-value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn settings_rows(&self) -> Result<HashMap<String, String>, DbError> {
        let mut conn = self.connection()?;

        let rows = schema::settings::table
            .select((schema::settings::key, schema::settings::value))
            .load::<(String, String)>(&mut conn)?;
        Ok(rows.into_iter().collect())
    }

    /// Loads a parsed snapshot of every board setting.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn load_settings(&self) -> Result<BoardSettings, DbError> {
        let rows = self.settings_rows()?;
        Ok(BoardSettings::from_rows(&rows))
    }

    // ─────────────────────────────────────────────────────────────
    //  Scores
    // ─────────────────────────────────────────────────────────────

    /// Reads the stored score pair for a quarter.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the score row is missing or a database
    /// error occurs.
    #[instrument(skip(self))]
    pub fn get_score(&self, quarter: i32) -> Result<ScoreRow, DbError> {
        let mut conn = self.connection()?;

        schema::scores::table
            .find(quarter)
            .select(ScoreRow::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| DbError::new(format!("Missing score row for quarter {}", quarter)))
    }

    /// Overwrites the stored score pair for a quarter.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn set_score(
        &self,
        quarter: i32,
        rows_score: i32,
        cols_score: i32,
        updated_by: i32,
    ) -> Result<(), DbError> {
        debug!(quarter, rows_score, cols_score, "Writing score");
        let mut conn = self.connection()?;

        diesel::update(schema::scores::table.find(quarter))
            .set((
                schema::scores::rows_score.eq(rows_score),
                schema::scores::cols_score.eq(cols_score),
                schema::scores::updated_at.eq(now()),
                schema::scores::updated_by_user_id.eq(Some(updated_by)),
            ))
            .execute(&mut conn)?;

        info!(quarter, rows_score, cols_score, "Score recorded");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Audit log
    // ─────────────────────────────────────────────────────────────

    /// Appends an audit event.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, details), fields(action = %action))]
    pub fn log_event(
        &self,
        actor: Option<i32>,
        action: AuditAction,
        details: serde_json::Value,
    ) -> Result<(), DbError> {
        debug!(?actor, "Appending audit event");
        let mut conn = self.connection()?;

        let event = NewAuditEvent::new(actor, action.to_string(), details.to_string());
        diesel::insert_into(schema::audit_events::table)
            .values(&event)
            .execute(&mut conn)?;
        Ok(())
    }

    /// Loads the most recent audit events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn recent_events(&self, limit: i64) -> Result<Vec<AuditEvent>, DbError> {
        let mut conn = self.connection()?;

        let events = schema::audit_events::table
            .select(AuditEvent::as_select())
            .order(schema::audit_events::id.desc())
            .limit(limit)
            .load(&mut conn)?;
        debug!(count = events.len(), "Audit events loaded");
        Ok(events)
    }

    /// Deletes all but the newest `keep_last` audit events.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn prune_events(&self, keep_last: i64) -> Result<usize, DbError> {
        debug!(keep_last, "Pruning audit log");
        let mut conn = self.connection()?;

        let deleted = if keep_last <= 0 {
            diesel::delete(schema::audit_events::table).execute(&mut conn)?
        } else {
            let oldest_kept = schema::audit_events::table
                .select(schema::audit_events::id)
                .order(schema::audit_events::id.desc())
                .offset(keep_last - 1)
                .limit(1)
                .first::<i32>(&mut conn)
                .optional()?;
            match oldest_kept {
                Some(id) => diesel::delete(
                    schema::audit_events::table.filter(schema::audit_events::id.lt(id)),
                )
                .execute(&mut conn)?,
                None => 0,
            }
        };

        info!(deleted, "Audit log pruned");
        Ok(deleted)
    }

    // ─────────────────────────────────────────────────────────────
    //  Users
    // ─────────────────────────────────────────────────────────────

    /// Registers a new participant.
    ///
    /// The username is trimmed and lowercased before insertion, so
    /// uniqueness is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the username is already taken or a database
    /// error occurs.
    #[instrument(skip(self))]
    pub fn create_user(
        &self,
        username: &str,
        display_name: &str,
        is_admin: bool,
    ) -> Result<User, DbError> {
        debug!(username, "Creating user");
        let mut conn = self.connection()?;

        let new_user = NewUser::new(username, display_name, is_admin);
        let user = diesel::insert_into(schema::users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        let event = NewAuditEvent::new(
            Some(*user.id()),
            AuditAction::CreateUser.to_string(),
            serde_json::json!({ "username": user.username() }).to_string(),
        );
        diesel::insert_into(schema::audit_events::table)
            .values(&event)
            .execute(&mut conn)?;

        info!(user_id = user.id(), username = %user.username(), "User created");
        Ok(user)
    }

    /// Gets a user by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user(&self, user_id: i32) -> Result<Option<User>, DbError> {
        let mut conn = self.connection()?;

        let user = schema::users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user)
    }

    /// Gets a user by username, case-insensitively. Returns `None` if not
    /// found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let mut conn = self.connection()?;

        let user = schema::users::table
            .filter(schema::users::username.eq(username.trim().to_lowercase()))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user)
    }

    /// Lists all participants, ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        let mut conn = self.connection()?;

        let users = schema::users::table
            .select(User::as_select())
            .order(schema::users::created_at.asc())
            .load(&mut conn)?;
        debug!(count = users.len(), "Users loaded");
        Ok(users)
    }

    // ─────────────────────────────────────────────────────────────
    //  Reset
    // ─────────────────────────────────────────────────────────────

    /// Clears all ownership, zeroes all quarter scores, unsets both digit
    /// permutations, and clears the lock flag - in one transaction.
    ///
    /// User accounts survive the reset.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs; no partial reset
    /// remains on failure.
    #[instrument(skip(self))]
    pub fn reset_board_keep_users(&self) -> Result<(), DbError> {
        debug!("Resetting board");
        let mut conn = self.connection()?;

        conn.transaction::<_, DbError, _>(|conn| {
            diesel::update(schema::squares::table)
                .set((
                    schema::squares::owner_user_id.eq(None::<i32>),
                    schema::squares::updated_at.eq(now()),
                ))
                .execute(conn)?;

            diesel::update(schema::scores::table)
                .set((
                    schema::scores::rows_score.eq(0),
                    schema::scores::cols_score.eq(0),
                    schema::scores::updated_at.eq(now()),
                    schema::scores::updated_by_user_id.eq(None::<i32>),
                ))
                .execute(conn)?;

            upsert_setting(conn, KEY_ROW_DIGITS, "")?;
            upsert_setting(conn, KEY_COL_DIGITS, "")?;
            upsert_setting(conn, KEY_BOARD_LOCKED, "0")?;
            Ok(())
        })?;

        info!("Board reset, users kept");
        Ok(())
    }
}

/// Inserts or updates one settings row on an open connection.
fn upsert_setting(conn: &mut SqliteConnection, key: &str, value: &str) -> Result<(), DbError> {
    diesel::insert_into(schema::settings::table)
        .values((
            schema::settings::key.eq(key),
            schema::settings::value.eq(value),
            schema::settings::updated_at.eq(now()),
        ))
        .on_conflict(schema::settings::key)
        .do_update()
        .set((
            schema::settings::value.eq(value),
            schema::settings::updated_at.eq(now()),
        ))
        .execute(conn)?;
    Ok(())
}
