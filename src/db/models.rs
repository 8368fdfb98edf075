//! Database models and domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use tracing::instrument;

use crate::db::{DbError, schema};

/// Registered participant database model.
///
/// Usernames are stored trimmed and lowercased, so uniqueness is
/// case-insensitive.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::users)]
pub struct User {
    id: i32,
    username: String,
    display_name: String,
    is_admin: bool,
    created_at: NaiveDateTime,
}

/// Insertable user model for registering new participants.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    username: String,
    display_name: String,
    is_admin: bool,
}

impl NewUser {
    /// Creates an insertable user, normalizing the username to its
    /// trimmed lowercase form.
    #[instrument]
    pub fn new(username: &str, display_name: &str, is_admin: bool) -> Self {
        Self {
            username: username.trim().to_lowercase(),
            display_name: display_name.trim().to_string(),
            is_admin,
        }
    }
}

/// One square joined with its owner's display name, for board snapshots.
#[derive(Debug, Clone, Getters, new)]
pub struct SquareView {
    id: i32,
    owner_user_id: Option<i32>,
    owner_display_name: Option<String>,
    updated_at: NaiveDateTime,
}

impl SquareView {
    /// Whether the square has no owner.
    pub fn is_open(&self) -> bool {
        self.owner_user_id.is_none()
    }
}

/// Stored quarter-end score pair.
#[derive(Debug, Clone, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::scores)]
pub struct ScoreRow {
    quarter: i32,
    rows_score: i32,
    cols_score: i32,
    updated_at: NaiveDateTime,
    updated_by_user_id: Option<i32>,
}

/// Kinds of auditable actions, stored as snake_case strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    /// A user claimed an open square.
    ClaimSquare,
    /// A user released a square they owned.
    ReleaseSquare,
    /// An administrator reassigned a square.
    ReassignSquare,
    /// An administrator reset the board.
    ResetBoard,
    /// An administrator randomized digit permutations.
    AssignDigits,
    /// An administrator entered digit permutations manually.
    SetDigits,
    /// An administrator cleared both digit permutations.
    ClearDigits,
    /// An administrator recorded a quarter score.
    UpdateScore,
    /// An administrator changed board settings.
    UpdateSettings,
    /// A participant account was created.
    CreateUser,
}

/// Append-only audit event database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::audit_events)]
pub struct AuditEvent {
    id: i32,
    created_at: NaiveDateTime,
    actor_user_id: Option<i32>,
    action: String,
    details_json: String,
}

impl AuditEvent {
    /// Parses the stored action string into an [`AuditAction`].
    #[instrument(skip(self), fields(action = %self.action))]
    pub fn parse_action(&self) -> Result<AuditAction, DbError> {
        self.action
            .parse()
            .map_err(|_| DbError::new(format!("Invalid audit action: '{}'", self.action)))
    }

    /// Parses the stored detail payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored payload is not valid JSON.
    #[instrument(skip(self))]
    pub fn details(&self) -> Result<serde_json::Value, DbError> {
        serde_json::from_str(&self.details_json)
            .map_err(|e| DbError::new(format!("Invalid audit details: {}", e)))
    }
}

/// Insertable audit event model.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::audit_events)]
pub struct NewAuditEvent {
    actor_user_id: Option<i32>,
    action: String,
    details_json: String,
}
