//! Staff secrets and the daily GM password rotation.
//!
//! Secrets are plain shared values that already live in the server
//! configuration. The only moving part is the daily GM password: seven
//! configured values, one per weekday, where the "day" rolls over at
//! [`ROTATION_HOUR`] local time rather than at midnight.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::{AuthError, Clock, Rank, SystemClock};

/// Local hour at which the daily GM password advances to the next day's.
pub const ROTATION_HOUR: u32 = 15;

const DAILY_FIELDS: [&str; 7] = [
    "daily_gm_passwords[0]",
    "daily_gm_passwords[1]",
    "daily_gm_passwords[2]",
    "daily_gm_passwords[3]",
    "daily_gm_passwords[4]",
    "daily_gm_passwords[5]",
    "daily_gm_passwords[6]",
];

// ---------------------------------------------------------------------------
// CredentialSet
// ---------------------------------------------------------------------------

/// Every staff secret the server knows, as loaded from configuration.
///
/// `daily_gm_passwords` is indexed by weekday starting at Monday (index 0)
/// through Sunday (index 6).
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialSet {
    pub mod_password: String,
    pub cm_password: String,
    pub gm_password: String,
    pub daily_gm_passwords: [String; 7],
}

impl CredentialSet {
    /// Rejects empty secrets. An empty secret would let `/login ` (an
    /// empty guess) through.
    ///
    /// # Errors
    /// [`AuthError::EmptySecret`] naming the first empty field.
    pub fn validate(&self) -> Result<(), AuthError> {
        let evergreen = [
            ("mod_password", &self.mod_password),
            ("cm_password", &self.cm_password),
            ("gm_password", &self.gm_password),
        ];
        for (field, secret) in evergreen {
            if secret.is_empty() {
                return Err(AuthError::EmptySecret(field));
            }
        }
        for (field, secret) in DAILY_FIELDS.into_iter().zip(&self.daily_gm_passwords) {
            if secret.is_empty() {
                return Err(AuthError::EmptySecret(field));
            }
        }
        Ok(())
    }
}

/// Secrets never reach logs, even at `trace`.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("mod_password", &"<redacted>")
            .field("cm_password", &"<redacted>")
            .field("gm_password", &"<redacted>")
            .field("daily_gm_passwords", &"<redacted; 7>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Answers "is this the right password for that rank?".
///
/// Immutable after construction and shared by every connection behind an
/// `Arc`. The daily GM password is derived from the clock on every call
/// and never memoized, so concurrent callers need no locking and a login
/// right after 15:00 already sees the new day's password.
#[derive(Debug)]
pub struct CredentialStore<C: Clock = SystemClock> {
    credentials: CredentialSet,
    clock: C,
}

impl<C: Clock> CredentialStore<C> {
    /// Builds a store after checking that no secret is empty.
    ///
    /// # Errors
    /// [`AuthError::EmptySecret`] if any configured secret is empty.
    pub fn new(credentials: CredentialSet, clock: C) -> Result<Self, AuthError> {
        credentials.validate()?;
        Ok(Self { credentials, clock })
    }

    /// Returns `true` iff `supplied` is a valid password for `rank` right now.
    ///
    /// - Mod: the moderator password.
    /// - CM: the community manager password.
    /// - GM: the evergreen GM password, or today's daily GM password.
    pub fn check_password(&self, rank: Rank, supplied: &str) -> bool {
        let supplied = supplied.as_bytes();
        match rank {
            Rank::Mod => supplied.ct_eq(self.credentials.mod_password.as_bytes()).into(),
            Rank::Cm => supplied.ct_eq(self.credentials.cm_password.as_bytes()).into(),
            Rank::Gm => {
                // Both comparisons always run.
                let evergreen = supplied.ct_eq(self.credentials.gm_password.as_bytes());
                let daily = supplied.ct_eq(self.current_daily_gm_password().as_bytes());
                (evergreen | daily).into()
            }
        }
    }

    /// The daily GM password valid at this instant.
    pub fn current_daily_gm_password(&self) -> &str {
        self.daily_gm_password_at(self.clock.now())
    }

    /// The daily GM password valid at `now`.
    pub fn daily_gm_password_at(&self, now: NaiveDateTime) -> &str {
        &self.credentials.daily_gm_passwords[effective_weekday(now)]
    }
}

/// Index into the daily password table for `now`: today's weekday
/// (Monday = 0), or tomorrow's once the clock reads 15:00 or later.
pub fn effective_weekday(now: NaiveDateTime) -> usize {
    let today = now.weekday().num_days_from_monday() as usize;
    if now.hour() >= ROTATION_HOUR {
        (today + 1) % 7
    } else {
        today
    }
}
