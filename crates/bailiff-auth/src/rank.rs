//! Per-connection privilege and its transitions.
//!
//! A connection holds exactly one [`Privilege`]. Because that is a single
//! enum rather than three booleans, "moderator and game master at once"
//! cannot be represented at all.
//!
//! ```text
//!            login(R) ok              login(R') ok
//!   Guest ─────────────→ Ranked(R) ─────────────→ Ranked(R')
//!     ↑                      │
//!     └── logout / disconnect┘
//!
//!   force_set(P): any state → P, no password
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AuthError, Clock, CredentialStore};

/// Reply for `/logout` with trailing text.
pub(crate) const LOGOUT_USAGE: &str = "This command has no arguments.";

// ---------------------------------------------------------------------------
// Rank / Privilege
// ---------------------------------------------------------------------------

/// A staff rank a connection can log into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    /// Moderator.
    Mod,
    /// Community manager.
    Cm,
    /// Game master.
    Gm,
}

impl Rank {
    /// Human-readable title used in OOC replies.
    pub fn title(self) -> &'static str {
        match self {
            Self::Mod => "moderator",
            Self::Cm => "community manager",
            Self::Gm => "game master",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// The privilege a connection currently holds: no rank, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    #[default]
    Guest,
    Mod,
    Cm,
    Gm,
}

impl Privilege {
    /// The rank held, or `None` for a guest.
    pub fn rank(self) -> Option<Rank> {
        match self {
            Self::Guest => None,
            Self::Mod => Some(Rank::Mod),
            Self::Cm => Some(Rank::Cm),
            Self::Gm => Some(Rank::Gm),
        }
    }

    pub fn is_guest(self) -> bool {
        self == Self::Guest
    }

    pub fn is_mod(self) -> bool {
        self == Self::Mod
    }

    pub fn is_cm(self) -> bool {
        self == Self::Cm
    }

    pub fn is_gm(self) -> bool {
        self == Self::Gm
    }
}

impl From<Rank> for Privilege {
    fn from(rank: Rank) -> Self {
        match rank {
            Rank::Mod => Self::Mod,
            Rank::Cm => Self::Cm,
            Rank::Gm => Self::Gm,
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rank() {
            Some(rank) => fmt::Display::fmt(&rank, f),
            None => f.write_str("guest"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// The outcome of a successful command or override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved into `Rank` (from guest or from another rank).
    LoggedIn(Rank),
    /// The password was right but the rank was already held. Nothing
    /// changed.
    AlreadyLoggedIn,
    /// Dropped to guest. Reported even if already a guest.
    LoggedOut,
    /// Set directly by an administrator, bypassing passwords.
    Forced(Privilege),
}

impl Transition {
    /// Whether the connection must be told to refresh privilege-dependent
    /// state. Only a redundant login carries no state implication.
    pub fn refreshes(self) -> bool {
        !matches!(self, Self::AlreadyLoggedIn)
    }

    /// The OOC confirmation, if this transition has one.
    pub fn message(self) -> Option<String> {
        match self {
            Self::LoggedIn(rank) => Some(format!("Logged in as a {rank}.")),
            Self::AlreadyLoggedIn => Some("Already logged in.".to_string()),
            Self::LoggedOut => Some("You are no longer logged in.".to_string()),
            Self::Forced(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RankState
// ---------------------------------------------------------------------------

/// One connection's privilege, and the only way to change it.
///
/// Every method either succeeds and applies its change in a single
/// assignment, or fails and leaves the state exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct RankState {
    current: Privilege,
}

impl RankState {
    /// A fresh guest.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Privilege {
        self.current
    }

    /// Logs into `rank` if `password` checks out.
    ///
    /// Switching ranks needs no logout first: the old rank is replaced in
    /// the same step.
    ///
    /// # Errors
    /// [`AuthError::InvalidPassword`] if the password is wrong; the state
    /// is untouched.
    pub fn login<C: Clock>(
        &mut self,
        store: &CredentialStore<C>,
        rank: Rank,
        password: &str,
    ) -> Result<Transition, AuthError> {
        if !store.check_password(rank, password) {
            return Err(AuthError::InvalidPassword);
        }
        let target = Privilege::from(rank);
        if self.current == target {
            return Ok(Transition::AlreadyLoggedIn);
        }
        self.current = target;
        Ok(Transition::LoggedIn(rank))
    }

    /// Drops to guest, whatever was held before.
    ///
    /// # Errors
    /// [`AuthError::Usage`] if `argument` is non-empty; the state is
    /// untouched even if a rank is held.
    pub fn logout(&mut self, argument: &str) -> Result<Transition, AuthError> {
        if !argument.is_empty() {
            return Err(AuthError::Usage(LOGOUT_USAGE.to_string()));
        }
        self.current = Privilege::Guest;
        Ok(Transition::LoggedOut)
    }

    /// Administrative override: sets the privilege with no password check.
    /// Callers are responsible for having authorized the request.
    pub fn force_set(&mut self, privilege: Privilege) -> Transition {
        self.current = privilege;
        Transition::Forced(privilege)
    }

    /// Resets to guest when the connection goes away. Returns what was
    /// held so the caller can log it.
    pub fn on_disconnect(&mut self) -> Privilege {
        std::mem::take(&mut self.current)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{CredentialSet, FixedClock};

    fn store() -> CredentialStore<FixedClock> {
        let creds = CredentialSet {
            mod_password: "modpass".into(),
            cm_password: "cmpass".into(),
            gm_password: "gmpass".into(),
            daily_gm_passwords: ["d1", "d2", "d3", "d4", "d5", "d6", "d7"].map(String::from),
        };
        // Wednesday morning: daily index 2.
        let now = NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        CredentialStore::new(creds, FixedClock::new(now)).unwrap()
    }

    /// Asserts the mutual exclusion invariant through the public flags.
    fn assert_exactly(state: &RankState, expected: Privilege) {
        let p = state.current();
        assert_eq!(p, expected);
        let held = [p.is_mod(), p.is_cm(), p.is_gm()];
        assert!(held.iter().filter(|h| **h).count() <= 1, "more than one rank held: {p:?}");
    }

    // =====================================================================
    // Rank / Privilege / Transition
    // =====================================================================

    #[test]
    fn test_privilege_default_is_guest() {
        assert_eq!(Privilege::default(), Privilege::Guest);
        assert_eq!(RankState::new().current(), Privilege::Guest);
    }

    #[test]
    fn test_privilege_display() {
        assert_eq!(Privilege::Guest.to_string(), "guest");
        assert_eq!(Privilege::Cm.to_string(), "community manager");
    }

    #[test]
    fn test_privilege_serializes_lowercase() {
        let json = serde_json::to_string(&Privilege::Gm).unwrap();
        assert_eq!(json, "\"gm\"");
    }

    #[test]
    fn test_transition_messages_match_ooc_protocol() {
        assert_eq!(
            Transition::LoggedIn(Rank::Mod).message().as_deref(),
            Some("Logged in as a moderator.")
        );
        assert_eq!(
            Transition::LoggedIn(Rank::Cm).message().as_deref(),
            Some("Logged in as a community manager.")
        );
        assert_eq!(
            Transition::LoggedIn(Rank::Gm).message().as_deref(),
            Some("Logged in as a game master.")
        );
        assert_eq!(
            Transition::AlreadyLoggedIn.message().as_deref(),
            Some("Already logged in.")
        );
        assert_eq!(
            Transition::LoggedOut.message().as_deref(),
            Some("You are no longer logged in.")
        );
        assert_eq!(Transition::Forced(Privilege::Gm).message(), None);
    }

    #[test]
    fn test_transition_refreshes_except_already_logged_in() {
        assert!(Transition::LoggedIn(Rank::Gm).refreshes());
        assert!(Transition::LoggedOut.refreshes());
        assert!(Transition::Forced(Privilege::Guest).refreshes());
        assert!(!Transition::AlreadyLoggedIn.refreshes());
    }

    // =====================================================================
    // login()
    // =====================================================================

    #[test]
    fn test_login_wrong_password_leaves_guest() {
        let store = store();
        let mut state = RankState::new();

        for guess in ["AAAABBBB", "cmpass", "gmpass", "d1", "d3", ""] {
            let result = state.login(&store, Rank::Mod, guess);
            assert_eq!(result, Err(AuthError::InvalidPassword), "guess {guess:?}");
            assert_exactly(&state, Privilege::Guest);
        }
    }

    #[test]
    fn test_login_wrong_password_keeps_existing_rank() {
        let store = store();
        let mut state = RankState::new();
        state.login(&store, Rank::Cm, "cmpass").unwrap();

        let result = state.login(&store, Rank::Gm, "nope");

        assert_eq!(result, Err(AuthError::InvalidPassword));
        assert_exactly(&state, Privilege::Cm);
    }

    #[test]
    fn test_login_each_rank_holds_exactly_that_rank() {
        let store = store();
        for (rank, password) in [(Rank::Mod, "modpass"), (Rank::Cm, "cmpass"), (Rank::Gm, "gmpass")] {
            let mut state = RankState::new();
            assert_eq!(state.login(&store, rank, password), Ok(Transition::LoggedIn(rank)));
            assert_exactly(&state, rank.into());
        }
    }

    #[test]
    fn test_login_gm_with_daily_password() {
        let store = store();
        let mut state = RankState::new();

        assert_eq!(state.login(&store, Rank::Gm, "d3"), Ok(Transition::LoggedIn(Rank::Gm)));
        assert_exactly(&state, Privilege::Gm);
    }

    #[test]
    fn test_login_same_rank_twice_is_already_logged_in() {
        let store = store();
        let mut state = RankState::new();
        state.login(&store, Rank::Gm, "gmpass").unwrap();

        // Either GM password counts as "the same rank".
        assert_eq!(state.login(&store, Rank::Gm, "d3"), Ok(Transition::AlreadyLoggedIn));
        assert_exactly(&state, Privilege::Gm);
    }

    #[test]
    fn test_login_other_rank_replaces_without_logout() {
        let store = store();
        let mut state = RankState::new();

        state.login(&store, Rank::Gm, "gmpass").unwrap();
        assert_eq!(state.login(&store, Rank::Cm, "cmpass"), Ok(Transition::LoggedIn(Rank::Cm)));
        assert_exactly(&state, Privilege::Cm);

        assert_eq!(state.login(&store, Rank::Mod, "modpass"), Ok(Transition::LoggedIn(Rank::Mod)));
        assert_exactly(&state, Privilege::Mod);

        assert_eq!(state.login(&store, Rank::Gm, "d3"), Ok(Transition::LoggedIn(Rank::Gm)));
        assert_exactly(&state, Privilege::Gm);
    }

    // =====================================================================
    // logout()
    // =====================================================================

    #[test]
    fn test_logout_with_argument_is_usage_error_and_keeps_rank() {
        let store = store();
        let mut state = RankState::new();
        state.login(&store, Rank::Mod, "modpass").unwrap();

        let result = state.logout("modpass");

        assert_eq!(result, Err(AuthError::Usage(LOGOUT_USAGE.to_string())));
        assert_exactly(&state, Privilege::Mod);
    }

    #[test]
    fn test_logout_with_argument_as_guest_is_usage_error() {
        let mut state = RankState::new();
        assert!(matches!(state.logout("x"), Err(AuthError::Usage(_))));
        assert_exactly(&state, Privilege::Guest);
    }

    #[test]
    fn test_logout_clears_any_rank_and_is_idempotent() {
        let store = store();
        let mut state = RankState::new();
        state.login(&store, Rank::Cm, "cmpass").unwrap();

        assert_eq!(state.logout(""), Ok(Transition::LoggedOut));
        assert_exactly(&state, Privilege::Guest);

        assert_eq!(state.logout(""), Ok(Transition::LoggedOut));
        assert_exactly(&state, Privilege::Guest);
    }

    // =====================================================================
    // force_set() / on_disconnect()
    // =====================================================================

    #[test]
    fn test_force_set_bypasses_password_and_keeps_exclusivity() {
        let mut state = RankState::new();

        assert_eq!(state.force_set(Privilege::Gm), Transition::Forced(Privilege::Gm));
        assert_exactly(&state, Privilege::Gm);

        state.force_set(Privilege::Cm);
        assert_exactly(&state, Privilege::Cm);

        state.force_set(Privilege::Guest);
        assert_exactly(&state, Privilege::Guest);
    }

    #[test]
    fn test_on_disconnect_resets_to_guest_and_returns_previous() {
        let mut state = RankState::new();
        state.force_set(Privilege::Mod);

        assert_eq!(state.on_disconnect(), Privilege::Mod);
        assert_exactly(&state, Privilege::Guest);
        assert_eq!(state.on_disconnect(), Privilege::Guest);
    }
}
