//! One connection's authorization session.
//!
//! A `Session` is owned by exactly one connection task. Nothing else holds
//! a reference to its [`RankState`], so one client's rank change can never
//! be observed as a change to another's.

use std::sync::Arc;

use bailiff_protocol::{ClientId, Payload};

use crate::{
    AuthError, Clock, CredentialStore, LoginCommandProcessor, NotificationEmitter, Privilege,
    RankState, SystemClock, Transition,
};

/// The server's record of one connected client.
#[derive(Debug)]
pub struct Session<C: Clock = SystemClock> {
    client_id: ClientId,
    character: String,
    rank: RankState,
    commands: LoginCommandProcessor<C>,
    emitter: Arc<NotificationEmitter>,
}

impl<C: Clock> Session<C> {
    /// Starts a guest session for a freshly connected client.
    pub fn new(
        client_id: ClientId,
        character: impl Into<String>,
        store: Arc<CredentialStore<C>>,
        emitter: Arc<NotificationEmitter>,
    ) -> Self {
        let character = character.into();
        tracing::debug!(%client_id, %character, "session started");
        Self {
            client_id,
            character,
            rank: RankState::new(),
            commands: LoginCommandProcessor::new(store),
            emitter,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn privilege(&self) -> Privilege {
        self.rank.current()
    }

    /// Handles one OOC line.
    ///
    /// Returns `None` if the line is not a login command. Otherwise the
    /// payloads to send back to this client.
    pub fn handle_ooc(&mut self, line: &str) -> Option<Vec<Payload>> {
        let from = self.rank.current();
        let result = self.commands.process(line, &mut self.rank)?;
        self.log_result(from, &result);
        Some(self.emitter.emit(&result))
    }

    /// Administrative override. Sends the refresh signal but no OOC text.
    pub fn force_set(&mut self, privilege: Privilege) -> Vec<Payload> {
        let from = self.rank.current();
        let transition = self.rank.force_set(privilege);
        tracing::info!(
            client_id = %self.client_id,
            %from,
            to = %privilege,
            "privilege set by administrator"
        );
        self.emitter.transition(transition)
    }

    /// Clears the rank when the connection goes away.
    pub fn disconnect(&mut self) {
        let held = self.rank.on_disconnect();
        tracing::debug!(client_id = %self.client_id, %held, "session ended, rank cleared");
    }

    fn log_result(&self, from: Privilege, result: &Result<Transition, AuthError>) {
        let client_id = self.client_id;
        match result {
            Ok(Transition::LoggedIn(rank)) => {
                tracing::info!(%client_id, %from, to = %rank, "logged in");
            }
            Ok(Transition::LoggedOut) => {
                tracing::info!(%client_id, %from, "logged out");
            }
            Ok(Transition::AlreadyLoggedIn) => {
                tracing::debug!(%client_id, rank = %from, "login repeated for held rank");
            }
            Ok(Transition::Forced(_)) => {}
            Err(AuthError::InvalidPassword) => {
                tracing::warn!(%client_id, "login rejected: invalid password");
            }
            Err(e) => {
                tracing::debug!(%client_id, error = %e, "login command rejected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{CredentialSet, FixedClock};

    fn session(id: u64) -> Session<FixedClock> {
        let creds = CredentialSet {
            mod_password: "modpass".into(),
            cm_password: "cmpass".into(),
            gm_password: "gmpass".into(),
            daily_gm_passwords: ["d1", "d2", "d3", "d4", "d5", "d6", "d7"].map(String::from),
        };
        let now = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let store = Arc::new(CredentialStore::new(creds, FixedClock::new(now)).unwrap());
        Session::new(ClientId(id), "Phoenix", store, Arc::new(NotificationEmitter::default()))
    }

    fn texts(payloads: &[Payload]) -> Vec<&str> {
        payloads
            .iter()
            .filter_map(|p| match p {
                Payload::Ooc { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn refreshed(payloads: &[Payload]) -> bool {
        payloads.contains(&Payload::FeatureRefresh)
    }

    #[test]
    fn test_new_session_is_guest() {
        let s = session(1);
        assert_eq!(s.client_id(), ClientId(1));
        assert_eq!(s.character(), "Phoenix");
        assert_eq!(s.privilege(), Privilege::Guest);
    }

    #[test]
    fn test_handle_ooc_login_replies_and_refreshes() {
        let mut s = session(1);

        let out = s.handle_ooc("/login modpass").unwrap();

        assert!(refreshed(&out));
        assert_eq!(texts(&out), vec!["Logged in as a moderator."]);
        assert!(s.privilege().is_mod());
    }

    #[test]
    fn test_handle_ooc_invalid_password_has_no_refresh() {
        let mut s = session(1);

        let out = s.handle_ooc("/logincm AAAABBBB").unwrap();

        assert!(!refreshed(&out));
        assert_eq!(texts(&out), vec!["Invalid password."]);
        assert!(s.privilege().is_guest());
    }

    #[test]
    fn test_handle_ooc_relogin_has_no_refresh() {
        let mut s = session(1);
        s.handle_ooc("/logincm cmpass");

        let out = s.handle_ooc("/logincm cmpass").unwrap();

        assert!(!refreshed(&out));
        assert_eq!(texts(&out), vec!["Already logged in."]);
    }

    #[test]
    fn test_handle_ooc_double_logout_refreshes_both_times() {
        let mut s = session(1);

        for _ in 0..2 {
            let out = s.handle_ooc("/logout").unwrap();
            assert!(refreshed(&out));
            assert_eq!(texts(&out), vec!["You are no longer logged in."]);
        }
    }

    #[test]
    fn test_handle_ooc_ignores_other_lines() {
        let mut s = session(1);
        assert!(s.handle_ooc("hello court").is_none());
        assert!(s.handle_ooc("/pos def").is_none());
    }

    #[test]
    fn test_force_set_refreshes_without_text() {
        let mut s = session(1);

        let out = s.force_set(Privilege::Gm);

        assert_eq!(out, vec![Payload::FeatureRefresh]);
        assert!(s.privilege().is_gm());
    }

    #[test]
    fn test_disconnect_clears_rank() {
        let mut s = session(1);
        s.handle_ooc("/loginrp d1");
        assert!(s.privilege().is_gm());

        s.disconnect();

        assert!(s.privilege().is_guest());
    }
}
