//! Parsing and executing the OOC login commands.
//!
//! An OOC line like `/loginrp hunter2` splits at the first space into a
//! command name (`loginrp`, case-insensitive) and an argument (`hunter2`).
//! The argument is everything after that first space, untouched, so a
//! password may itself contain spaces.

use std::sync::Arc;

use crate::{AuthError, Clock, CredentialStore, Rank, RankState, SystemClock, Transition};

/// An OOC line that looks like a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OocCommand<'a> {
    /// Lowercased command name without the leading `/`.
    pub name: String,
    /// Everything after the first space; empty if there was none.
    pub argument: &'a str,
}

impl<'a> OocCommand<'a> {
    /// Splits `line` into a command, or `None` if it doesn't start with `/`.
    pub fn parse(line: &'a str) -> Option<Self> {
        let rest = line.strip_prefix('/')?;
        let (name, argument) = rest.split_once(' ').unwrap_or((rest, ""));
        Some(Self {
            name: name.to_lowercase(),
            argument,
        })
    }
}

/// The four commands this crate owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginCommand<'a> {
    /// `/login`, `/logincm`, `/loginrp`: the argument is the password.
    Login { rank: Rank, password: &'a str },
    /// `/logout`: the argument must be empty.
    Logout { argument: &'a str },
}

impl<'a> LoginCommand<'a> {
    /// Maps a parsed command onto a login command, or `None` for any other
    /// command name.
    pub fn from_ooc(command: &OocCommand<'a>) -> Option<Self> {
        let rank = match command.name.as_str() {
            "login" => Rank::Mod,
            "logincm" => Rank::Cm,
            "loginrp" => Rank::Gm,
            "logout" => {
                return Some(Self::Logout {
                    argument: command.argument,
                });
            }
            _ => return None,
        };
        Some(Self::Login {
            rank,
            password: command.argument,
        })
    }
}

/// Runs login commands against one connection's [`RankState`].
///
/// Cheap to clone: it only holds the shared credential store.
#[derive(Debug)]
pub struct LoginCommandProcessor<C: Clock = SystemClock> {
    store: Arc<CredentialStore<C>>,
}

impl<C: Clock> Clone for LoginCommandProcessor<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<C: Clock> LoginCommandProcessor<C> {
    pub fn new(store: Arc<CredentialStore<C>>) -> Self {
        Self { store }
    }

    /// Parses and runs `line`.
    ///
    /// Returns `None` when the line is not a login command, so the caller
    /// can route it elsewhere. Otherwise the result of running it; on
    /// `Err` the state is unchanged.
    pub fn process(
        &self,
        line: &str,
        state: &mut RankState,
    ) -> Option<Result<Transition, AuthError>> {
        let parsed = OocCommand::parse(line)?;
        let command = LoginCommand::from_ooc(&parsed)?;
        Some(self.execute(command, state))
    }

    /// Runs an already-parsed command.
    pub fn execute(
        &self,
        command: LoginCommand<'_>,
        state: &mut RankState,
    ) -> Result<Transition, AuthError> {
        match command {
            LoginCommand::Login { rank, password } => state.login(&self.store, rank, password),
            LoginCommand::Logout { argument } => state.logout(argument),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{CredentialSet, FixedClock, Privilege};

    fn processor() -> LoginCommandProcessor<FixedClock> {
        let creds = CredentialSet {
            mod_password: "mod pass".into(),
            cm_password: "cmpass".into(),
            gm_password: "gmpass".into(),
            daily_gm_passwords: ["d1", "d2", "d3", "d4", "d5", "d6", "d7"].map(String::from),
        };
        let now = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let store = CredentialStore::new(creds, FixedClock::new(now)).unwrap();
        LoginCommandProcessor::new(Arc::new(store))
    }

    // =====================================================================
    // OocCommand::parse()
    // =====================================================================

    #[test]
    fn test_parse_splits_at_first_space_only() {
        let cmd = OocCommand::parse("/login a b  c").unwrap();
        assert_eq!(cmd.name, "login");
        assert_eq!(cmd.argument, "a b  c");
    }

    #[test]
    fn test_parse_without_argument_gives_empty_argument() {
        let cmd = OocCommand::parse("/logout").unwrap();
        assert_eq!(cmd.name, "logout");
        assert_eq!(cmd.argument, "");
    }

    #[test]
    fn test_parse_trailing_space_gives_empty_argument() {
        let cmd = OocCommand::parse("/logout ").unwrap();
        assert_eq!(cmd.argument, "");
    }

    #[test]
    fn test_parse_lowercases_command_name_not_argument() {
        let cmd = OocCommand::parse("/LoginRP HunTer2").unwrap();
        assert_eq!(cmd.name, "loginrp");
        assert_eq!(cmd.argument, "HunTer2");
    }

    #[test]
    fn test_parse_plain_text_is_not_a_command() {
        assert!(OocCommand::parse("hello /login x").is_none());
        assert!(OocCommand::parse("").is_none());
    }

    // =====================================================================
    // LoginCommand::from_ooc()
    // =====================================================================

    #[test]
    fn test_from_ooc_binds_each_command_to_its_rank() {
        let cases = [("/login p", Rank::Mod), ("/logincm p", Rank::Cm), ("/loginrp p", Rank::Gm)];
        for (line, rank) in cases {
            let parsed = OocCommand::parse(line).unwrap();
            assert_eq!(
                LoginCommand::from_ooc(&parsed),
                Some(LoginCommand::Login { rank, password: "p" })
            );
        }
    }

    #[test]
    fn test_from_ooc_unknown_command_is_none() {
        let parsed = OocCommand::parse("/roll 2d6").unwrap();
        assert_eq!(LoginCommand::from_ooc(&parsed), None);
    }

    // =====================================================================
    // process()
    // =====================================================================

    #[test]
    fn test_process_non_login_lines_return_none_and_keep_state() {
        let processor = processor();
        let mut state = RankState::new();

        assert!(processor.process("objection!", &mut state).is_none());
        assert!(processor.process("/help", &mut state).is_none());
        assert_eq!(state.current(), Privilege::Guest);
    }

    #[test]
    fn test_process_password_may_contain_spaces() {
        let processor = processor();
        let mut state = RankState::new();

        let result = processor.process("/login mod pass", &mut state);

        assert_eq!(result, Some(Ok(Transition::LoggedIn(Rank::Mod))));
        assert!(state.current().is_mod());
    }

    #[test]
    fn test_process_login_without_password_is_invalid_password() {
        let processor = processor();
        let mut state = RankState::new();

        assert_eq!(
            processor.process("/loginrp", &mut state),
            Some(Err(AuthError::InvalidPassword))
        );
        assert!(state.current().is_guest());
    }

    #[test]
    fn test_process_example_scenario() {
        let processor = processor();
        let mut state = RankState::new();

        assert_eq!(
            processor.process("/loginrp gmpass", &mut state),
            Some(Ok(Transition::LoggedIn(Rank::Gm)))
        );
        assert_eq!(
            processor.process("/loginrp gmpass", &mut state),
            Some(Ok(Transition::AlreadyLoggedIn))
        );
        assert!(state.current().is_gm());

        assert_eq!(
            processor.process("/logincm cmpass", &mut state),
            Some(Ok(Transition::LoggedIn(Rank::Cm)))
        );
        assert!(state.current().is_cm());
        assert!(!state.current().is_gm());

        assert_eq!(processor.process("/logout", &mut state), Some(Ok(Transition::LoggedOut)));
        assert!(state.current().is_guest());
    }

    #[test]
    fn test_process_logout_with_argument_keeps_rank() {
        let processor = processor();
        let mut state = RankState::new();
        processor.process("/loginrp gmpass", &mut state);

        let result = processor.process("/logout gmpass", &mut state);

        assert!(matches!(result, Some(Err(AuthError::Usage(ref m))) if m == "This command has no arguments."));
        assert!(state.current().is_gm());
    }
}
