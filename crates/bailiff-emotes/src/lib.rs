//! Emote whitelisting for Bailiff.
//!
//! Each character may ship a `char.ini` listing the emotes it owns. The
//! server uses that list to reject emotes a client borrowed from another
//! character. The whitelist fails open: a missing or broken file means
//! the character is unrestricted, never that it can't emote at all.
//!
//! ```no_run
//! use bailiff_emotes::EmoteValidator;
//!
//! let emotes = EmoteValidator::load("characters", "Phoenix");
//! if !emotes.validate("-", "normal", "") {
//!     // reject the emote
//! }
//! ```

mod error;
mod ini;
mod validator;

pub use error::EmoteError;
pub use validator::{CHAR_INI, Emote, EmoteValidator, char_ini_path};
