//! Whitelisting emotes against a character's `char.ini`.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::EmoteError;
use crate::ini::Ini;

/// Name of the character definition file inside each character directory.
pub const CHAR_INI: &str = "char.ini";

/// One whitelisted emote. Fields are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Emote {
    pub preanim: String,
    pub anim: String,
    pub sfx: String,
}

/// The emotes a character may send.
///
/// An empty whitelist means "no restrictions": a character without a
/// readable `char.ini`, or with a broken `[Emotions]` section, can send
/// anything. Read-only after construction, so one validator can be
/// shared across connections.
#[derive(Debug, Clone)]
pub struct EmoteValidator {
    character: String,
    emotes: HashSet<Emote>,
}

impl EmoteValidator {
    /// A validator that accepts everything.
    pub fn unrestricted(character: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            emotes: HashSet::new(),
        }
    }

    /// Reads `<char_dir>/<character>/char.ini`, failing open.
    ///
    /// A missing file is normal (not every character ships one) and gives
    /// an unrestricted validator silently. Any other read error, or a
    /// character name that would leave `char_dir`, is logged and also
    /// gives an unrestricted validator.
    pub fn load(char_dir: impl AsRef<Path>, character: &str) -> Self {
        match Self::try_load(char_dir, character) {
            Ok(validator) => validator,
            Err(EmoteError::Io { path, source })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!(path = %path.display(), "no char.ini, emotes unrestricted");
                Self::unrestricted(character)
            }
            Err(e @ EmoteError::InvalidCharacter(_)) => {
                tracing::warn!(error = %e, "character name rejected, emotes unrestricted");
                Self::unrestricted(character)
            }
            Err(e) => {
                tracing::warn!(character, error = %e, "char.ini unreadable, emotes unrestricted");
                Self::unrestricted(character)
            }
        }
    }

    /// Like [`load`](Self::load), but reports read errors.
    ///
    /// # Errors
    /// [`EmoteError::InvalidCharacter`] if `character` is not a plain
    /// directory name, [`EmoteError::Io`] if the file cannot be read,
    /// including when it does not exist.
    pub fn try_load(char_dir: impl AsRef<Path>, character: &str) -> Result<Self, EmoteError> {
        let path = char_ini_path(char_dir.as_ref(), character)?;
        let text = std::fs::read_to_string(&path).map_err(|source| EmoteError::Io {
            path: path.clone(),
            source,
        })?;
        let validator = Self::parse(character, &text);
        tracing::info!(
            path = %path.display(),
            emotes = validator.len(),
            "loaded char.ini for emote restrictions"
        );
        Ok(validator)
    }

    /// Builds the whitelist from `char.ini` text.
    ///
    /// Malformed content never fails: a missing `[Emotions]` section or
    /// `number` key, or a `number` that isn't an integer, gives an
    /// unrestricted validator; a missing or short entry is skipped.
    pub fn parse(character: impl Into<String>, text: &str) -> Self {
        let character = character.into();
        let ini = Ini::parse(text);

        let Some(emotions) = ini.section("emotions") else {
            tracing::warn!(%character, "char.ini has no [Emotions] section");
            return Self::unrestricted(character);
        };
        let Some(Some(raw_number)) = emotions.get("number") else {
            tracing::warn!(%character, "char.ini [Emotions] has no number");
            return Self::unrestricted(character);
        };
        let number: i64 = match raw_number.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(%character, number = %raw_number, "char.ini [Emotions] number is not an integer");
                return Self::unrestricted(character);
            }
        };

        let mut emotes = HashSet::new();
        for id in 1..=number {
            let key = id.to_string();
            let Some(Some(entry)) = emotions.get(&key) else {
                tracing::warn!(%character, %key, "char.ini [Emotions] entry missing");
                continue;
            };
            match parse_entry(entry) {
                Some(emote) => {
                    emotes.insert(emote);
                }
                None => {
                    tracing::warn!(%character, %key, entry = %entry, "char.ini [Emotions] entry malformed");
                }
            }
        }

        Self { character, emotes }
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    /// Number of distinct whitelisted emotes.
    pub fn len(&self) -> usize {
        self.emotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emotes.is_empty()
    }

    /// `true` when every emote is allowed.
    pub fn is_unrestricted(&self) -> bool {
        self.emotes.is_empty()
    }

    /// Whether this character may send the given emote.
    ///
    /// Empty fields act as wildcards. `sfx` is accepted as-is: clients
    /// use custom sound lists the server cannot know about. Comparison
    /// ignores case on both sides, so a mixed-case emote from the client
    /// matches a lowercase `char.ini` entry and vice versa.
    pub fn validate(&self, preanim: &str, anim: &str, _sfx: &str) -> bool {
        if self.emotes.is_empty() {
            return true;
        }
        let preanim = preanim.to_lowercase();
        let anim = anim.to_lowercase();
        self.emotes.iter().any(|emote| {
            (preanim.is_empty() || emote.preanim == preanim)
                && (anim.is_empty() || emote.anim == anim)
        })
    }
}

/// `<char_dir>/<character>/char.ini`.
///
/// `character` comes from the client, so it must be exactly one ordinary
/// path component: never empty, absolute, `.`, `..`, or containing a
/// separator. Anything else could name a file outside `char_dir`.
///
/// # Errors
/// [`EmoteError::InvalidCharacter`] for any other name.
pub fn char_ini_path(char_dir: &Path, character: &str) -> Result<PathBuf, EmoteError> {
    let mut components = Path::new(character).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == character => {
            Ok(char_dir.join(character).join(CHAR_INI))
        }
        _ => Err(EmoteError::InvalidCharacter(character.to_string())),
    }
}

/// `name#preanim#anim#mod[#...]` into an emote. Needs at least four fields.
fn parse_entry(entry: &str) -> Option<Emote> {
    let mut fields = entry.split('#');
    let _name = fields.next()?;
    let preanim = fields.next()?;
    let anim = fields.next()?;
    let _mod = fields.next()?;
    Some(Emote {
        preanim: preanim.to_lowercase(),
        anim: anim.to_lowercase(),
        sfx: String::new(),
    })
}
