use std::path::PathBuf;

/// Errors that can occur while loading a character's emote list.
///
/// Only [`EmoteValidator::try_load`](crate::EmoteValidator::try_load)
/// returns these. Everything that goes wrong *inside* a readable file is
/// logged and skipped rather than reported.
#[derive(Debug, thiserror::Error)]
pub enum EmoteError {
    /// The character file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The character name is not a plain directory name: it is empty,
    /// absolute, or contains a separator or `..`.
    #[error("invalid character name {0:?}")]
    InvalidCharacter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_names_path() {
        let err = EmoteError::Io {
            path: PathBuf::from("characters/Phoenix/char.ini"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read characters/Phoenix/char.ini: gone"
        );
    }

    #[test]
    fn test_invalid_character_display_quotes_name() {
        let err = EmoteError::InvalidCharacter("../etc".into());
        assert_eq!(err.to_string(), r#"invalid character name "../etc""#);
    }
}
