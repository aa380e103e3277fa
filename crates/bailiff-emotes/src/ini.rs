//! A forgiving reader for hand-edited `char.ini` files.
//!
//! Character files are written by hand, by many people, over many years.
//! This reader accepts what they actually contain:
//!
//! - section names in any case (`[Emotions]`, `[emotions]`, `[EMOTIONS]`)
//! - keys in any case, separated from values by `=` or `:`
//! - whole-line comments starting with `=`, `-`, `#`, `;`, `//` or `\\`
//! - repeated sections (merged) and repeated keys (last one wins)
//! - indented lines, which continue the previous value
//! - a leading UTF-8 byte order mark
//!
//! Lines it cannot place (text before the first section header, an
//! unterminated `[`) are skipped.

use std::collections::HashMap;

const COMMENT_PREFIXES: [&str; 6] = ["=", "-", "#", ";", "//", "\\\\"];

/// Parsed sections, keyed by lowercased section name.
#[derive(Debug, Default)]
pub(crate) struct Ini {
    sections: HashMap<String, Section>,
}

/// Keys are lowercased. A key written without a separator has no value.
pub(crate) type Section = HashMap<String, Option<String>>;

impl Ini {
    pub(crate) fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut ini = Self::default();
        let mut section: Option<String> = None;
        let mut last_key: Option<String> = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                last_key = None;
                continue;
            }
            if COMMENT_PREFIXES.iter().any(|p| line.starts_with(p)) {
                continue;
            }

            let Some(current) = section.as_ref() else {
                if let Some(name) = section_header(line) {
                    ini.sections.entry(name.clone()).or_default();
                    section = Some(name);
                }
                continue;
            };

            // Continuation of the previous value.
            if raw.starts_with(char::is_whitespace) {
                if let Some(key) = &last_key {
                    if let Some(Some(value)) = ini.section_mut(current).get_mut(key) {
                        value.push('\n');
                        value.push_str(line);
                        continue;
                    }
                }
            }

            if let Some(name) = section_header(line) {
                ini.sections.entry(name.clone()).or_default();
                section = Some(name);
                last_key = None;
                continue;
            }

            let (key, value) = split_entry(line);
            ini.section_mut(current).insert(key.clone(), value);
            last_key = Some(key);
        }

        ini
    }

    /// Looks up a section by name, ignoring case.
    pub(crate) fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(&name.to_lowercase())
    }

    fn section_mut(&mut self, name: &str) -> &mut Section {
        self.sections.entry(name.to_owned()).or_default()
    }
}

fn section_header(line: &str) -> Option<String> {
    let inner = line.strip_prefix('[')?;
    let end = inner.find(']')?;
    Some(inner[..end].trim().to_lowercase())
}

/// Splits at whichever of `=` and `:` comes first.
fn split_entry(line: &str) -> (String, Option<String>) {
    match line.find(['=', ':']) {
        Some(at) => (
            line[..at].trim().to_lowercase(),
            Some(line[at + 1..].trim().to_owned()),
        ),
        None => (line.to_lowercase(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
        ini.section(section)?.get(key)?.as_deref()
    }

    #[test]
    fn test_parse_reads_sections_and_keys_case_insensitively() {
        let ini = Ini::parse("[Emotions]\nNumber = 3\n");

        assert_eq!(value(&ini, "emotions", "number"), Some("3"));
        assert_eq!(value(&ini, "EMOTIONS", "number"), Some("3"));
    }

    #[test]
    fn test_parse_accepts_colon_separator() {
        let ini = Ini::parse("[Options]\nname: Phoenix\n");
        assert_eq!(value(&ini, "options", "name"), Some("Phoenix"));
    }

    #[test]
    fn test_parse_splits_at_first_separator_only() {
        let ini = Ini::parse("[Emotions]\n1 = Point#-#point#0\n2 = a:b\n3: c=d\n");

        assert_eq!(value(&ini, "emotions", "1"), Some("Point#-#point#0"));
        assert_eq!(value(&ini, "emotions", "2"), Some("a:b"));
        assert_eq!(value(&ini, "emotions", "3"), Some("c=d"));
    }

    #[test]
    fn test_parse_skips_comment_lines() {
        let text = "\
[Emotions]
; semicolon
# hash
// slashes
\\\\ backslashes
- dash
= equals
number = 1
";
        let ini = Ini::parse(text);
        let section = ini.section("emotions").unwrap();

        assert_eq!(section.len(), 1);
        assert_eq!(value(&ini, "emotions", "number"), Some("1"));
    }

    #[test]
    fn test_parse_strips_byte_order_mark() {
        let ini = Ini::parse("\u{feff}[Emotions]\nnumber=2\n");
        assert_eq!(value(&ini, "emotions", "number"), Some("2"));
    }

    #[test]
    fn test_parse_merges_repeated_sections_last_key_wins() {
        let ini = Ini::parse("[Emotions]\nnumber=1\n[Options]\nx=y\n[emotions]\nnumber=2\n1=a\n");

        assert_eq!(value(&ini, "emotions", "number"), Some("2"));
        assert_eq!(value(&ini, "emotions", "1"), Some("a"));
    }

    #[test]
    fn test_parse_key_without_separator_has_no_value() {
        let ini = Ini::parse("[Emotions]\nflag\n");
        assert_eq!(ini.section("emotions").unwrap().get("flag"), Some(&None));
    }

    #[test]
    fn test_parse_indented_line_continues_value() {
        let ini = Ini::parse("[Options]\nnote = first\n   second\n");
        assert_eq!(value(&ini, "options", "note"), Some("first\nsecond"));
    }

    #[test]
    fn test_parse_ignores_lines_before_first_section() {
        let ini = Ini::parse("number = 9\n[Emotions]\nnumber = 1\n");
        assert_eq!(value(&ini, "emotions", "number"), Some("1"));
    }

    #[test]
    fn test_parse_missing_section_is_none() {
        let ini = Ini::parse("[Options]\nname=Edgeworth\n");
        assert!(ini.section("emotions").is_none());
    }
}
