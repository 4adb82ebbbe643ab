//! Inline URL buttons embedded in stored captions.
//!
//! `[label][buttonurl:https://example.com]` starts a new row,
//! `[label][buttonurl:https://example.com:same]` joins the previous one.
//! A backslash before the opening bracket keeps the markup as plain text.

use std::sync::OnceLock;

use regex::Regex;

use crate::messaging::types::{InlineButton, InlineKeyboard};

fn button_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([^\[]+?)\]\[buttonurl:(?:/{0,2})(.+?)(:same)?\]").expect("valid regex")
    })
}

/// Split `text` into its display text and an optional keyboard.
pub fn parse_buttons(text: &str) -> (String, Option<InlineKeyboard>) {
    let mut out = String::with_capacity(text.len());
    let mut keyboard = InlineKeyboard::default();
    let mut prev = 0usize;

    for caps in button_re().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let start = whole.start();

        let escapes = text[..start]
            .bytes()
            .rev()
            .take_while(|b| *b == b'\\')
            .count();
        if escapes % 2 == 1 {
            // Escaped: keep the markup, drop the escaping backslash.
            out.push_str(&text[prev..start - 1]);
            prev = start;
            continue;
        }

        let button = InlineButton {
            label: caps[1].to_string(),
            url: caps[2].to_string(),
        };
        if caps.get(3).is_some() {
            keyboard.push_same_row(button);
        } else {
            keyboard.push_row(button);
        }

        out.push_str(&text[prev..start]);
        prev = whole.end();
    }
    out.push_str(&text[prev..]);

    let keyboard = (!keyboard.is_empty()).then_some(keyboard);
    (out.trim().to_string(), keyboard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_has_no_keyboard() {
        let (text, kb) = parse_buttons("  Hello there \n");
        assert_eq!(text, "Hello there");
        assert!(kb.is_none());
    }

    #[test]
    fn extracts_rows_and_same_row_buttons() {
        let src = "Welcome!\n[Rules][buttonurl:https://t.me/rules]\
                   [Site][buttonurl:https://example.com:same]\n\
                   [Help][buttonurl://help.example.com]";
        let (text, kb) = parse_buttons(src);
        assert_eq!(text, "Welcome!");

        let kb = kb.unwrap();
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.rows[0][0].label, "Rules");
        assert_eq!(kb.rows[0][0].url, "https://t.me/rules");
        assert_eq!(kb.rows[0][1].label, "Site");
        assert_eq!(kb.rows[0][1].url, "https://example.com");
        assert_eq!(kb.rows[1][0].url, "help.example.com");
    }

    #[test]
    fn escaped_markup_stays_as_text() {
        let (text, kb) = parse_buttons(r"see \[x][buttonurl:https://x.org]");
        assert_eq!(text, "see [x][buttonurl:https://x.org]");
        assert!(kb.is_none());
    }

    #[test]
    fn double_backslash_is_not_an_escape() {
        let (text, kb) = parse_buttons(r"a \\[x][buttonurl:https://x.org]");
        assert_eq!(text, r"a \\");
        assert_eq!(kb.unwrap().rows.len(), 1);
    }
}
