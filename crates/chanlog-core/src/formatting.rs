//! Formatting utilities (mixed markdown/HTML → Telegram HTML).

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Reverse of [`escape_html`], for values leaving HTML (button URLs).
pub fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Convert the small markdown subset used by log templates to Telegram HTML.
///
/// Input may already contain HTML (stored captions are HTML), so nothing is
/// escaped here. Handles `**bold**`, `__italic__` and `` `code` ``, line by
/// line so an unpaired delimiter never swallows the rest of the message.
pub fn markdown_to_html(input: &str) -> String {
    input
        .split('\n')
        .map(|line| {
            let l = replace_delimited(line, "**", "<b>", "</b>");
            let l = replace_delimited(&l, "__", "<i>", "</i>");
            replace_delimited(&l, "`", "<code>", "</code>")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn replace_delimited(text: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::new();
    let mut i = 0usize;
    while let Some(rel) = text[i..].find(delim) {
        let start = i + rel;
        out.push_str(&text[i..start]);
        let content_start = start + delim.len();
        if let Some(end_rel) = text[content_start..].find(delim) {
            let end = content_start + end_rel;
            out.push_str(open);
            out.push_str(&text[content_start..end]);
            out.push_str(close);
            i = end + delim.len();
            continue;
        }
        out.push_str(&text[start..]);
        return out;
    }
    out.push_str(&text[i..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn unescape_reverses_escape() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(unescape_html(&escape_html(s)), s);
    }

    #[test]
    fn converts_log_header() {
        let html = markdown_to_html("**logger** : #CORE\n\nhi");
        assert_eq!(html, "<b>logger</b> : #CORE\n\nhi");
    }

    #[test]
    fn keeps_existing_html_and_unpaired_delimiters() {
        let html = markdown_to_html("<b>x</b> __y__ `z` **open");
        assert_eq!(html, "<b>x</b> <i>y</i> <code>z</code> **open");
    }
}
