//! Log templates and safe placeholder substitution.

use std::collections::HashMap;

/// Derive the log tag from a dotted source name: the second-to-last segment,
/// or the whole name when it has fewer than two segments, upper-cased.
pub fn tag_for(name: &str) -> String {
    let parts: Vec<&str> = name.split('.').collect();
    let tag = if parts.len() >= 2 {
        parts[parts.len() - 2]
    } else {
        name
    };
    tag.to_uppercase()
}

/// Dotted logger namespace for a Rust module path (`a::b::c` → `a.b.c`).
pub fn namespace_of(module_path: &str) -> String {
    module_path.replace("::", ".")
}

/// `**logger** : #<TAG>\n\n{}`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogTemplate {
    tag: String,
}

impl LogTemplate {
    pub fn for_name(name: &str) -> Self {
        Self { tag: tag_for(name) }
    }

    /// The template with its `{}` slot unfilled. Used as the caption of
    /// file fallbacks.
    pub fn raw(&self) -> String {
        format!("{}{{}}", self.header())
    }

    fn header(&self) -> String {
        format!("**logger** : #{}\n\n", self.tag)
    }

    pub fn render(&self, text: &str) -> String {
        format!("{}{text}", self.header())
    }
}

/// Drop everything up to and including the first blank line.
///
/// Text without a blank line is returned unchanged.
pub fn strip_header(text: &str) -> &str {
    match text.split_once("\n\n") {
        Some((_, rest)) => rest,
        None => text,
    }
}

/// Substitute `{key}` placeholders from `values`.
///
/// Unknown keys stay in the output as the literal `{key}`. `{{` and `}}`
/// produce single braces; a `{` without a closing brace is kept as-is.
pub fn format_safe(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        // `{` opening a placeholder.
        let body = &tail[1..];
        match body.find(['{', '}']) {
            Some(end) if body.as_bytes()[end] == b'}' => {
                let key = &body[..end];
                match lookup(values, key) {
                    Some(v) => out.push_str(v),
                    None => out.push_str(&tail[..end + 2]),
                }
                rest = &body[end + 1..];
            }
            _ => {
                out.push('{');
                rest = body;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Format specs (`{name:>10}`) and conversions (`{name!r}`) are ignored for
/// lookup; the bare field name selects the value.
fn lookup<'a>(values: &'a HashMap<String, String>, field: &str) -> Option<&'a String> {
    let name = field
        .split([':', '!'])
        .next()
        .unwrap_or(field)
        .trim();
    if name.is_empty() {
        return None;
    }
    values.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn tag_uses_second_to_last_segment() {
        assert_eq!(tag_for("a.b.c"), "B");
        assert_eq!(tag_for("bot.plugins.utils.welcome"), "UTILS");
        assert_eq!(tag_for("x.y"), "X");
    }

    #[test]
    fn tag_falls_back_to_whole_name() {
        assert_eq!(tag_for("core"), "CORE");
        assert_eq!(tag_for(""), "");
    }

    #[test]
    fn module_paths_become_dotted_namespaces() {
        let ns = namespace_of("chanlog_telegram::handlers::welcome");
        assert_eq!(ns, "chanlog_telegram.handlers.welcome");
        assert_eq!(tag_for(&ns), "HANDLERS");
    }

    #[test]
    fn template_renders_header_and_raw_slot() {
        let t = LogTemplate::for_name("a.b.c");
        assert_eq!(t.render("hi"), "**logger** : #B\n\nhi");
        assert_eq!(t.raw(), "**logger** : #B\n\n{}");
    }

    #[test]
    fn strip_header_keeps_remainder_after_first_blank_line() {
        assert_eq!(strip_header("HEADER\n\nHello\n\nWorld"), "Hello\n\nWorld");
        assert_eq!(strip_header("no header"), "no header");
        assert_eq!(strip_header("HEADER\n\n"), "");
    }

    #[test]
    fn substitutes_known_and_keeps_unknown() {
        let values = map(&[("name", "Bob")]);
        assert_eq!(format_safe("Hello {name}", &values), "Hello Bob");
        assert_eq!(format_safe("Hello {name}", &HashMap::new()), "Hello {name}");
        assert_eq!(
            format_safe("{name} in {chat}", &values),
            "Bob in {chat}"
        );
    }

    #[test]
    fn handles_escapes_and_stray_braces() {
        let values = map(&[("a", "1")]);
        assert_eq!(format_safe("{{a}} {a}", &values), "{a} 1");
        assert_eq!(format_safe("open { brace {a}", &values), "open { brace 1");
        assert_eq!(format_safe("close } {a", &values), "close } {a");
        assert_eq!(format_safe("{}", &values), "{}");
        assert_eq!(format_safe("{a:>5}", &values), "1");
    }
}
