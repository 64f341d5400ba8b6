use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Entities decoded by [`sanitize`], applied in this order after tag removal.
const ENTITIES: [(&str, &str); 6] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&nbsp;", " "),
];

/// Matches an opening or closing tag, a comment or a doctype: `<` directly
/// followed by a letter, `/` + letter, or `!`. An unterminated tag swallows
/// the rest of the input, same as a tag that runs off the end of a truncated
/// summary. A `<` followed by anything else is a literal less-than sign.
fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"</?[A-Za-z!][^>]*(?:>|$)").expect("Bad tag regex"))
}

fn strip_tags_and_decode(s: &str) -> Cow<'_, str> {
    let stripped = tag_pattern().replace_all(s, "");
    if !stripped.contains('&') {
        return stripped;
    }

    let mut out = stripped.into_owned();
    for (entity, literal) in ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, literal);
        }
    }
    Cow::Owned(out)
}

/// Removes markup tags and decodes the basic HTML entities in a free-text field.
///
/// Tags are removed first, then `&amp; &lt; &gt; &quot; &#39; &nbsp;` are
/// decoded in that order. Decoding can surface new markup (`&lt;b&gt;`), so
/// the two steps repeat until the text stops changing. Every round that
/// changes anything shortens the string, so the loop terminates, and the
/// result is a fixed point: `sanitize(sanitize(x)) == sanitize(x)`.
///
/// Returns `Cow::Borrowed` when the input contains neither tags nor entities.
///
/// # Examples
///
/// ```
/// use newsreel::util::sanitize;
///
/// assert_eq!(sanitize("<p>Rock &amp; roll</p>"), "Rock & roll");
/// assert_eq!(sanitize("plain text"), "plain text");
/// ```
pub fn sanitize(raw: &str) -> Cow<'_, str> {
    let mut current = match strip_tags_and_decode(raw) {
        Cow::Borrowed(_) => return Cow::Borrowed(raw),
        Cow::Owned(s) => s,
    };

    loop {
        match strip_tags_and_decode(&current) {
            Cow::Borrowed(_) => break,
            Cow::Owned(next) if next == current => break,
            Cow::Owned(next) => current = next,
        }
    }

    Cow::Owned(current)
}

/// Calculates the display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";

/// Truncates a string to fit within `max_width` terminal columns.
///
/// Appends "..." when text is cut, unless `max_width` is too narrow to hold
/// at least one character plus the ellipsis, in which case the string is cut
/// without one. Wide characters (CJK, emoji) count as two columns.
///
/// # Examples
///
/// ```
/// use newsreel::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let ellipsis = if max_width > ELLIPSIS.len() {
        ELLIPSIS
    } else {
        ""
    };
    let budget = max_width - ellipsis.len();

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    Cow::Owned(format!("{}{}", &s[..end], ellipsis))
}

fn is_unsafe_control(c: char) -> bool {
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{7f}'
}

/// Strips terminal control characters and ANSI escape sequences.
///
/// Article titles and summaries come from third-party APIs and are printed
/// straight to the terminal, so CSI (`ESC [ ... final`) and OSC
/// (`ESC ] ... BEL|ST`) sequences and other C0 controls are removed.
/// Tab, newline and carriage return survive.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_unsafe_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            if !is_unsafe_control(c) {
                out.push(c);
            }
            continue;
        }

        match chars.peek() {
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\u{07}' {
                        break;
                    }
                    if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}
