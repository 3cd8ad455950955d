//! Text helpers for chat output: sanitising, splitting into messages,
//! boolean parsing and plain-text tables.
//!
//! All lengths are counted in characters, not bytes.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Maximum message length accepted by Discord.
pub const MESSAGE_LIMIT: usize = 2000;

/// Page length leaving room for code-block fences around the text.
pub const PAGE_LIMIT: usize = 1990;

/// URLs are kept verbatim; everything in the `markdown` group gets a backslash.
static MARKDOWN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?P<url><[^: >]+:/[^ >]+>|(?:https?|steam)://[^\s<]+[^<.,:;"'\]\s])|(?P<markdown>[_\\~|*`]|^>(?:>>)?\s|\[.+\]\(.+\)|^#{1,3}|^\s*-)"#,
    )
    .unwrap()
});

/// Escape Discord markdown so the text renders literally.
pub fn escape_markdown(text: &str) -> String {
    MARKDOWN_REGEX
        .replace_all(text, |caps: &Captures| match caps.name("url") {
            Some(url) => url.as_str().to_string(),
            None => format!("\\{}", &caps["markdown"]),
        })
        .into_owned()
}

/// Sanitise user-provided text with the default options: markdown escaped,
/// mentions defused, at most [`MESSAGE_LIMIT`] characters.
pub fn sanitise(text: &str) -> String {
    sanitise_with(text, MESSAGE_LIMIT, true, true)
}

/// Sanitise text.
///
/// * `limit`: how many characters to keep.
/// * `escape`: escape markdown.
/// * `tag_escape`: put a zero-width space after every `@` so the text cannot ping anyone.
pub fn sanitise_with(text: &str, limit: usize, escape: bool, tag_escape: bool) -> String {
    let mut text = if escape {
        escape_markdown(text)
    } else {
        text.to_string()
    };
    if tag_escape {
        text = text.replace('@', "@\u{200b}");
    }
    text.chars().take(limit).collect()
}

/// Split text into consecutive chunks of at most `limit` characters.
pub fn split(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Join lines into pages without ever cutting a line in half.
///
/// A page is closed once it has reached `limit` characters, so a single long
/// line may make its page longer than `limit`.
pub fn split_lines<S: AsRef<str>>(lines: &[S], limit: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut page = String::new();
    let mut page_len = 0;

    for line in lines {
        if page_len >= limit {
            pages.push(page.trim_matches('\n').to_string());
            page.clear();
            page_len = 0;
        }
        let line = line.as_ref();
        page.push_str(line);
        page.push('\n');
        page_len += line.chars().count() + 1;
    }
    pages.push(page.trim_matches('\n').to_string());
    pages
}

/// Parse `1`/`true`/`yes` and `0`/`false`/`no` (any case). Anything else is `None`.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// A record that can be rendered by [`create_table`].
pub trait TableRow {
    /// Text of the given column, `None` if the record has no such column.
    fn cell(&self, column: &str) -> Option<String>;
}

impl<T: TableRow + ?Sized> TableRow for &T {
    fn cell(&self, column: &str) -> Option<String> {
        (**self).cell(column)
    }
}

const ANSI_PREFIX: &str = "ansi\n";
const ANSI_HEADER: &str = "\u{1b}[1;34m";
const ANSI_ALTERNATE: &str = "\u{1b}[36m";
const ANSI_RESET: &str = "\u{1b}[0m";

/// Render records as a left-aligned table, split into pages of at most `limit`
/// characters.
///
/// `header` maps column keys to their labels. With `rich`, each page starts
/// with `ansi\n` (for an `ansi` code block), the heading is bold blue and every
/// other data row cyan.
pub fn create_table<I>(items: I, header: &[(&str, &str)], limit: usize, rich: bool) -> Vec<String>
where
    I: IntoIterator,
    I::Item: TableRow,
{
    let mut matrix: Vec<Vec<String>> = vec![header.iter().map(|(_, label)| label.to_string()).collect()];
    let mut widths: Vec<usize> = header.iter().map(|(_, label)| label.chars().count()).collect();

    for item in items {
        let line: Vec<String> = header
            .iter()
            .map(|(column, _)| item.cell(column).unwrap_or_default())
            .collect();
        for (width, value) in widths.iter_mut().zip(&line) {
            *width = (*width).max(value.chars().count());
        }
        matrix.push(line);
    }

    let (prefix, heading, alternate, reset) = if rich {
        (ANSI_PREFIX, ANSI_HEADER, ANSI_ALTERNATE, ANSI_RESET)
    } else {
        ("", "", "", "")
    };

    let mut pages = Vec::new();
    let mut page = prefix.to_string();
    let mut page_len = prefix.chars().count();

    for (i, row) in matrix.iter().enumerate() {
        let mut line = String::new();
        if i == 0 {
            line.push_str(heading);
        } else if i % 2 == 0 {
            line.push_str(alternate);
        }

        for (value, width) in row.iter().zip(&widths) {
            line.push_str(value);
            let padding = width + 2 - value.chars().count();
            line.extend(std::iter::repeat_n(' ', padding));
        }

        let mut line = line.trim_end().to_string();
        if i % 2 == 0 {
            line.push_str(reset);
        }
        line.push('\n');

        let line_len = line.chars().count();
        if page_len + line_len > limit {
            pages.push(std::mem::replace(&mut page, prefix.to_string()));
            page_len = prefix.chars().count();
        }
        page.push_str(&line);
        page_len += line_len;
    }
    pages.push(page);

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str, &'static str);

    impl TableRow for Row {
        fn cell(&self, column: &str) -> Option<String> {
            match column {
                "name" => Some(self.0.to_string()),
                "enabled" => Some(self.1.to_string()),
                _ => None,
            }
        }
    }

    const HEADER: [(&str, &str); 2] = [("name", "Name"), ("enabled", "Enabled")];

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("**bold**"), r"\*\*bold\*\*");
        assert_eq!(escape_markdown("snake_case"), r"snake\_case");
        assert_eq!(escape_markdown("> quote"), r"\> quote");
        assert_eq!(escape_markdown("# title"), r"\# title");
    }

    #[test]
    fn test_escape_keeps_urls() {
        let text = "see https://example.com/a_b_c please";
        assert_eq!(escape_markdown(text), text);
    }

    #[test]
    fn test_sanitise_defuses_mentions_and_truncates() {
        assert_eq!(sanitise("@everyone"), "@\u{200b}everyone");
        assert_eq!(sanitise_with("abcdef", 3, true, true), "abc");
        assert_eq!(sanitise_with("_a_", 10, false, false), "_a_");
        assert_eq!(sanitise_with("a@b", 10, false, true), "a@\u{200b}b");
    }

    #[test]
    fn test_split() {
        assert_eq!(split("abcdefg", 3), vec!["abc", "def", "g"]);
        assert!(split("", 3).is_empty());
        assert_eq!(split("ěščř", 2), vec!["ěš", "čř"]);
    }

    #[test]
    fn test_split_lines_never_cuts_a_line() {
        let lines = ["aaaa", "bbbb", "cccc"];
        assert_eq!(split_lines(&lines, 5), vec!["aaaa", "bbbb", "cccc"]);
        assert_eq!(split_lines(&lines, 10), vec!["aaaa\nbbbb", "cccc"]);
        assert_eq!(split_lines(&lines, 100), vec!["aaaa\nbbbb\ncccc"]);
    }

    #[test]
    fn test_split_lines_empty_input() {
        let lines: [&str; 0] = [];
        assert_eq!(split_lines(&lines, 10), vec![""]);
    }

    #[test]
    fn test_parse_bool() {
        for text in ["1", "true", "YES", "True"] {
            assert_eq!(parse_bool(text), Some(true));
        }
        for text in ["0", "false", "No"] {
            assert_eq!(parse_bool(text), Some(false));
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_plain_table() {
        let rows = [Row("base", "true"), Row("fun", "false")];
        let pages = create_table(&rows, &HEADER, PAGE_LIMIT, false);
        assert_eq!(pages, vec!["Name  Enabled\nbase  true\nfun   false\n"]);
    }

    #[test]
    fn test_rich_table_colors_rows() {
        let rows = [Row("base", "true"), Row("fun", "false")];
        let pages = create_table(&rows, &HEADER, PAGE_LIMIT, true);
        assert_eq!(
            pages,
            vec![
                "ansi\n\u{1b}[1;34mName  Enabled\u{1b}[0m\nbase  true\n\u{1b}[36mfun   false\u{1b}[0m\n"
            ]
        );
    }

    #[test]
    fn test_table_pages_respect_limit() {
        let rows = [Row("base", "true"), Row("fun", "false")];
        let pages = create_table(&rows, &HEADER, 20, false);
        assert_eq!(pages, vec!["Name  Enabled\n", "base  true\n", "fun   false\n"]);
    }

    #[test]
    fn test_table_missing_column_is_empty() {
        let rows = [Row("base", "true")];
        let pages = create_table(&rows, &[("name", "Name"), ("path", "Path")], PAGE_LIMIT, false);
        assert_eq!(pages, vec!["Name  Path\nbase\n"]);
    }
}
