//! Resource strings for menu captions and message templates.
//!
//! Every string ends up in a Telegram MarkdownV2 message, so text that comes
//! from the remote store is escaped before it is inserted into a template.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static MARKDOWN_SPECIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[_*\[\]()~`>#+\-=|{}.!]").unwrap_or_else(|e| panic!("invalid markdown regex: {e}"))
});

/// Escape MarkdownV2 special characters with a backslash.
pub fn escape_markdown(text: &str) -> String {
    MARKDOWN_SPECIALS.replace_all(text, r"\$0").into_owned()
}

/// Captions and templates, English by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strings {
    /// Body of the main menu root
    pub main: String,
    /// Body of a folder node; `{}` is replaced with the folder name
    pub selected_folder: String,
    /// Body of a search result with matches
    pub found: String,
    /// Body of a search result without matches
    pub not_found: String,
    /// Label of the search result root
    pub find: String,
    pub previous_page: String,
    pub next_page: String,
    pub back: String,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            main: "Choose a section".to_string(),
            selected_folder: "Section: {}".to_string(),
            found: "Here is what I found".to_string(),
            not_found: "Nothing found".to_string(),
            find: "Find".to_string(),
            previous_page: "« Previous".to_string(),
            next_page: "Next »".to_string(),
            back: "Back".to_string(),
        }
    }
}

impl Strings {
    /// Escaped body of the main menu root
    pub fn main_body(&self) -> String {
        escape_markdown(&self.main)
    }

    /// Escaped body for a folder node
    pub fn folder_body(&self, folder_name: &str) -> String {
        escape_markdown(&self.selected_folder).replacen(r"\{\}", &escape_markdown(folder_name), 1)
    }

    /// Escaped body for a search result root
    pub fn search_body(&self, has_matches: bool) -> String {
        if has_matches {
            escape_markdown(&self.found)
        } else {
            escape_markdown(&self.not_found)
        }
    }

    /// One bullet line linking a file
    pub fn file_line(&self, name: &str, url: &str) -> String {
        format!("• [{}]({})\n", escape_markdown(name), url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b*c"), r"a\_b\*c");
        assert_eq!(escape_markdown("v1.0 (live)!"), r"v1\.0 \(live\)\!");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn test_folder_body_escapes_name() {
        let strings = Strings::default();
        assert_eq!(strings.folder_body("Rock.n.Roll"), r"Section: Rock\.n\.Roll");
    }

    #[test]
    fn test_folder_body_without_placeholder() {
        let strings = Strings {
            selected_folder: "Folder".to_string(),
            ..Strings::default()
        };
        assert_eq!(strings.folder_body("Songs"), "Folder");
    }

    #[test]
    fn test_file_line() {
        let strings = Strings::default();
        assert_eq!(
            strings.file_line("tab_1.pdf", "https://x/y"),
            "• [tab\\_1\\.pdf](https://x/y)\n"
        );
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let strings: Strings = serde_json::from_str(r#"{"back":"Zurück"}"#).unwrap();
        assert_eq!(strings.back, "Zurück");
        assert_eq!(strings.next_page, Strings::default().next_page);
    }
}
