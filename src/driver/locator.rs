//! Locators and keys

use std::fmt;

/// How to find elements on the page. Re-resolved on every access.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// CSS selector
    Css(String),
    /// XPath expression, evaluated against the document
    XPath(String),
    /// Element ID
    Id(String),
    /// Tag name
    TagName(String),
}

impl Locator {
    pub fn css<S: Into<String>>(selector: S) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath<S: Into<String>>(expression: S) -> Self {
        Locator::XPath(expression.into())
    }

    pub fn id<S: Into<String>>(id: S) -> Self {
        Locator::Id(id.into())
    }

    pub fn tag_name<S: Into<String>>(tag: S) -> Self {
        Locator::TagName(tag.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
            Locator::Id(s) => write!(f, "id={}", s),
            Locator::TagName(s) => write!(f, "tag={}", s),
        }
    }
}

/// Quote `text` as an XPath string literal.
///
/// XPath 1.0 has no escape sequences, so text containing both quote kinds
/// is split into a `concat()` of literals.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }

    let parts: Vec<String> = text
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Special keys sent to an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Submits the sign-in form, the message composer and top search
    Enter,
}

impl Key {
    /// DOM `key` value
    pub fn name(&self) -> &'static str {
        match self {
            Key::Enter => "Enter",
        }
    }

    /// DOM `code` value
    pub fn code(&self) -> &'static str {
        self.name()
    }

    /// Legacy `keyCode`, also the Windows virtual key code
    pub fn key_code(&self) -> u32 {
        match self {
            Key::Enter => 13,
        }
    }

    /// Text the key inserts, if any
    pub fn text(&self) -> Option<&'static str> {
        match self {
            Key::Enter => Some("\r"),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
