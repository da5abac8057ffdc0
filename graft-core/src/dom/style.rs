//! Inline Style
//!
//! A minimal CSSOM declaration block. Declarations are kept in insertion
//! order under their kebab-case names; camelCase names (`backgroundColor`)
//! are normalised on the way in, custom properties (`--accent`) are kept
//! verbatim.

use indexmap::IndexMap;

/// An element's inline style declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssStyle {
    declarations: IndexMap<String, String>,
}

impl CssStyle {
    /// Create an empty declaration block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a declaration block from style text (`"color: red; margin: 0"`).
    pub fn parse(text: &str) -> Self {
        let mut style = Self::new();
        style.set_css_text(text);
        style
    }

    /// Get the value of one declaration.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .get(&normalize_name(name))
            .map(String::as_str)
    }

    /// Set one declaration. An empty value removes it, as in the CSSOM.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = normalize_name(name);
        let value = value.trim();
        if value.is_empty() {
            self.declarations.shift_remove(&name);
        } else {
            self.declarations.insert(name, value.to_owned());
        }
    }

    /// Remove one declaration, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.declarations.shift_remove(&normalize_name(name))
    }

    /// Serialize the declarations as style text.
    pub fn css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace every declaration with the ones parsed from `text`.
    ///
    /// Malformed declarations (no colon, empty name) are dropped.
    pub fn set_css_text(&mut self, text: &str) {
        self.declarations.clear();
        for declaration in text.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if !name.is_empty() {
                self.set(name, value);
            }
        }
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether the block has no declarations.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Iterate declarations in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Convert a camelCase property name to its kebab-case CSS name.
fn normalize_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("--") {
        return name.to_owned();
    }
    if name == "cssFloat" {
        return "float".to_owned();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_names_are_normalized() {
        let mut style = CssStyle::new();
        style.set("backgroundColor", "red");

        assert_eq!(style.get("background-color"), Some("red"));
        assert_eq!(style.get("backgroundColor"), Some("red"));
        assert_eq!(style.css_text(), "background-color: red;");
    }

    #[test]
    fn custom_properties_keep_their_case() {
        let mut style = CssStyle::new();
        style.set("--mainColor", "blue");

        assert_eq!(style.get("--mainColor"), Some("blue"));
        assert_eq!(style.get("--main-color"), None);
    }

    #[test]
    fn empty_value_removes_declaration() {
        let mut style = CssStyle::parse("color: red; margin: 0");
        assert_eq!(style.len(), 2);

        style.set("color", "");
        assert_eq!(style.get("color"), None);
        assert_eq!(style.css_text(), "margin: 0;");
    }

    #[test]
    fn css_text_round_trips() {
        let style = CssStyle::parse("color: red;  ; bogus; padding : 4px ");

        assert_eq!(style.css_text(), "color: red; padding: 4px;");
        assert_eq!(CssStyle::parse(&style.css_text()), style);
    }
}
