//! Inline Style Declarations
//!
//! An ordered `property: value [!important]` list mirroring an element's
//! `style` attribute.

use std::fmt;

/// One declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Ordered declaration block; a property appears at most once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclaration {
    declarations: Vec<Declaration>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `style` attribute text. Malformed declarations are dropped.
    pub fn parse(text: &str) -> Self {
        let mut style = Self::new();
        for chunk in split_declarations(text) {
            let Some((property, value)) = chunk.split_once(':') else {
                continue;
            };
            let property = property.trim();
            if property.is_empty() {
                continue;
            }
            let (value, important) = strip_important(value.trim());
            if value.is_empty() {
                continue;
            }
            style.set_property(property, value, important);
        }
        style
    }

    /// Value of `property`, if declared
    pub fn get_property_value(&self, property: &str) -> Option<&str> {
        let property = normalize(property);
        self.declarations
            .iter()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    /// Whether `property` is declared `!important`
    pub fn get_property_priority(&self, property: &str) -> bool {
        let property = normalize(property);
        self.declarations
            .iter()
            .any(|d| d.property == property && d.important)
    }

    pub fn get(&self, property: &str) -> Option<&Declaration> {
        let property = normalize(property);
        self.declarations.iter().find(|d| d.property == property)
    }

    /// Set or replace a declaration. An empty value removes the property.
    pub fn set_property(&mut self, property: &str, value: &str, important: bool) {
        let property = normalize(property);
        let value = value.trim();
        if value.is_empty() {
            self.remove_property(&property);
            return;
        }
        match self.declarations.iter_mut().find(|d| d.property == property) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.important = important;
            }
            None => self.declarations.push(Declaration {
                property,
                value: value.to_string(),
                important,
            }),
        }
    }

    /// Remove a declaration, returning its previous value
    pub fn remove_property(&mut self, property: &str) -> Option<String> {
        let property = normalize(property);
        let idx = self.declarations.iter().position(|d| d.property == property)?;
        Some(self.declarations.remove(idx).value)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    /// Serialized `style` attribute text
    pub fn css_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StyleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {}", d.property, d.value)?;
            if d.important {
                f.write_str(" !important")?;
            }
            f.write_str(";")?;
        }
        Ok(())
    }
}

/// Custom properties keep their case; everything else is ASCII-lowercased
fn normalize(property: &str) -> String {
    let property = property.trim();
    if property.starts_with("--") {
        property.to_string()
    } else {
        property.to_ascii_lowercase()
    }
}

/// Split on `;` outside parentheses and quotes, so `url(a;b)` survives
fn split_declarations(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                out.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&text[start..]);
    out
}

fn strip_important(value: &str) -> (&str, bool) {
    if let Some(bang) = value.rfind('!') {
        let flag = value[bang + 1..].trim();
        if flag.eq_ignore_ascii_case("important") {
            return (value[..bang].trim_end(), true);
        }
    }
    (value, false)
}
