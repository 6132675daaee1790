//! Computed Style
//!
//! Resolution for the handful of properties the theming pipeline reads:
//! inline declaration, then host author style (with `!important` able to beat
//! a normal inline declaration), then inheritance, then the initial value.

use crate::node::ElementData;
use crate::tree::DomTree;
use crate::NodeId;

/// Tags the user agent stylesheet hides
const HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "template", "meta", "link", "title", "base", "datalist",
];

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "em", "i", "kbd", "label", "mark", "q",
    "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// Properties whose value flows from parent to child when undeclared
pub fn is_inherited(property: &str) -> bool {
    matches!(property, "color" | "visibility")
}

/// CSS initial value for the supported properties
pub fn initial_value(property: &str, tag: &str) -> Option<&'static str> {
    let value = match property {
        "color" => "rgb(0, 0, 0)",
        "background-color" => "rgba(0, 0, 0, 0)",
        "border-top-color" | "border-right-color" | "border-bottom-color" | "border-left-color"
        | "outline-color" | "text-decoration-color" => "currentcolor",
        "display" if HIDDEN_TAGS.iter().any(|t| *t == tag) => "none",
        "display" if INLINE_TAGS.iter().any(|t| *t == tag) => "inline",
        "display" => "block",
        "visibility" => "visible",
        "opacity" => "1",
        _ => return None,
    };
    Some(value)
}

enum Cascaded<'a> {
    Value(&'a str),
    Inherit,
    Initial,
}

fn cascaded<'a>(el: &'a ElementData, property: &str) -> Cascaded<'a> {
    let inline = el.inline_style.get(property);
    let author = el.author_style.get(property);
    let declared = match (inline, author) {
        (Some(inline), Some(author)) if author.important && !inline.important => Some(author),
        (Some(inline), _) => Some(inline),
        (None, author) => author,
    };
    let declared = declared
        .map(|d| d.value.as_str())
        .or_else(|| (property == "display" && el.attr("hidden").is_some()).then_some("none"));

    match declared.map(|v| (v, v.to_ascii_lowercase())) {
        None => {
            if is_inherited(property) {
                Cascaded::Inherit
            } else {
                Cascaded::Initial
            }
        }
        Some((_, lower)) if lower == "inherit" => Cascaded::Inherit,
        Some((_, lower)) if lower == "initial" => Cascaded::Initial,
        Some((_, lower)) if matches!(lower.as_str(), "unset" | "revert" | "revert-layer") => {
            if is_inherited(property) {
                Cascaded::Inherit
            } else {
                Cascaded::Initial
            }
        }
        // `color: currentcolor` behaves as inherit
        Some((_, lower)) if property == "color" && lower == "currentcolor" => Cascaded::Inherit,
        Some((value, _)) => Cascaded::Value(value),
    }
}

impl DomTree {
    /// Computed value of `property` on an element; `None` for non-elements
    /// and unsupported properties without a declaration.
    ///
    /// `currentcolor` on the border, outline and text-decoration colors
    /// resolves to the element's computed `color`.
    pub fn computed_value(&self, id: NodeId, property: &str) -> Option<String> {
        self.resolve(id, property).map(|(_, value)| value.to_string())
    }

    /// Element whose declaration (or initial value) supplied the computed
    /// value of `property`: `id` itself, or the ancestor it was inherited from
    pub fn computed_origin(&self, id: NodeId, property: &str) -> Option<NodeId> {
        self.resolve(id, property).map(|(origin, _)| origin)
    }

    fn resolve(&self, id: NodeId, property: &str) -> Option<(NodeId, &str)> {
        let property = property.to_ascii_lowercase();
        let mut current = id;
        let mut el = self.element(current)?;

        let value = loop {
            match cascaded(el, &property) {
                Cascaded::Value(value) => break Some(value),
                Cascaded::Initial => break initial_value(&property, &el.tag),
                Cascaded::Inherit => match self.parent(current).filter(|p| self.is_element(*p)) {
                    Some(parent) => {
                        current = parent;
                        el = self.element(parent)?;
                    }
                    None => break initial_value(&property, &el.tag),
                },
            }
        }?;

        if property != "color" && value.eq_ignore_ascii_case("currentcolor") {
            return self.resolve(current, "color");
        }
        Some((current, value))
    }

    /// Whether the element renders: it has no zero-size layout box and is not
    /// `display: none`, `visibility: hidden|collapse` or `opacity: 0`
    pub fn is_visible(&self, id: NodeId) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if el.layout.is_some_and(|b| b.is_zero()) {
            return false;
        }
        let is = |property: &str, values: &[&str]| {
            self.computed_value(id, property)
                .is_some_and(|v| values.iter().any(|x| v.trim().eq_ignore_ascii_case(x)))
        };
        if is("display", &["none"]) || is("visibility", &["hidden", "collapse"]) {
            return false;
        }
        let opacity = self
            .computed_value(id, "opacity")
            .and_then(|v| parse_opacity(&v))
            .unwrap_or(1.0);
        opacity > 0.0
    }
}

fn parse_opacity(value: &str) -> Option<f32> {
    let value = value.trim();
    match value.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok().map(|p| p / 100.0),
        None => value.parse().ok(),
    }
}
