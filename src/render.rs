//! View-state helpers for HTML renders returned by annotate requests.

use scraper::{Html, Selector};

/// Visibility of the "default render" section of an HTML render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultRenderToggle {
    visible: bool,
}

impl DefaultRenderToggle {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Flip visibility and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Text for the toggle control: offers the action that flips the current state.
    pub fn label(&self) -> &'static str {
        if self.visible {
            "Hide Default Render"
        } else {
            "Show Default Render"
        }
    }
}

/// Element matched by an [`ElementFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedElement {
    pub tag: String,
    pub item_type: Option<String>,
    pub name: Option<String>,
}

/// Result of applying a filter to a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub matches: Vec<MatchedElement>,
}

impl FilterReport {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn summary(&self) -> String {
        format!("{} elements found.", self.matches.len())
    }
}

/// Selects elements whose `itemtype` and `name` attributes start with the
/// given prefixes. Empty prefixes are ignored; with both empty nothing matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementFilter {
    pub type_prefix: String,
    pub name_prefix: String,
}

impl ElementFilter {
    pub fn new(type_prefix: impl Into<String>, name_prefix: impl Into<String>) -> Self {
        Self {
            type_prefix: type_prefix.into(),
            name_prefix: name_prefix.into(),
        }
    }

    /// CSS attribute selector for the active prefixes, if any.
    pub fn selector(&self) -> Option<String> {
        let mut selector = String::new();
        if !self.type_prefix.is_empty() {
            selector.push_str(&format!("[itemtype^='{}']", escape(&self.type_prefix)));
        }
        if !self.name_prefix.is_empty() {
            selector.push_str(&format!("[name^='{}']", escape(&self.name_prefix)));
        }
        (!selector.is_empty()).then_some(selector)
    }

    /// Collect matching elements of `html` in document order.
    pub fn apply(&self, html: &str) -> FilterReport {
        let Some(source) = self.selector() else {
            return FilterReport::default();
        };
        let selector = match Selector::parse(&source) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::warn!("Invalid filter selector {}: {:?}", source, e);
                return FilterReport::default();
            }
        };

        let document = Html::parse_document(html);
        let matches = document
            .select(&selector)
            .map(|element| {
                let value = element.value();
                MatchedElement {
                    tag: value.name().to_string(),
                    item_type: value.attr("itemtype").map(str::to_string),
                    name: value.attr("name").map(str::to_string),
                }
            })
            .collect();

        FilterReport { matches }
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
