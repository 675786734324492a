use crate::selector::{SelectorExpr, Target};
use scraper::{ElementRef, Html};

/// A parsed HTML document that selector expressions can be evaluated against
pub struct SelectorDocument {
    html: Html,
}

impl SelectorDocument {
    /// Parses raw HTML. Malformed markup is recovered, never rejected.
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// Returns a scope covering the whole document
    pub fn root(&self) -> Scope<'_> {
        Scope {
            element: self.html.root_element(),
        }
    }

    /// Restricts the document to the first element matched by `root`
    ///
    /// Returns `None` when nothing matches, which callers treat as a
    /// document-shape mismatch.
    pub fn restrict(&self, root: &SelectorExpr) -> Option<Scope<'_>> {
        self.root().scopes(root).into_iter().next()
    }
}

/// A sub-tree of a [`SelectorDocument`] that expressions are evaluated inside
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    element: ElementRef<'a>,
}

impl<'a> Scope<'a> {
    /// Evaluates `expr` and returns the matched fragments in document order
    pub fn select(&self, expr: &SelectorExpr) -> Vec<String> {
        self.element
            .select(expr.css())
            .filter_map(|element| fragment(element, expr.target()))
            .collect()
    }

    /// Returns one scope per element matched by `expr`, in document order
    pub fn scopes(&self, expr: &SelectorExpr) -> Vec<Scope<'a>> {
        self.element
            .select(expr.css())
            .map(|element| Scope { element })
            .collect()
    }
}

fn fragment(element: ElementRef<'_>, target: &Target) -> Option<String> {
    match target {
        Target::Text => Some(element.text().collect::<String>()),
        Target::Attr(name) => element.value().attr(name).map(str::to_string),
        Target::Html => Some(element.html()),
    }
}
