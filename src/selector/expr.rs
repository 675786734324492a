use crate::SelectorError;
use scraper::Selector;
use std::fmt;
use std::str::FromStr;

/// What a selector expression yields for each matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Concatenated descendant text (`::text`)
    Text,
    /// Value of the named attribute (`::attr(name)`)
    Attr(String),
    /// Outer HTML of the element (no suffix or `::html`)
    Html,
}

/// A compiled selector expression: a CSS selector plus an output target
///
/// # Grammar
///
/// ```text
/// <css selector>            -> outer HTML of each match
/// <css selector>::html      -> outer HTML of each match
/// <css selector>::text      -> text content of each match
/// <css selector>::attr(x)   -> attribute `x` of each match that carries it
/// ```
///
/// # Examples
///
/// ```
/// use homespace::selector::{SelectorExpr, Target};
///
/// let expr: SelectorExpr = "li > a::attr(href)".parse().unwrap();
/// assert_eq!(expr.target(), &Target::Attr("href".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct SelectorExpr {
    source: String,
    css: Selector,
    target: Target,
}

impl SelectorExpr {
    /// Returns the expression as written in configuration
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the output target of this expression
    pub fn target(&self) -> &Target {
        &self.target
    }

    pub(crate) fn css(&self) -> &Selector {
        &self.css
    }
}

impl FromStr for SelectorExpr {
    type Err = SelectorError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }

        let (css_part, target) = split_target(trimmed)?;
        if css_part.is_empty() {
            return Err(SelectorError::Empty);
        }

        let css = Selector::parse(css_part).map_err(|e| SelectorError::Css {
            expr: trimmed.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            source: trimmed.to_string(),
            css,
            target,
        })
    }
}

impl fmt::Display for SelectorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Splits a trailing `::text`, `::html` or `::attr(name)` off the CSS part
fn split_target(expr: &str) -> Result<(&str, Target), SelectorError> {
    let Some(idx) = last_target_separator(expr) else {
        return Ok((expr, Target::Html));
    };

    let (css, pseudo) = (expr[..idx].trim_end(), &expr[idx + 2..]);

    match pseudo {
        "text" => Ok((css, Target::Text)),
        "html" => Ok((css, Target::Html)),
        _ => {
            let name = pseudo
                .strip_prefix("attr(")
                .and_then(|rest| rest.strip_suffix(')'))
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| SelectorError::UnknownPseudo(expr.to_string()))?;
            Ok((css, Target::Attr(name.to_string())))
        }
    }
}

/// Byte offset of the last `::` outside attribute brackets and quoted strings
fn last_target_separator(expr: &str) -> Option<usize> {
    let bytes = expr.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut last = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                    last = Some(i);
                    i += 1;
                }
                _ => {}
            },
        }
        i += 1;
    }

    last
}
