//! Path-expression subset understood by the snapshot controller.
//!
//! Supported forms:
//! - `//*[@id="X"]` or `//tag[@id='X']` anchors, optionally followed by steps
//! - `.` / `..` relative to the lookup scope
//! - child steps `tag`, `tag[n]` (1-based among same-tag siblings) and `*`

use std::sync::LazyLock;

use regex::Regex;

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^//(\*|[A-Za-z][A-Za-z0-9_-]*)\[@id=(?:"([^"]*)"|'([^']*)')\]"#).unwrap()
});

static CHILD_STEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\*|[A-Za-z][A-Za-z0-9_-]*)(?:\[(\d+)\])?$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// Start from the lookup scope (or the document root for page scope).
    Scope,
    /// Start from the element with this id anywhere in the document.
    Id { tag: Option<String>, id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Parent,
    Child {
        tag: Option<String>,
        position: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathExpr {
    pub anchor: Anchor,
    pub steps: Vec<Step>,
}

pub(crate) fn parse(expr: &str) -> Option<PathExpr> {
    let expr = expr.trim();

    let (anchor, rest) = if let Some(caps) = ANCHOR.captures(expr) {
        let tag = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|t| *t != "*")
            .map(|t| t.to_ascii_lowercase());
        let id = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
        let consumed = caps.get(0)?.end();
        (Anchor::Id { tag, id }, &expr[consumed..])
    } else if expr.starts_with('.') {
        (Anchor::Scope, expr)
    } else {
        return None;
    };

    let mut steps = Vec::new();
    let rest = match anchor {
        Anchor::Id { .. } if rest.is_empty() => return Some(PathExpr { anchor, steps }),
        Anchor::Id { .. } => rest.strip_prefix('/')?,
        Anchor::Scope => rest,
    };

    for segment in rest.split('/') {
        match segment {
            "." => {}
            ".." => steps.push(Step::Parent),
            "" => return None,
            _ => {
                let caps = CHILD_STEP.captures(segment)?;
                let tag = caps
                    .get(1)
                    .map(|m| m.as_str())
                    .filter(|t| *t != "*")
                    .map(|t| t.to_ascii_lowercase());
                let position = match caps.get(2) {
                    Some(m) => match m.as_str().parse::<usize>().ok()? {
                        0 => return None,
                        n => Some(n),
                    },
                    None => None,
                };
                steps.push(Step::Child { tag, position });
            }
        }
    }

    Some(PathExpr { anchor, steps })
}
