//! Offline page controller backed by saved HTML.
//!
//! A [`SnapshotSite`] maps URLs to HTML documents. The controller parses a
//! document whenever a context loads a URL and answers lookups against the
//! parsed tree. Clicking an element that carries an `href` (or sits inside
//! an anchor) loads the target page into the current context, which is
//! enough to model "load more" links and review tabs.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::xpath::{self, Anchor, PathExpr, Step};
use super::{BrowserError, BrowserResult, ContextId, Locator, PageController, Scope};

/// Saved pages addressable by URL.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSite {
    pages: HashMap<String, String>,
}

impl SnapshotSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(url, html);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(url.into(), html.into());
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn lookup(&self, url: &str) -> Option<&str> {
        self.pages
            .get(url)
            .or_else(|| self.pages.get(url.trim_end_matches('/')))
            .map(String::as_str)
    }
}

struct LoadedPage {
    url: String,
    document: Html,
    generation: u64,
}

/// Handle to an element of a loaded snapshot page.
///
/// Stores the child-index path from the document root; a handle becomes
/// stale once its context loads another page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotElement {
    context: ContextId,
    generation: u64,
    path: Vec<usize>,
}

/// [`PageController`] that serves pages from a [`SnapshotSite`].
pub struct SnapshotController {
    site: SnapshotSite,
    contexts: BTreeMap<ContextId, LoadedPage>,
    current: Option<ContextId>,
    next_context: u64,
    next_generation: u64,
}

impl SnapshotController {
    pub fn new(site: SnapshotSite) -> Self {
        Self {
            site,
            contexts: BTreeMap::new(),
            current: None,
            next_context: 1,
            next_generation: 1,
        }
    }

    /// Number of open browsing contexts.
    pub fn open_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// URL loaded in the current context.
    pub fn current_url(&self) -> Option<&str> {
        self.current
            .and_then(|id| self.contexts.get(&id))
            .map(|page| page.url.as_str())
    }

    fn parse(&mut self, url: &str) -> BrowserResult<LoadedPage> {
        let html = self
            .site
            .lookup(url)
            .ok_or_else(|| BrowserError::navigation(url, "page not in snapshot"))?;
        let document = Html::parse_document(html);
        let generation = self.next_generation;
        self.next_generation += 1;
        Ok(LoadedPage {
            url: url.to_string(),
            document,
            generation,
        })
    }

    fn current_page(&self) -> BrowserResult<(ContextId, &LoadedPage)> {
        let id = self.current.ok_or(BrowserError::NoActiveContext)?;
        let page = self
            .contexts
            .get(&id)
            .ok_or(BrowserError::UnknownContext(id))?;
        Ok((id, page))
    }

    fn resolve<'a>(&'a self, element: &SnapshotElement) -> BrowserResult<ElementRef<'a>> {
        let page = self
            .contexts
            .get(&element.context)
            .ok_or(BrowserError::StaleElement)?;
        if page.generation != element.generation {
            return Err(BrowserError::StaleElement);
        }
        element_at(&page.document, &element.path).ok_or(BrowserError::StaleElement)
    }

    fn handle(&self, context: ContextId, generation: u64, element: ElementRef<'_>) -> SnapshotElement {
        SnapshotElement {
            context,
            generation,
            path: node_path(element),
        }
    }
}

#[async_trait(?Send)]
impl PageController for SnapshotController {
    type Element = SnapshotElement;

    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        let page = self.parse(url)?;
        let id = match self.current {
            Some(id) => id,
            None => {
                let id = ContextId(self.next_context);
                self.next_context += 1;
                self.current = Some(id);
                id
            }
        };
        debug!("Snapshot {} loaded {}", id, url);
        self.contexts.insert(id, page);
        Ok(())
    }

    async fn find_all(
        &mut self,
        scope: Scope<'_, SnapshotElement>,
        locator: &Locator,
    ) -> BrowserResult<Vec<SnapshotElement>> {
        let (context, page) = self.current_page()?;
        let root = match scope {
            Scope::Page => None,
            Scope::Element(element) => {
                if element.context != context {
                    return Err(BrowserError::StaleElement);
                }
                Some(self.resolve(element)?)
            }
        };

        let found: Vec<ElementRef<'_>> = match locator {
            Locator::Path(expr) => {
                let parsed = xpath::parse(expr)
                    .ok_or_else(|| BrowserError::UnsupportedLocator(locator.to_string()))?;
                eval_path(&page.document, root, &parsed)
            }
            _ => {
                let css = locator
                    .to_css()
                    .ok_or_else(|| BrowserError::UnsupportedLocator(locator.to_string()))?;
                let selector = Selector::parse(&css)
                    .map_err(|_| BrowserError::UnsupportedLocator(locator.to_string()))?;
                match root {
                    Some(root) => root.select(&selector).collect(),
                    None => page.document.select(&selector).collect(),
                }
            }
        };

        Ok(found
            .into_iter()
            .map(|element| self.handle(context, page.generation, element))
            .collect())
    }

    async fn text(&mut self, element: &SnapshotElement) -> BrowserResult<String> {
        let element = self.resolve(element)?;
        let raw = element.text().collect::<Vec<_>>().join(" ");
        Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    async fn attribute(
        &mut self,
        element: &SnapshotElement,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        let element = self.resolve(element)?;
        Ok(element.value().attr(name).map(str::to_string))
    }

    async fn is_displayed(&mut self, element: &SnapshotElement) -> BrowserResult<bool> {
        let element = self.resolve(element)?;
        let hidden = std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .any(is_hidden);
        Ok(!hidden)
    }

    async fn click(&mut self, element: &SnapshotElement) -> BrowserResult<()> {
        let target = {
            let resolved = self.resolve(element)?;
            let page = self
                .contexts
                .get(&element.context)
                .ok_or(BrowserError::StaleElement)?;
            link_target(resolved).map(|href| join_url(&page.url, href))
        };

        let Some(target) = target else {
            return Ok(());
        };

        let page = self.parse(&target)?;
        debug!("Snapshot {} followed click to {}", element.context, target);
        self.contexts.insert(element.context, page);
        Ok(())
    }

    fn current_context(&self) -> Option<ContextId> {
        self.current
    }

    async fn open_context(&mut self, url: &str) -> BrowserResult<ContextId> {
        let page = self.parse(url)?;
        let id = ContextId(self.next_context);
        self.next_context += 1;
        self.contexts.insert(id, page);
        Ok(id)
    }

    async fn switch_to(&mut self, context: ContextId) -> BrowserResult<()> {
        if !self.contexts.contains_key(&context) {
            return Err(BrowserError::UnknownContext(context));
        }
        self.current = Some(context);
        Ok(())
    }

    async fn close_context(&mut self, context: ContextId) -> BrowserResult<()> {
        self.contexts
            .remove(&context)
            .ok_or(BrowserError::UnknownContext(context))?;
        if self.current == Some(context) {
            self.current = None;
        }
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        self.current_page().map(|_| ())
    }

    async fn page_text(&mut self) -> BrowserResult<String> {
        let (_, page) = self.current_page()?;
        Ok(page.document.html())
    }
}

fn node_path(element: ElementRef<'_>) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = *element;
    while let Some(parent) = node.parent() {
        path.push(node.prev_siblings().count());
        node = parent;
    }
    path.reverse();
    path
}

fn element_at<'a>(document: &'a Html, path: &[usize]) -> Option<ElementRef<'a>> {
    let mut node = document.tree.root();
    for &index in path {
        node = node.children().nth(index)?;
    }
    ElementRef::wrap(node)
}

fn eval_path<'a>(
    document: &'a Html,
    scope: Option<ElementRef<'a>>,
    expr: &PathExpr,
) -> Vec<ElementRef<'a>> {
    let mut current: Vec<ElementRef<'a>> = match &expr.anchor {
        Anchor::Scope => vec![scope.unwrap_or_else(|| document.root_element())],
        Anchor::Id { tag, id } => document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().id() == Some(id.as_str()))
            .filter(|el| tag_matches(*el, tag.as_deref()))
            .take(1)
            .collect(),
    };

    for step in &expr.steps {
        current = current
            .into_iter()
            .flat_map(|el| apply_step(el, step))
            .collect();
    }

    current
}

fn apply_step<'a>(element: ElementRef<'a>, step: &Step) -> Vec<ElementRef<'a>> {
    match step {
        Step::Parent => element
            .parent()
            .and_then(ElementRef::wrap)
            .into_iter()
            .collect(),
        Step::Child { tag, position } => {
            let mut matching = element
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| tag_matches(*child, tag.as_deref()));
            match position {
                Some(n) => matching.nth(n - 1).into_iter().collect(),
                None => matching.collect(),
            }
        }
    }
}

fn tag_matches(element: ElementRef<'_>, tag: Option<&str>) -> bool {
    tag.map_or(true, |t| element.value().name().eq_ignore_ascii_case(t))
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.attr("hidden").is_some()
        || value
            .attr("style")
            .map(|style| {
                style
                    .to_ascii_lowercase()
                    .replace(' ', "")
                    .contains("display:none")
            })
            .unwrap_or(false)
}

fn link_target(element: ElementRef<'_>) -> Option<&str> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find_map(|el| el.value().attr("href"))
}

fn join_url(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
