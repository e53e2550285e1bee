//! Chromium page controller over CDP.
//!
//! Launches a local Chrome (or connects to a remote one) with chromiumoxide
//! and exposes tabs as browsing contexts. Element handles are indices into a
//! per-controller arena; closing a tab invalidates the handles found in it.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    BrowserEngineConfig, BrowserError, BrowserResult, ContextId, Locator, PageController, Scope,
};

/// Attribute used to hand element-scoped path matches back to CDP.
const REF_ATTR: &str = "data-tourpulse-ref";

const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
"#;

const VISIBILITY_FN: &str =
    "function() { return !!(this.offsetWidth || this.offsetHeight || this.getClientRects().length); }";

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Handle to an element found by [`ChromiumController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChromiumElement(usize);

/// Element storage addressed by ever-increasing handle numbers.
///
/// Released and closed-context slots are never reused, so an old handle
/// cannot alias a newer element.
struct ElementArena<T> {
    first: usize,
    slots: Vec<Option<(ContextId, T)>>,
}

impl<T> ElementArena<T> {
    fn new() -> Self {
        Self {
            first: 0,
            slots: Vec::new(),
        }
    }

    fn insert(&mut self, context: ContextId, item: T) -> usize {
        self.slots.push(Some((context, item)));
        self.first + self.slots.len() - 1
    }

    fn get(&self, handle: usize) -> Option<&T> {
        let index = handle.checked_sub(self.first)?;
        match self.slots.get(index) {
            Some(Some((_, item))) => Some(item),
            _ => None,
        }
    }

    /// Invalidate the handles found in `context`.
    fn evict(&mut self, context: ContextId) {
        for slot in self.slots.iter_mut() {
            if matches!(slot, Some((owner, _)) if *owner == context) {
                *slot = None;
            }
        }
    }

    /// Invalidate every handle and free the storage.
    fn clear(&mut self) {
        self.first += self.slots.len();
        self.slots.clear();
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// [`PageController`] driving Chromium tabs.
pub struct ChromiumController {
    config: BrowserEngineConfig,
    browser: Browser,
    handler: JoinHandle<()>,
    pages: HashMap<ContextId, Page>,
    current: Option<ContextId>,
    next_context: u64,
    elements: ElementArena<Element>,
    next_token: u64,
}

impl ChromiumController {
    /// Executable names looked up on `PATH`.
    const CHROME_NAMES: &'static [&'static str] = &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ];

    /// App bundles outside `PATH`.
    const CHROME_BUNDLES: &'static [&'static str] = &[
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    fn find_chrome() -> BrowserResult<PathBuf> {
        let found = find_executable(
            std::env::var_os("PATH"),
            Self::CHROME_NAMES,
            Self::CHROME_BUNDLES,
        )
        .ok_or_else(|| {
            BrowserError::Launch(format!(
                "no Chrome/Chromium executable found (looked for {} on PATH); \
                 install one or set BROWSER_URL to a running browser",
                Self::CHROME_NAMES.join(", ")
            ))
        })?;
        info!("Using Chrome at {}", found.display());
        Ok(found)
    }

    /// Launch a browser, or connect to `remote_url` when configured.
    pub async fn launch(config: BrowserEngineConfig) -> BrowserResult<Self> {
        let timeout = Duration::from_secs(config.timeout);

        let (browser, mut handler) = if let Some(ref remote_url) = config.remote_url {
            info!("Connecting to remote browser at {}", remote_url);
            let handler_config = HandlerConfig {
                request_timeout: timeout,
                ..Default::default()
            };
            Browser::connect_with_config(remote_url.clone(), handler_config)
                .await
                .map_err(|e| BrowserError::Launch(e.to_string()))?
        } else {
            info!("Launching browser (headless={})", config.headless);
            let chrome_path = Self::find_chrome()?;
            let (width, height) = config.window_size;

            let mut builder = BrowserConfig::builder()
                .chrome_executable(chrome_path)
                .request_timeout(timeout)
                .window_size(width, height);

            // with_head means NOT headless
            if !config.headless {
                builder = builder.with_head();
            }

            if let Some(ref proxy) = config.proxy {
                builder = builder.arg(format!("--proxy-server={}", proxy));
            }

            builder = builder
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .arg("--disable-extensions")
                .arg("--no-sandbox")
                .arg("--no-first-run")
                .arg("--no-default-browser-check");

            for arg in &config.chrome_args {
                builder = builder.arg(arg.clone());
            }

            let browser_config = builder.build().map_err(BrowserError::Launch)?;
            Browser::launch(browser_config)
                .await
                .map_err(|e| BrowserError::Launch(e.to_string()))?
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            config,
            browser,
            handler,
            pages: HashMap::new(),
            current: None,
            next_context: 1,
            elements: ElementArena::new(),
            next_token: 1,
        })
    }

    /// Close every tab and shut the browser down.
    pub async fn close(mut self) {
        for (_, page) in self.pages.drain() {
            let _ = page.close().await;
        }
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }

    async fn load(&self, page: &Page, url: &str) -> BrowserResult<()> {
        page.execute(SetUserAgentOverrideParams::new(
            self.config.user_agent.clone(),
        ))
        .await?;

        info!("Navigating to {}", url);
        page.goto(url)
            .await
            .map_err(|e| BrowserError::navigation(url, e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| BrowserError::navigation(url, e))?;

        if let Err(e) = page.evaluate(STEALTH_SCRIPT).await {
            debug!("Stealth script injection skipped: {}", e);
        }
        Ok(())
    }

    fn current_page(&self) -> BrowserResult<(ContextId, &Page)> {
        let id = self.current.ok_or(BrowserError::NoActiveContext)?;
        let page = self.pages.get(&id).ok_or(BrowserError::UnknownContext(id))?;
        Ok((id, page))
    }

    fn element(&self, handle: &ChromiumElement) -> BrowserResult<&Element> {
        self.elements.get(handle.0).ok_or(BrowserError::StaleElement)
    }

    fn register(&mut self, context: ContextId, found: Vec<Element>) -> Vec<ChromiumElement> {
        found
            .into_iter()
            .map(|element| ChromiumElement(self.elements.insert(context, element)))
            .collect()
    }

    /// Evaluate a path expression below `element` by tagging the matches in
    /// the page and querying the tag back through CDP.
    async fn scoped_path(
        &self,
        page: &Page,
        element: &Element,
        expr: &str,
        token: u64,
    ) -> BrowserResult<Vec<Element>> {
        let quoted =
            serde_json::to_string(expr).map_err(|e| BrowserError::Protocol(e.to_string()))?;
        let script = format!(
            "function() {{ \
                const r = document.evaluate({quoted}, this, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                for (let i = 0; i < r.snapshotLength; i++) {{ \
                    const node = r.snapshotItem(i); \
                    if (node.nodeType === 1) {{ node.setAttribute('{REF_ATTR}', '{token}'); }} \
                }} \
                return r.snapshotLength; \
            }}"
        );
        element.call_js_fn(script, false).await?;
        Ok(page
            .find_elements(format!("[{}=\"{}\"]", REF_ATTR, token))
            .await?)
    }
}

#[async_trait(?Send)]
impl PageController for ChromiumController {
    type Element = ChromiumElement;

    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        match self.current {
            Some(id) => {
                let page = self.pages.get(&id).ok_or(BrowserError::UnknownContext(id))?;
                self.load(page, url).await
            }
            None => {
                let id = self.open_context(url).await?;
                self.switch_to(id).await
            }
        }
    }

    async fn find_all(
        &mut self,
        scope: Scope<'_, ChromiumElement>,
        locator: &Locator,
    ) -> BrowserResult<Vec<ChromiumElement>> {
        let token = self.next_token;
        self.next_token += 1;

        let (context, page) = self.current_page()?;
        let found = match (scope, locator) {
            (Scope::Page, Locator::Path(expr)) => page.find_xpaths(expr.as_str()).await?,
            (Scope::Element(handle), Locator::Path(expr)) => {
                let element = self.element(handle)?;
                self.scoped_path(page, element, expr, token).await?
            }
            (scope, locator) => {
                let css = locator
                    .to_css()
                    .ok_or_else(|| BrowserError::UnsupportedLocator(locator.to_string()))?;
                match scope {
                    Scope::Page => page.find_elements(css).await?,
                    Scope::Element(handle) => self.element(handle)?.find_elements(css).await?,
                }
            }
        };

        Ok(self.register(context, found))
    }

    async fn text(&mut self, element: &ChromiumElement) -> BrowserResult<String> {
        Ok(self
            .element(element)?
            .inner_text()
            .await?
            .unwrap_or_default())
    }

    async fn attribute(
        &mut self,
        element: &ChromiumElement,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        Ok(self.element(element)?.attribute(name).await?)
    }

    async fn is_displayed(&mut self, element: &ChromiumElement) -> BrowserResult<bool> {
        let returns = self
            .element(element)?
            .call_js_fn(VISIBILITY_FN, false)
            .await?;
        Ok(returns
            .result
            .value
            .as_ref()
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn click(&mut self, element: &ChromiumElement) -> BrowserResult<()> {
        self.element(element)?.click().await?;
        Ok(())
    }

    fn current_context(&self) -> Option<ContextId> {
        self.current
    }

    async fn open_context(&mut self, url: &str) -> BrowserResult<ContextId> {
        let page = self.browser.new_page("about:blank").await?;
        if let Err(e) = self.load(&page, url).await {
            let _ = page.close().await;
            return Err(e);
        }

        let id = ContextId(self.next_context);
        self.next_context += 1;
        self.pages.insert(id, page);
        debug!("Opened {} for {}", id, url);
        Ok(id)
    }

    async fn switch_to(&mut self, context: ContextId) -> BrowserResult<()> {
        let page = self
            .pages
            .get(&context)
            .ok_or(BrowserError::UnknownContext(context))?;
        page.bring_to_front().await?;
        self.current = Some(context);
        Ok(())
    }

    async fn close_context(&mut self, context: ContextId) -> BrowserResult<()> {
        let page = self
            .pages
            .remove(&context)
            .ok_or(BrowserError::UnknownContext(context))?;
        if self.current == Some(context) {
            self.current = None;
        }
        self.elements.evict(context);
        page.close().await?;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        let (_, page) = self.current_page()?;
        page.evaluate(SCROLL_TO_BOTTOM).await?;
        Ok(())
    }

    async fn page_text(&mut self) -> BrowserResult<String> {
        let (_, page) = self.current_page()?;
        Ok(page.content().await?)
    }

    fn release_handles(&mut self) {
        debug!("Releasing {} element handle(s)", self.elements.len());
        self.elements.clear();
    }
}

/// First of `names` found in a `PATH`-style list, then the first existing bundle path.
fn find_executable(
    path_var: Option<OsString>,
    names: &[&str],
    bundles: &[&str],
) -> Option<PathBuf> {
    let dirs: Vec<PathBuf> = path_var
        .map(|paths| std::env::split_paths(&paths).collect())
        .unwrap_or_default();
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .chain(bundles.iter().map(|bundle| PathBuf::from(*bundle)))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_handles_survive_until_released() {
        let mut arena = ElementArena::new();
        let listing = ContextId(1);
        let a = arena.insert(listing, "row");
        let b = arena.insert(listing, "name");
        assert_eq!(arena.get(a), Some(&"row"));
        assert_eq!(arena.len(), 2);

        arena.clear();
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), None);
        assert_eq!(arena.len(), 0);

        // New handles never reuse released numbers.
        let c = arena.insert(listing, "next row");
        assert!(c > b);
        assert_eq!(arena.get(c), Some(&"next row"));
    }

    #[test]
    fn closing_a_context_evicts_only_its_handles() {
        let mut arena = ElementArena::new();
        let listing = arena.insert(ContextId(1), "row");
        let review = arena.insert(ContextId(2), "review");

        arena.evict(ContextId(2));
        assert_eq!(arena.get(listing), Some(&"row"));
        assert_eq!(arena.get(review), None);
    }

    #[test]
    fn executables_are_found_on_path_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("chromium"), b"").unwrap();
        std::fs::write(first.path().join("chromium-browser"), b"").unwrap();
        let path_var = std::env::join_paths([first.path(), second.path()]).unwrap();

        let found = find_executable(
            Some(path_var),
            &["google-chrome", "chromium", "chromium-browser"],
            &[],
        );
        assert_eq!(found, Some(first.path().join("chromium-browser")));
    }

    #[test]
    fn missing_executable_falls_back_to_bundles() {
        let empty = tempfile::tempdir().unwrap();
        let bundle = empty.path().join("Chromium");
        std::fs::write(&bundle, b"").unwrap();
        let path_var = std::env::join_paths([empty.path()]).unwrap();

        let bundle_str = bundle.to_str().unwrap();
        assert_eq!(
            find_executable(Some(path_var.clone()), &["chromium"], &[bundle_str]),
            Some(bundle.clone())
        );
        assert_eq!(find_executable(Some(path_var), &["chromium"], &[]), None);
        assert_eq!(find_executable(None, &["chromium"], &[]), None);
    }
}
