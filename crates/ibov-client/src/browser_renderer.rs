use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use ibov_core::config::RenderOptions;
use ibov_core::error::{RenderFailure, RenderStage};
use ibov_core::models::RenderedPage;
use ibov_core::traits::PageRenderer;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};

/// Interval between DOM polls while waiting on a condition.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on each browser shutdown step before the process is killed.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Headless-browser renderer using Chromium via the Chrome DevTools Protocol.
///
/// Every [`PageRenderer::render`] call launches its own incognito Chromium
/// process, drives the page through the wait conditions in
/// [`RenderOptions`], and shuts the process down again before returning.
/// Nothing is shared between calls.
///
/// # Example
///
/// ```rust,no_run
/// use ibov_client::BrowserRenderer;
/// use ibov_core::config::{DEFAULT_TARGET_URL, RenderOptions};
/// use ibov_core::traits::PageRenderer;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let renderer = BrowserRenderer::new();
/// let page = renderer.render(DEFAULT_TARGET_URL, &RenderOptions::default()).await?;
/// println!("{}", &page.html[..200]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BrowserRenderer {
    chrome_bin: Option<PathBuf>,
}

impl BrowserRenderer {
    /// Uses the first Chrome/Chromium binary found on this machine.
    ///
    /// Requires a Chromium / Chrome binary reachable via `$PATH` (or the
    /// default locations checked by `chromiumoxide`).
    pub fn new() -> Self {
        Self {
            chrome_bin: find_chrome_binary(),
        }
    }

    /// Uses an explicit browser executable.
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            chrome_bin: Some(path.into()),
        }
    }

    fn config(&self, options: &RenderOptions) -> Result<BrowserConfig, RenderFailure> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .disable_default_args()
            .incognito()
            .request_timeout(options.navigation_timeout);

        if let Some(bin) = &self.chrome_bin {
            tracing::debug!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        if options.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }

        builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .build()
            .map_err(|e| RenderFailure::new(RenderStage::Unexpected, format!("Browser config error: {e}")))
    }
}

impl PageRenderer for BrowserRenderer {
    async fn render(
        &self,
        url: &str,
        options: &RenderOptions,
    ) -> Result<RenderedPage, RenderFailure> {
        self.render_session(url, options).await.result
    }
}

/// Result of one browser session and how its process ended.
struct SessionOutcome {
    result: Result<RenderedPage, RenderFailure>,
    /// `None` when no process was launched or it could not be reaped.
    exit: Option<ExitStatus>,
}

impl BrowserRenderer {
    async fn render_session(&self, url: &str, options: &RenderOptions) -> SessionOutcome {
        let launched = match self.config(options) {
            Ok(config) => BrowserSession::launch(config).await,
            Err(failure) => Err(failure),
        };
        let mut session = match launched {
            Ok(session) => session,
            Err(failure) => {
                return SessionOutcome {
                    result: Err(failure),
                    exit: None,
                };
            }
        };

        let result = drive(&session.browser, url, options).await;

        // Close on every path before the result leaves this function.
        let exit = session.close().await;
        SessionOutcome { result, exit }
    }
}

/// A running Chromium process plus the task polling its CDP connection.
///
/// `close` is the normal shutdown. If the session is dropped without it
/// (panic, cancelled future), dropping the `Browser` kills the child process
/// and `Drop` below stops the handler task.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(config: BrowserConfig) -> Result<Self, RenderFailure> {
        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            RenderFailure::new(RenderStage::Unexpected, format!("Failed to launch browser: {e}"))
        })?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser CDP handler error: {e}");
                }
            }
        });

        Ok(Self { browser, handler })
    }

    /// Shut the browser down and reap the process. Every step is bounded by
    /// [`SHUTDOWN_TIMEOUT`]; a browser that does not leave on request is
    /// killed.
    async fn close(&mut self) -> Option<ExitStatus> {
        let closed = match timeout(SHUTDOWN_TIMEOUT, self.browser.close()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::warn!("Failed to close browser cleanly: {e}");
                false
            }
            Err(_) => {
                tracing::warn!("Browser close timed out after {}s", SHUTDOWN_TIMEOUT.as_secs());
                false
            }
        };
        if !closed {
            self.kill().await;
        }

        let waited = timeout(SHUTDOWN_TIMEOUT, self.browser.wait()).await;
        let exit = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                tracing::warn!("Failed to reap browser process: {e}");
                None
            }
            Err(_) => {
                tracing::warn!(
                    "Browser still running {}s after close, killing it",
                    SHUTDOWN_TIMEOUT.as_secs()
                );
                self.kill().await;
                self.browser.try_wait().ok().flatten()
            }
        };

        self.handler.abort();
        tracing::debug!(?exit, "Browser session closed");
        exit
    }

    async fn kill(&mut self) {
        if let Some(Err(e)) = self.browser.kill().await {
            tracing::warn!("Failed to kill browser process: {e}");
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Navigate, wait for the table, show all rows, and capture the DOM.
async fn drive(
    browser: &Browser,
    url: &str,
    options: &RenderOptions,
) -> Result<RenderedPage, RenderFailure> {
    let navigation = |cause: String| RenderFailure::new(RenderStage::Navigation, cause);
    let nav_timeout = || {
        navigation(format!(
            "navigation to {url} timed out after {}s",
            options.navigation_timeout.as_secs()
        ))
    };

    // Open a blank tab first so network tracking covers the document request.
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| RenderFailure::new(RenderStage::Unexpected, format!("Failed to open tab: {e}")))?;
    let mut network = NetworkMonitor::attach(&page)
        .await
        .map_err(|cause| RenderFailure::new(RenderStage::Unexpected, cause))?;

    tracing::info!(%url, "Navigating");
    timeout(options.navigation_timeout, page.goto(url))
        .await
        .map_err(|_| nav_timeout())?
        .map_err(|e| navigation(format!("Failed to navigate to {url}: {e}")))?;

    let response = timeout(options.navigation_timeout, page.wait_for_navigation_response())
        .await
        .map_err(|_| nav_timeout())?
        .map_err(|e| navigation(format!("Failed to read response for {url}: {e}")))?;
    let status = response
        .as_ref()
        .and_then(|request| request.response.as_ref())
        .map(|response| response.status);
    check_navigation_status(status).map_err(|cause| navigation(format!("{url}: {cause}")))?;

    tracing::info!(selector = %options.table_selector, "Waiting for table");
    wait_for_element(&page, &options.table_selector, options.table_timeout)
        .await
        .map_err(|cause| RenderFailure::new(RenderStage::TableNotFound, cause))?;

    wait_for_network_idle(&mut network, options)
        .await
        .map_err(|cause| RenderFailure::new(RenderStage::Driver, cause))?;

    tracing::info!(label = %options.page_size_label, "Selecting page size");
    select_option_by_label(&page, &options.page_size_selector, &options.page_size_label)
        .await
        .map_err(|cause| RenderFailure::new(RenderStage::Driver, cause))?;

    tracing::info!("Waiting for table to reload");
    wait_for_network_idle(&mut network, options)
        .await
        .map_err(|cause| RenderFailure::new(RenderStage::Driver, cause))?;
    sleep(options.settle_delay).await;

    let html = page.content().await.map_err(|e| {
        RenderFailure::new(RenderStage::Driver, format!("Failed to read page content: {e}"))
    })?;

    if let Err(e) = page.close().await {
        tracing::debug!("Failed to close page: {e}");
    }

    Ok(RenderedPage::new(url, html))
}

/// A document response is usable only if it exists and is not a 4xx/5xx.
fn check_navigation_status(status: Option<i64>) -> Result<(), String> {
    match status {
        None => Err("no document response".to_string()),
        Some(code) if code >= 400 => Err(format!("HTTP {code}")),
        Some(_) => Ok(()),
    }
}

/// Poll for `selector` until it appears or `limit` elapses.
async fn wait_for_element(page: &Page, selector: &str, limit: Duration) -> Result<(), String> {
    timeout(limit, async {
        loop {
            if page.find_element(selector).await.is_ok() {
                return;
            }
            sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .map_err(|_| format!("'{selector}' not present after {}s", limit.as_secs()))
}

/// Request lifecycle signal derived from CDP network events.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NetworkSignal {
    Started(String),
    Settled(String),
}

/// Tracks in-flight requests by id. The page counts as idle once nothing
/// has been in flight for a full quiet window.
#[derive(Debug)]
struct IdleTracker {
    in_flight: HashSet<String>,
    /// When the in-flight set last became empty; `None` while non-empty.
    quiet_since: Option<Instant>,
}

impl IdleTracker {
    fn new(now: Instant) -> Self {
        Self {
            in_flight: HashSet::new(),
            quiet_since: Some(now),
        }
    }

    fn apply(&mut self, signal: NetworkSignal, now: Instant) {
        match signal {
            NetworkSignal::Started(id) => {
                self.in_flight.insert(id);
                self.quiet_since = None;
            }
            NetworkSignal::Settled(id) => {
                if self.in_flight.remove(&id) && self.in_flight.is_empty() {
                    self.quiet_since = Some(now);
                }
            }
        }
    }

    /// Start a fresh quiet window, so a wait never ends on quiet time that
    /// elapsed before it began.
    fn restart(&mut self, now: Instant) {
        if self.in_flight.is_empty() {
            self.quiet_since = Some(now);
        }
    }

    fn is_idle(&self, now: Instant, quiet_window: Duration) -> bool {
        self.in_flight.is_empty()
            && self
                .quiet_since
                .is_some_and(|since| now.saturating_duration_since(since) >= quiet_window)
    }

    fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Network events of one page, folded into an [`IdleTracker`].
struct NetworkMonitor {
    events: BoxStream<'static, NetworkSignal>,
    tracker: IdleTracker,
}

impl NetworkMonitor {
    async fn attach(page: &Page) -> Result<Self, String> {
        page.execute(EnableParams::default())
            .await
            .map_err(|e| format!("Failed to enable network events: {e}"))?;

        let listen_err = |e| format!("Failed to subscribe to network events: {e}");
        let started = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(listen_err)?
            .map(|e| NetworkSignal::Started(e.request_id.inner().clone()));
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(listen_err)?
            .map(|e| NetworkSignal::Settled(e.request_id.inner().clone()));
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(listen_err)?
            .map(|e| NetworkSignal::Settled(e.request_id.inner().clone()));

        Ok(Self {
            events: stream::select(started, stream::select(finished, failed)).boxed(),
            tracker: IdleTracker::new(Instant::now()),
        })
    }
}

/// Wait until no request has been in flight for `options.quiet_window`,
/// bounded by `options.idle_timeout`.
async fn wait_for_network_idle(
    network: &mut NetworkMonitor,
    options: &RenderOptions,
) -> Result<(), String> {
    let quiet_window = options.quiet_window;
    network.tracker.restart(Instant::now());

    let waited = timeout(options.idle_timeout, async {
        loop {
            if network.tracker.is_idle(Instant::now(), quiet_window) {
                return;
            }
            match timeout(POLL_INTERVAL, network.events.next()).await {
                Ok(Some(signal)) => network.tracker.apply(signal, Instant::now()),
                // Listener gone: only the outer timeout can end the wait now.
                Ok(None) => sleep(POLL_INTERVAL).await,
                Err(_) => {}
            }
        }
    })
    .await;

    waited.map_err(|_| {
        format!(
            "network not idle after {}s ({} requests in flight)",
            options.idle_timeout.as_secs(),
            network.tracker.in_flight()
        )
    })
}

/// Pick the `<option>` whose label is `label` and fire the change events the
/// page's framework listens for.
async fn select_option_by_label(page: &Page, selector: &str, label: &str) -> Result<(), String> {
    let script = select_script(selector, label)?;
    let selected = page
        .evaluate(script)
        .await
        .map_err(|e| format!("Failed to select page size: {e}"))?
        .into_value::<bool>()
        .map_err(|e| format!("Unexpected select result: {e}"))?;

    if selected {
        Ok(())
    } else {
        Err(format!("no option labelled '{label}' in '{selector}'"))
    }
}

fn select_script(selector: &str, label: &str) -> Result<String, String> {
    let selector = serde_json::to_string(selector).map_err(|e| e.to_string())?;
    let label = serde_json::to_string(label).map_err(|e| e.to_string())?;
    Ok(format!(
        r#"(() => {{
            const select = document.querySelector({selector});
            if (!select) return false;
            const option = Array.from(select.options)
                .find(o => (o.label || o.text).trim() === {label});
            if (!option) return false;
            select.value = option.value;
            select.dispatchEvent(new Event('input', {{ bubbles: true }}));
            select.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#
    ))
}

/// Tries to locate the real Chrome/Chromium binary.
///
/// On systems where Chromium is installed via **snap**, the wrapper at
/// `/snap/bin/chromium` strips unknown CLI flags, breaking headless mode.
/// We look for the real binary inside the snap first, then fall back to
/// well-known system paths.  If nothing is found we return `None` and let
/// `chromiumoxide` do its own lookup.
fn find_chrome_binary() -> Option<PathBuf> {
    let candidates: &[&str] = &[
        // Snap (Ubuntu default)
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        // Flatpak
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        // Common apt / manual installs
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}
