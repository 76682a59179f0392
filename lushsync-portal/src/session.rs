//! The WebDriver session against the portal.

use std::time::{Duration, Instant};

use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use lushsync_core::SyncError;
use serde::Deserialize;
use tokio::time::sleep;

// How the portal's login and schedule views are located in the rendered DOM.
// Scraped ad hoc; any markup change on the portal side breaks these.
const LOGIN_CONTAINER: Locator<'static> = Locator::Id("login-inputs-container");
const USERNAME_INPUT: Locator<'static> =
    Locator::Css(r#"#login-inputs-container input[type="text"]"#);
const PASSWORD_INPUT: Locator<'static> =
    Locator::Css(r#"#login-inputs-container input[type="password"]"#);
const LOGIN_BUTTON: Locator<'static> = Locator::Css("button");
const LOGIN_ERROR_DISMISS: Locator<'static> = Locator::Css("#login-error-dialog button");
const SCHEDULE_TAB: Locator<'static> = Locator::Css(r#"[data-bind="click: ScheduleClicked"]"#);
const SCHEDULE_WEEKS: Locator<'static> = Locator::Css(r#"[data-bind="foreach: ScheduleWeeks"]"#);
const NEXT_MONTH: Locator<'static> = Locator::Css(r#"[data-bind="click: NextMonthClicked"]"#);

/// Wait budget for a single element to show up.
const ELEMENT_WAIT: Duration = Duration::from_secs(10);
/// How long one login attempt watches for the schedule tab before retrying.
const ATTEMPT_WAIT: Duration = Duration::from_secs(3);
/// Pause between login attempts.
const RETRY_PAUSE: Duration = Duration::from_millis(500);
/// Pause after a month navigation so the view can re-render.
const RENDER_PAUSE: Duration = Duration::from_millis(750);

/// Portal section of the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Login page URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Address of a running WebDriver endpoint (chromedriver, geckodriver).
    #[serde(default = "default_webdriver")]
    pub webdriver: String,

    /// Budget for the whole login phase, in seconds.
    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,
}

fn default_url() -> String {
    "https://lush.storeforce.net".to_string()
}

fn default_webdriver() -> String {
    "http://localhost:9515".to_string()
}

fn default_login_timeout() -> u64 {
    20
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            webdriver: default_webdriver(),
            login_timeout_secs: default_login_timeout(),
        }
    }
}

/// An open browser session on the portal.
///
/// Exposes exactly two operations beyond connect/close: [`authenticate`] and
/// [`fetch_month_view`]. Month navigation is forward-only, the way the
/// portal's own next-month control works.
///
/// [`authenticate`]: PortalSession::authenticate
/// [`fetch_month_view`]: PortalSession::fetch_month_view
pub struct PortalSession {
    client: Client,
    login_timeout: Duration,
    schedule_open: bool,
    month_offset: u32,
}

impl PortalSession {
    /// Connect to the WebDriver endpoint and open the portal's login page.
    pub async fn connect(cfg: &PortalConfig) -> Result<Self, SyncError> {
        let client = ClientBuilder::native()
            .connect(&cfg.webdriver)
            .await
            .map_err(|e| {
                SyncError::Portal(format!(
                    "failed to reach WebDriver at {}: {}",
                    cfg.webdriver, e
                ))
            })?;

        client.goto(&cfg.url).await.map_err(portal_err)?;

        Ok(Self {
            client,
            login_timeout: Duration::from_secs(cfg.login_timeout_secs),
            schedule_open: false,
            month_offset: 0,
        })
    }

    /// Log in, retrying until the login timeout elapses.
    ///
    /// Each attempt types both credentials, verifies the inputs actually
    /// took, submits, and then watches for the schedule tab. A visible error
    /// dialog is dismissed and the fields cleared before the next attempt.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), SyncError> {
        self.wait_for(LOGIN_CONTAINER, ELEMENT_WAIT)
            .await
            .ok_or_else(|| SyncError::Portal("login form never appeared".to_string()))?;

        let deadline = Instant::now() + self.login_timeout;

        loop {
            // A slow login may only finish rendering between attempts.
            if self.client.find(SCHEDULE_TAB).await.is_ok() {
                return Ok(());
            }

            // The form elements go stale once the page navigates, so look
            // them up fresh on every attempt.
            let user_box = self.require(USERNAME_INPUT).await?;
            let pass_box = self.require(PASSWORD_INPUT).await?;
            let login_btn = self.require(LOGIN_BUTTON).await?;

            user_box.send_keys(username).await.map_err(portal_err)?;
            pass_box.send_keys(password).await.map_err(portal_err)?;

            // The login page's script sometimes swallows keystrokes; only
            // submit once both fields actually hold the credentials.
            if field_value(&user_box).await == username
                && field_value(&pass_box).await == password
            {
                login_btn.click().await.map_err(portal_err)?;

                if self.wait_for(SCHEDULE_TAB, ATTEMPT_WAIT).await.is_some() {
                    return Ok(());
                }
            }

            // Failed attempt: dismiss the error dialog if one came up and
            // clear both fields for the next try.
            if let Ok(dismiss) = self.client.find(LOGIN_ERROR_DISMISS).await {
                let _ = dismiss.click().await;
            }
            let _ = user_box.clear().await;
            let _ = pass_box.clear().await;

            if Instant::now() >= deadline {
                return Err(SyncError::Login(format!(
                    "gave up after {}s without reaching the schedule as {}",
                    self.login_timeout.as_secs(),
                    username
                )));
            }

            sleep(RETRY_PAUSE).await;
        }
    }

    /// Navigate to the given month (0 = current, 1 = next, ...) and return
    /// the page's rendered markup.
    pub async fn fetch_month_view(&mut self, month_offset: u32) -> Result<String, SyncError> {
        if !self.schedule_open {
            let tab = self.require(SCHEDULE_TAB).await?;
            tab.click().await.map_err(portal_err)?;
            self.require(SCHEDULE_WEEKS).await?;
            self.schedule_open = true;
        }

        if month_offset < self.month_offset {
            return Err(SyncError::Portal(format!(
                "cannot navigate back from month offset {} to {}",
                self.month_offset, month_offset
            )));
        }

        while self.month_offset < month_offset {
            let next = self.require(NEXT_MONTH).await?;
            next.click().await.map_err(portal_err)?;
            self.month_offset += 1;

            // Let the view re-render before looking for the week rows again.
            sleep(RENDER_PAUSE).await;
            self.require(SCHEDULE_WEEKS).await?;
        }

        self.client.source().await.map_err(portal_err)
    }

    /// End the browser session. Failing to close is reported, not fatal.
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            eprintln!("Note: failed to close the browser session: {}", e);
        }
    }

    async fn wait_for(&self, locator: Locator<'static>, timeout: Duration) -> Option<Element> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(locator)
            .await
            .ok()
    }

    async fn require(&self, locator: Locator<'static>) -> Result<Element, SyncError> {
        self.wait_for(locator, ELEMENT_WAIT)
            .await
            .ok_or_else(|| SyncError::Portal(format!("element not found: {:?}", locator)))
    }
}

async fn field_value(element: &Element) -> String {
    element
        .prop("value")
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

fn portal_err(e: CmdError) -> SyncError {
    SyncError::Portal(e.to_string())
}
