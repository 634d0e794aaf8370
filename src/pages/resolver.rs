//! Identify the page currently shown from its URL

use super::client::ClientPage;
use super::login::LoginPage;
use crate::browser::Session;
use crate::{Error, Result};
use regex::Regex;
use std::fmt;
use tracing::debug;

/// Signed-in client, served from the app host
const CLIENT_URL: &str = r"^https?://app\.slack\.com(?:[/?#].*)?$";

/// Any other slack.com host: workspace sign-in pages
const LOGIN_URL: &str = r"^https?://(?:[a-z0-9-]+\.)*slack\.com(?:[/?#].*)?$";

/// Kind of page a URL belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    Login,
    Client,
    Unknown(String),
}

impl PageKind {
    pub fn name(&self) -> &'static str {
        match self {
            PageKind::Login => "LoginPage",
            PageKind::Client => "ClientPage",
            PageKind::Unknown(_) => "unknown page",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered URL patterns; the first match wins
#[derive(Debug, Clone)]
pub struct PageResolver {
    patterns: Vec<(Regex, PageKind)>,
}

impl PageResolver {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: vec![
                (compile(CLIENT_URL)?, PageKind::Client),
                (compile(LOGIN_URL)?, PageKind::Login),
            ],
        })
    }

    pub fn classify(&self, url: &str) -> PageKind {
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.is_match(url))
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| PageKind::Unknown(url.to_string()))
    }

    /// Build a fresh page object for the live URL
    pub async fn current_page(&self, session: &Session) -> Result<CurrentPage> {
        let url = session.current_url().await?;
        let kind = self.classify(&url);
        debug!("{} resolved to {}", url, kind);

        match kind {
            PageKind::Login => Ok(CurrentPage::Login(LoginPage::load(session).await?)),
            PageKind::Client => Ok(CurrentPage::Client(ClientPage::load(session).await?)),
            PageKind::Unknown(url) => Err(Error::unknown_page(url)),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::internal(format!("Invalid URL pattern {}: {}", pattern, e)))
}

/// Page object of the page currently shown
#[derive(Debug, Clone)]
pub enum CurrentPage {
    Login(LoginPage),
    Client(ClientPage),
}

impl CurrentPage {
    pub fn kind(&self) -> PageKind {
        match self {
            CurrentPage::Login(_) => PageKind::Login,
            CurrentPage::Client(_) => PageKind::Client,
        }
    }

    pub async fn into_login(self) -> Result<LoginPage> {
        match self {
            CurrentPage::Login(page) => Ok(page),
            other => Err(other.unexpected(PageKind::Login).await),
        }
    }

    pub async fn into_client(self) -> Result<ClientPage> {
        match self {
            CurrentPage::Client(page) => Ok(page),
            other => Err(other.unexpected(PageKind::Client).await),
        }
    }

    async fn unexpected(&self, expected: PageKind) -> Error {
        let session = match self {
            CurrentPage::Login(page) => page.session(),
            CurrentPage::Client(page) => page.session(),
        };
        Error::UnexpectedPage {
            expected: expected.name(),
            actual: self.kind().name(),
            url: session.current_url().await.unwrap_or_default(),
        }
    }
}
