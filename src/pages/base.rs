//! Behaviour shared by every page object

use crate::browser::{conditions, Element, Elements, Session};
use crate::driver::Locator;
use crate::{Error, Result};
use tracing::debug;

/// A loaded page: the document finished loading when this was built
#[derive(Debug, Clone)]
pub struct PageBase {
    session: Session,
}

impl PageBase {
    /// Wait for the document to finish loading
    pub async fn load(session: &Session) -> Result<Self> {
        wait_until_loaded(session).await?;
        Ok(Self {
            session: session.clone(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn element(&self, locator: Locator) -> Element {
        self.session.element(locator)
    }

    pub fn elements(&self, locator: Locator) -> Elements {
        self.session.elements(locator)
    }
}

/// Poll `document.readyState` until it is "complete".
///
/// Fails with `PageLoadTimeout` carrying the URL at the moment of the timeout.
pub async fn wait_until_loaded(session: &Session) -> Result<()> {
    let s = session;
    match session
        .wait()
        .until(move || conditions::document_ready(s))
        .await
    {
        Ok(()) => {
            debug!("Document is ready");
            Ok(())
        }
        Err(Error::WaitTimeout { .. }) => {
            let url = session.current_url().await.unwrap_or_default();
            Err(Error::page_load_timeout(url))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::WaitSettings;
    use crate::driver::MockDriver;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn session(driver: &MockDriver) -> Session {
        Session::new(Arc::new(driver.clone()), WaitSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_document_needs_one_check() {
        let driver = MockDriver::new();
        let start = Instant::now();

        PageBase::load(&session(&driver)).await.unwrap();

        assert_eq!(driver.ready_state_checks(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_through_loading_states() {
        let driver = MockDriver::new();
        driver.dom().set_ready_states(["loading", "interactive", "complete"]);

        PageBase::load(&session(&driver)).await.unwrap();

        assert_eq!(driver.ready_state_checks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_document_reports_url() {
        let driver = MockDriver::new();
        driver.dom().set_url("https://acme.slack.com/");
        driver.dom().set_ready_states(["loading"]);

        let err = PageBase::load(&session(&driver)).await.unwrap_err();

        match err {
            Error::PageLoadTimeout { url } => assert_eq!(url, "https://acme.slack.com/"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_failures_are_retried_until_timeout() {
        let driver = MockDriver::new();
        driver.dom().set_fail_scripts(true);

        let err = PageBase::load(&session(&driver)).await.unwrap_err();
        assert!(matches!(err, Error::PageLoadTimeout { .. }));
    }
}
