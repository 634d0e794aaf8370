//! Scenario steps against the Slack web client
//!
//! `UiSteps` is the per-scenario world: it owns the browser, the last
//! message sent and the attachment sink. Every step resolves the current
//! page afresh before acting on it.

use super::attachments::AttachmentSink;
use super::flags::Flags;
use super::hooks;
use crate::browser::{conditions, Browser};
use crate::config::Config;
use crate::pages::{ClientPage, LoginPage, PageKind, PageResolver};
use crate::{Error, Result};
use chrono::Local;
use tracing::info;

#[derive(Debug)]
pub struct UiSteps {
    browser: Browser,
    resolver: PageResolver,
    flags: Flags,
    attachments: AttachmentSink,
    last_message: Option<String>,
}

impl UiSteps {
    pub fn new(browser: Browser, flags: Flags) -> Result<Self> {
        Ok(Self {
            browser,
            resolver: PageResolver::new()?,
            flags,
            attachments: AttachmentSink::new(),
            last_message: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(Browser::from_config(config), Flags::from_config(config))
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn attachments(&self) -> &AttachmentSink {
        &self.attachments
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Before-scenario hook
    pub async fn start(&mut self) -> Result<()> {
        hooks::before_scenario(&mut self.browser).await
    }

    /// After-scenario hook
    pub async fn finish(&mut self) -> Result<()> {
        hooks::after_scenario(&mut self.browser, &mut self.attachments).await
    }

    // Navigation

    pub async fn open_page_from_flag(&mut self, flag: &str) -> Result<()> {
        let url = self.flags.get(flag)?;
        self.open_page(&url).await
    }

    /// Navigate to `url` unless already there, then wait until the URL is exactly `url`
    pub async fn open_page(&mut self, url: &str) -> Result<()> {
        let session = self.browser.session()?;
        if !session.current_url().await?.eq_ignore_ascii_case(url) {
            session.navigate(url).await?;
        }

        let s = &session;
        session
            .wait()
            .with_message(format!("URL did not become {}", url))
            .until(move || conditions::url_to_be(s, url))
            .await?;
        self.take_screenshot().await;
        Ok(())
    }

    // Sign in

    pub async fn check_page_header(&mut self, header: &str) -> Result<()> {
        let actual = self.login_page().await?.header().await?;
        expect_eq("Incorrect header on the page", &actual, header)?;
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn fill_in_from_flag(&mut self, field: &str, flag: &str) -> Result<()> {
        let value = self.flags.get(flag)?;
        self.login_page().await?.fill(field, &value).await
    }

    pub async fn click_sign_in(&mut self) -> Result<()> {
        self.login_page().await?.click_sign_in().await
    }

    pub async fn sign_in_from_flag(&mut self, flag: &str) -> Result<()> {
        let url = self.flags.get(flag)?;
        self.sign_in(&url).await
    }

    /// Open the workspace URL, submit the credentials flags and wait for the client
    pub async fn sign_in(&mut self, url: &str) -> Result<()> {
        self.log(format!("Sign in workspace at {}", url));
        self.open_page(url).await?;
        self.fill_in_from_flag("Email address", "user_email").await?;
        self.fill_in_from_flag("Password", "user_pwd").await?;
        self.click_sign_in().await?;

        let session = self.browser.session()?;
        let (s, resolver) = (&session, &self.resolver);
        session
            .wait()
            .with_message_fn(move || async move {
                format!(
                    "Client page is not found, current URL: {}",
                    s.current_url().await.unwrap_or_default()
                )
            })
            .until(move || async move {
                let url = s.current_url().await?;
                Ok(resolver.classify(&url) == PageKind::Client)
            })
            .await?;
        self.take_screenshot().await;
        Ok(())
    }

    // Client

    pub async fn check_selected_workspace(&mut self, workspace: &str) -> Result<()> {
        let actual = self.client_page().await?.selected_workspace().await?;
        expect_eq("Incorrect workspace selected", &actual, workspace)?;
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn check_selected_channel(&mut self, channel: &str) -> Result<()> {
        let actual = self.client_page().await?.selected_channel().await?;
        expect_eq("Incorrect channel selected", &actual, channel)?;
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn select_sidebar_item(&mut self, name: &str) -> Result<()> {
        self.client_page().await?.select_sidebar_item(name).await?;
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn send_local_time(&mut self) -> Result<()> {
        let message = format!(
            "My local time is {}",
            Local::now().format("%a %b %d %H:%M:%S %Z %Y")
        );
        self.send_message(&message).await
    }

    pub async fn send_message(&mut self, message: &str) -> Result<()> {
        self.log(format!("Sending the message to the current channel: {}", message));
        self.client_page().await?.send_message(message).await?;
        self.last_message = Some(message.to_string());
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn save_last_message(&mut self) -> Result<()> {
        let message = self.require_last_message()?;
        self.save_message(&message).await
    }

    pub async fn save_message(&mut self, message: &str) -> Result<()> {
        self.log(format!("Saving (starring) the message: {}", message));
        self.client_page().await?.save_message(message).await?;
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn search_for(&mut self, text: &str) -> Result<()> {
        self.client_page().await?.search_for(text).await?;
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn last_message_in_search_results(&mut self) -> Result<()> {
        let message = self.require_last_message()?;
        self.message_in_search_results(&message).await
    }

    pub async fn message_in_search_results(&mut self, message: &str) -> Result<()> {
        self.log(format!(
            "Waiting for the message is displayed in the search results: {}",
            message
        ));
        self.client_page()
            .await?
            .wait_for_message_in_search_results(message)
            .await?;
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn close_top_search_popup(&mut self) -> Result<()> {
        self.client_page().await?.close_top_search_popup().await?;
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn saved_items_pane_displayed(&mut self) -> Result<()> {
        self.client_page().await?.wait_for_saved_items_pane().await?;
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn last_message_in_saved_items(&mut self) -> Result<()> {
        let message = self.require_last_message()?;
        self.message_in_saved_items(&message).await
    }

    pub async fn message_in_saved_items(&mut self, message: &str) -> Result<()> {
        self.log(format!(
            "Verify that the message is displayed in the Saved items: {}",
            message
        ));
        let saved = self.client_page().await?.saved_messages().await?;
        if !saved.iter().any(|m| m == message) {
            return Err(Error::assertion(format!(
                "Message [{}] not found among the Saved items: {:?}",
                message, saved
            )));
        }
        self.take_screenshot().await;
        Ok(())
    }

    pub async fn remove_last_message_from_saved_items(&mut self) -> Result<()> {
        let message = self.require_last_message()?;
        self.remove_message_from_saved_items(&message).await
    }

    pub async fn remove_message_from_saved_items(&mut self, message: &str) -> Result<()> {
        self.log(format!("Removing the message from Saved items: {}", message));
        self.client_page()
            .await?
            .remove_message_from_saved_items(message)
            .await?;
        self.take_screenshot().await;
        Ok(())
    }

    async fn login_page(&self) -> Result<LoginPage> {
        let session = self.browser.session()?;
        self.resolver.current_page(&session).await?.into_login().await
    }

    async fn client_page(&self) -> Result<ClientPage> {
        let session = self.browser.session()?;
        self.resolver.current_page(&session).await?.into_client().await
    }

    fn require_last_message(&self) -> Result<String> {
        self.last_message
            .clone()
            .ok_or_else(|| Error::assertion("No message has been sent in this scenario"))
    }

    fn log(&mut self, details: String) {
        info!("{}", details);
        self.attachments.attach_details(details);
    }

    async fn take_screenshot(&mut self) {
        if let Some(png) = self.browser.screenshot().await {
            self.attachments.attach_screenshot(png);
        }
    }
}

fn expect_eq(context: &str, actual: &str, expected: &str) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::assertion(format!(
            "{}: expected [{}] but found [{}]",
            context, expected, actual
        )))
    }
}
