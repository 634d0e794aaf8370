//! Signed-in Slack client: sidebar, composer, saved items and search

use super::base::PageBase;
use crate::browser::{conditions, Element, Elements, Session};
use crate::driver::Key;
use crate::Result;
use std::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Text a message container shows once the message is saved
pub const SAVED_MARKER: &str = "Added to your saved items";

/// Locators of the client UI
pub mod locators {
    use crate::driver::{xpath_literal, Locator};

    /// Sidebar entry whose text is exactly `name`
    pub fn sidebar_item(name: &str) -> Locator {
        Locator::xpath(format!(
            "//*[contains(@data-qa, 'virtual-list-item')][.={}]",
            xpath_literal(name)
        ))
    }

    /// Message container in the chat whose text contains `message`
    pub fn message_container(message: &str) -> Locator {
        Locator::xpath(format!(
            ".//*[@data-qa='message_container'][contains(., {})]",
            xpath_literal(message)
        ))
    }

    /// Search result holding an element whose text is exactly `message`
    pub fn search_result(message: &str) -> Locator {
        Locator::xpath(format!(
            "//*[@class='c-focus_manage_list__item'][.//*[.={}]]",
            xpath_literal(message)
        ))
    }

    pub fn selected_channel() -> Locator {
        Locator::css("[data-qa=virtual-list-item][aria-selected=true]")
    }

    pub fn workspace_trigger() -> Locator {
        Locator::css("[data-qa=team-menu-trigger]")
    }

    pub fn message_input() -> Locator {
        Locator::css("[aria-label^=Message]")
    }

    pub fn save_message_button() -> Locator {
        Locator::css("button[data-qa=save_message][aria-label=Save]")
    }

    pub fn remove_from_saved_button() -> Locator {
        Locator::css("button[data-qa=save_message][aria-label='Remove from saved items']")
    }

    pub fn top_search_button() -> Locator {
        Locator::css("[data-qa=top_nav_search]")
    }

    pub fn top_search_input() -> Locator {
        Locator::css("[data-qa=focusable_search_input] .ql-editor")
    }

    pub fn close_top_search_button() -> Locator {
        Locator::css("[data-qa=search_input_close]")
    }

    pub fn saved_items_pane() -> Locator {
        Locator::css("[data-qa=saved_flexpane]")
    }

    pub fn saved_messages() -> Locator {
        Locator::css("[aria-label=Saved] .p-rich_text_section")
    }
}

#[derive(Debug, Clone)]
pub struct ClientPage {
    base: PageBase,
    selected_channel: Element,
    workspace_trigger: Element,
    message_input: Element,
    save_message_button: Element,
    remove_from_saved_button: Element,
    top_search_button: Element,
    top_search_input: Element,
    close_top_search_button: Element,
    saved_items_pane: Element,
    saved_messages: Elements,
}

impl ClientPage {
    pub async fn load(session: &Session) -> Result<Self> {
        let base = PageBase::load(session).await?;
        Ok(Self {
            selected_channel: base.element(locators::selected_channel()),
            workspace_trigger: base.element(locators::workspace_trigger()),
            message_input: base.element(locators::message_input()),
            save_message_button: base.element(locators::save_message_button()),
            remove_from_saved_button: base.element(locators::remove_from_saved_button()),
            top_search_button: base.element(locators::top_search_button()),
            top_search_input: base.element(locators::top_search_input()),
            close_top_search_button: base.element(locators::close_top_search_button()),
            saved_items_pane: base.element(locators::saved_items_pane()),
            saved_messages: base.elements(locators::saved_messages()),
            base,
        })
    }

    pub fn session(&self) -> &Session {
        self.base.session()
    }

    /// Click the sidebar entry called exactly `name`
    #[instrument(skip(self))]
    pub async fn select_sidebar_item(&self, name: &str) -> Result<()> {
        let item = self.base.element(locators::sidebar_item(name));
        let el = &item;
        self.session()
            .wait()
            .until_some(move || conditions::clickable(el))
            .await?
            .click()
            .await
    }

    pub async fn selected_workspace(&self) -> Result<String> {
        let el = &self.workspace_trigger;
        self.session()
            .wait()
            .until_some(move || conditions::clickable(el))
            .await?
            .text()
            .await
    }

    pub async fn selected_channel(&self) -> Result<String> {
        self.selected_channel.text().await
    }

    /// Post `message` to the current channel and wait until it shows up
    #[instrument(skip(self))]
    pub async fn send_message(&self, message: &str) -> Result<()> {
        self.message_input.click().await?;
        self.message_input.clear().await?;
        self.message_input.send_keys(message, Key::Enter).await?;
        self.wait_for_message(message).await?;
        info!("Message sent");
        Ok(())
    }

    /// Save `message` through its hover menu
    #[instrument(skip(self))]
    pub async fn save_message(&self, message: &str) -> Result<()> {
        self.open_message_menu(message, &self.save_message_button).await?;
        self.wait_for_saved_marker(message, true)
            .await
    }

    /// Undo `save_message`
    #[instrument(skip(self))]
    pub async fn remove_message_from_saved_items(&self, message: &str) -> Result<()> {
        self.open_message_menu(message, &self.remove_from_saved_button)
            .await?;
        self.wait_for_saved_marker(message, false).await
    }

    /// Submit `text` in the top search bar
    #[instrument(skip(self))]
    pub async fn search_for(&self, text: &str) -> Result<()> {
        self.top_search_button.click().await?;
        let el = &self.top_search_input;
        self.session()
            .wait()
            .until_some(move || conditions::clickable(el))
            .await?;
        self.top_search_input.click().await?;
        self.top_search_input.clear().await?;
        self.top_search_input.send_keys(text, Key::Enter).await
    }

    /// Wait on the search budget until `message` is among the results.
    ///
    /// Search indexing lags behind posting, so failed polls re-submit the
    /// query, at most once per resubmit interval.
    #[instrument(skip(self))]
    pub async fn wait_for_message_in_search_results(&self, message: &str) -> Result<()> {
        let waits = *self.session().waits();
        let results = self.base.elements(locators::search_result(message));
        let last_submit: Mutex<Option<Instant>> = Mutex::new(None);

        let (results, input, last_submit) = (&results, &self.top_search_input, &last_submit);
        self.session()
            .wait_with(waits.search)
            .with_message(format!(
                "The message has not been found in search results: {}",
                message
            ))
            .until(move || async move {
                if results.count().await? > 0 {
                    return Ok(true);
                }
                let due = {
                    let mut last = last_submit.lock().unwrap_or_else(|p| p.into_inner());
                    let due = last.map_or(true, |at| at.elapsed() >= waits.search_resubmit_interval);
                    if due {
                        *last = Some(Instant::now());
                    }
                    due
                };
                if due {
                    debug!("Re-submitting search query");
                    input.press(Key::Enter).await?;
                }
                Ok(false)
            })
            .await
    }

    pub async fn close_top_search_popup(&self) -> Result<()> {
        self.close_top_search_button.click().await
    }

    pub async fn wait_for_saved_items_pane(&self) -> Result<()> {
        let el = &self.saved_items_pane;
        self.session()
            .wait()
            .until_some(move || conditions::visible(el))
            .await?;
        Ok(())
    }

    /// Texts of the saved items, in display order, once the list is non-empty
    pub async fn saved_messages(&self) -> Result<Vec<String>> {
        let items = &self.saved_messages;
        let found = self
            .session()
            .wait()
            .with_message("Saved items list is empty")
            .until_some(move || conditions::any_present(items))
            .await?;

        let mut texts = Vec::with_capacity(found.len());
        for item in found {
            texts.push(item.text().await?);
        }
        Ok(texts)
    }

    async fn wait_for_message(&self, message: &str) -> Result<Element> {
        let container = self.base.element(locators::message_container(message));
        let el = &container;
        self.session()
            .wait()
            .with_message(format!("Message is not displayed: {}", message))
            .until_some(move || conditions::visible(el))
            .await
    }

    /// Hover the message, then click `button` from its menu once clickable
    async fn open_message_menu(&self, message: &str, button: &Element) -> Result<()> {
        self.wait_for_message(message).await?.hover().await?;
        self.session()
            .wait()
            .until_some(move || conditions::clickable(button))
            .await?
            .click()
            .await
    }

    async fn wait_for_saved_marker(&self, message: &str, saved: bool) -> Result<()> {
        let failure = if saved {
            format!("Message has not been saved: {}", message)
        } else {
            format!("Message has not been removed from Saved items: {}", message)
        };
        let container = self.base.element(locators::message_container(message));
        let el = &container;
        self.session()
            .wait()
            .with_message(failure)
            .until(move || async move {
                let state = el.state().await?;
                Ok(state.visible && state.text.contains(SAVED_MARKER) == saved)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{WaitConfig, WaitSettings};
    use crate::driver::{Locator, MockAction, MockDriver, MockElement, MockEvent};
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn client() -> MockDriver {
        let driver = MockDriver::new();
        {
            let mut dom = driver.dom();
            dom.set_url("https://app.slack.com/client/T000/C000");
            dom.add_element(locators::workspace_trigger(), MockElement::new(" Acme "));
            dom.add_element(locators::message_input(), MockElement::new(""));
            dom.add_element(locators::top_search_button(), MockElement::new("Search"));
            dom.add_element(locators::top_search_input(), MockElement::new(""));
            dom.add_element(locators::close_top_search_button(), MockElement::new("Close"));
        }
        driver
    }

    async fn page_with(driver: &MockDriver, waits: WaitSettings) -> ClientPage {
        let session = Session::new(Arc::new(driver.clone()), waits);
        ClientPage::load(&session).await.unwrap()
    }

    async fn page(driver: &MockDriver) -> ClientPage {
        page_with(driver, WaitSettings::default()).await
    }

    /// Post a message when Enter is pressed in the composer
    fn post_on_enter(driver: &MockDriver, message: &str) {
        let container = locators::message_container(message);
        let text = message.to_string();
        driver.on(locators::message_input(), MockAction::Key(Key::Enter), move |dom| {
            dom.set_elements(container.clone(), vec![MockElement::new(text.clone())]);
        });
    }

    #[test]
    fn test_locators_quote_text() {
        assert_eq!(
            locators::sidebar_item("general"),
            Locator::xpath("//*[contains(@data-qa, 'virtual-list-item')][.='general']")
        );
        assert_eq!(
            locators::message_container("it's"),
            Locator::xpath(".//*[@data-qa='message_container'][contains(., \"it's\")]")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_sidebar_item_waits_for_clickable() {
        let driver = client();
        let general = locators::sidebar_item("general");
        driver.dom().add_element(general.clone(), MockElement::new("general").hidden());
        let client = page(&driver).await;

        let reveal = {
            let driver = driver.clone();
            let general = general.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                driver.dom().element_mut(&general, 0).unwrap().visible = true;
            })
        };

        client.select_sidebar_item("general").await.unwrap();
        reveal.await.unwrap();

        assert_eq!(driver.events(), vec![MockEvent::Click(general, 0)]);
    }

    #[tokio::test]
    async fn test_selected_workspace_and_channel_are_trimmed() {
        let driver = client();
        driver
            .dom()
            .add_element(locators::selected_channel(), MockElement::new("\n general "));
        let client = page(&driver).await;

        assert_eq!(client.selected_workspace().await.unwrap(), "Acme");
        assert_eq!(client.selected_channel().await.unwrap(), "general");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_waits_for_container() {
        let driver = client();
        post_on_enter(&driver, "hello team");
        let client = page(&driver).await;

        client.send_message("hello team").await.unwrap();

        let input = locators::message_input();
        assert_eq!(
            driver.events(),
            vec![
                MockEvent::Click(input.clone(), 0),
                MockEvent::Clear(input.clone(), 0),
                MockEvent::Type(input.clone(), 0, "hello team".to_string()),
                MockEvent::Key(input, 0, Key::Enter),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_times_out_when_not_posted() {
        let driver = client();
        let client = page(&driver).await;

        let err = client.send_message("lost").await.unwrap_err();

        match err {
            Error::WaitTimeout { message, timeout } => {
                assert_eq!(message, "Message is not displayed: lost");
                assert_eq!(timeout, Duration::from_secs(30));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_then_remove_round_trip() {
        let driver = client();
        let message = "ship it";
        let container = locators::message_container(message);
        driver.dom().add_element(container.clone(), MockElement::new(message));
        driver.dom().add_element(locators::save_message_button(), MockElement::new("Save"));
        driver
            .dom()
            .add_element(locators::remove_from_saved_button(), MockElement::new("Remove"));

        driver.on(locators::save_message_button(), MockAction::Click, {
            let container = container.clone();
            move |dom| {
                dom.element_mut(&container, 0).unwrap().text = format!("{}\n{}", SAVED_MARKER, "ship it");
                dom.set_elements(locators::saved_messages(), vec![MockElement::new(" ship it ")]);
            }
        });
        driver.on(locators::remove_from_saved_button(), MockAction::Click, {
            let container = container.clone();
            move |dom| {
                dom.element_mut(&container, 0).unwrap().text = "ship it".to_string();
                dom.remove_elements(&locators::saved_messages());
            }
        });
        let client = page(&driver).await;

        client.save_message(message).await.unwrap();
        assert_eq!(client.saved_messages().await.unwrap(), vec!["ship it"]);

        client.remove_message_from_saved_items(message).await.unwrap();
        assert!(driver.dom().elements(&locators::saved_messages()).is_empty());
        assert!(driver.events().contains(&MockEvent::Hover(container, 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_reports_unsaved_message() {
        let driver = client();
        driver
            .dom()
            .add_element(locators::message_container("draft"), MockElement::new("draft"));
        driver.dom().add_element(locators::save_message_button(), MockElement::new("Save"));
        let client = page(&driver).await;

        let err = client.save_message("draft").await.unwrap_err();
        assert!(
            matches!(err, Error::WaitTimeout { message, .. } if message == "Message has not been saved: draft")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_messages_empty_list() {
        let driver = client();
        let client = page(&driver).await;

        let err = client.saved_messages().await.unwrap_err();
        assert!(matches!(err, Error::WaitTimeout { message, .. } if message == "Saved items list is empty"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_result_found_after_index_lag() {
        let driver = client();
        let message = "indexed later";
        let presses = Arc::new(AtomicUsize::new(0));
        driver.on(locators::top_search_input(), MockAction::Key(Key::Enter), {
            let presses = presses.clone();
            move |dom| {
                if presses.fetch_add(1, Ordering::SeqCst) + 1 == 4 {
                    dom.add_element(locators::search_result("indexed later"), MockElement::new("indexed later"));
                }
            }
        });
        let client = page(&driver).await;

        client.search_for(message).await.unwrap();
        let start = Instant::now();
        client.wait_for_message_in_search_results(message).await.unwrap();

        // one press from the query itself, three re-submissions on 0s, 5s and 10s
        assert_eq!(presses.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_resubmit_is_rate_limited() {
        let driver = client();
        let waits = WaitSettings {
            search: WaitConfig::new(Duration::from_secs(12), Duration::from_secs(1)),
            search_resubmit_interval: Duration::from_secs(5),
            ..WaitSettings::default()
        };
        let client = page_with(&driver, waits).await;

        let err = client
            .wait_for_message_in_search_results("never indexed")
            .await
            .unwrap_err();

        let resubmits = driver
            .events()
            .iter()
            .filter(|e| matches!(e, MockEvent::Key(_, _, Key::Enter)))
            .count();
        assert_eq!(resubmits, 3);
        assert!(matches!(
            err,
            Error::WaitTimeout { message, timeout }
                if message == "The message has not been found in search results: never indexed"
                    && timeout == Duration::from_secs(12)
        ));
    }

    #[tokio::test]
    async fn test_close_top_search_popup() {
        let driver = client();
        page(&driver).await.close_top_search_popup().await.unwrap();
        assert_eq!(
            driver.events(),
            vec![MockEvent::Click(locators::close_top_search_button(), 0)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_items_pane() {
        let driver = client();
        driver.dom().add_element(locators::saved_items_pane(), MockElement::new("Saved items"));
        page(&driver).await.wait_for_saved_items_pane().await.unwrap();
    }
}
