//! Common test utilities
//!
//! `FakeSlack` scripts a `MockDriver` to behave like the parts of the Slack
//! web client the scenarios touch: the workspace sign-in form, the sidebar,
//! the message composer and top search.

#![allow(dead_code)]

use slack_e2e::browser::WaitSettings;
use slack_e2e::config::Config;
use slack_e2e::driver::{Key, Locator, MockAction, MockDom, MockDriver, MockElement, MockLauncher};
use slack_e2e::pages::{client::locators as client, login::locators as login};
use slack_e2e::steps::Flags;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const WORKSPACE_URL: &str = "https://example.slack.com/";
pub const CLIENT_URL: &str = "https://app.slack.com/client/T000/C000";
pub const USER_EMAIL: &str = "u@example.com";
pub const USER_PWD: &str = "secret";

/// Search presses after which posted messages show up in results
const INDEX_LAG_PRESSES: usize = 2;

pub struct FakeSlack {
    driver: MockDriver,
    posted: Arc<Mutex<Vec<String>>>,
}

impl FakeSlack {
    /// Browser sitting on the workspace sign-in page
    pub fn new() -> Self {
        let driver = MockDriver::new();
        let posted = Arc::new(Mutex::new(Vec::new()));

        {
            let mut dom = driver.dom();
            dom.set_url(WORKSPACE_URL);
            dom.add_element(login::header(), MockElement::new("Sign in to Example"));
            dom.add_element(login::email_input(), MockElement::new(""));
            dom.add_element(login::password_input(), MockElement::new(""));
            dom.add_element(login::sign_in_button(), MockElement::new("Sign In"));
        }

        driver.on(login::sign_in_button(), MockAction::Click, |dom| {
            let signed_in = value(dom, &login::email_input()) == USER_EMAIL
                && value(dom, &login::password_input()) == USER_PWD;
            if signed_in {
                open_client(dom);
            }
        });

        driver.on(client::sidebar_item("general"), MockAction::Click, |dom| {
            dom.set_elements(client::selected_channel(), vec![MockElement::new(" general ")]);
        });

        driver.on(client::message_input(), MockAction::Key(Key::Enter), {
            let posted = Arc::clone(&posted);
            move |dom| {
                let text = value(dom, &client::message_input());
                if let Some(input) = dom.element_mut(&client::message_input(), 0) {
                    input.value.clear();
                }
                dom.add_element(client::message_container(&text), MockElement::new(text.clone()));
                posted.lock().unwrap().push(text);
            }
        });

        driver.on(client::top_search_input(), MockAction::Key(Key::Enter), {
            let posted = Arc::clone(&posted);
            let presses = Arc::new(Mutex::new(0usize));
            move |dom| {
                let mut presses = presses.lock().unwrap();
                *presses += 1;
                if *presses >= INDEX_LAG_PRESSES {
                    for text in posted.lock().unwrap().iter() {
                        let result = client::search_result(text);
                        if dom.elements(&result).is_empty() {
                            dom.add_element(result, MockElement::new(text.clone()));
                        }
                    }
                }
            }
        });

        Self { driver, posted }
    }

    pub fn driver(&self) -> &MockDriver {
        &self.driver
    }

    pub fn launcher(&self) -> MockLauncher {
        MockLauncher::new(self.driver.clone())
    }

    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().unwrap().clone()
    }

    pub fn value(&self, locator: &Locator) -> String {
        value(&self.driver.dom(), locator)
    }
}

fn value(dom: &MockDom, locator: &Locator) -> String {
    dom.elements(locator)
        .first()
        .map(|el| el.value.clone())
        .unwrap_or_default()
}

fn open_client(dom: &mut MockDom) {
    dom.set_url(CLIENT_URL);
    dom.set_ready_states(["loading", "complete"]);
    dom.add_element(client::workspace_trigger(), MockElement::new("Example"));
    dom.add_element(client::sidebar_item("general"), MockElement::new("general"));
    dom.add_element(client::message_input(), MockElement::new(""));
    dom.add_element(client::top_search_button(), MockElement::new("Search"));
    dom.add_element(client::top_search_input(), MockElement::new(""));
    dom.add_element(client::close_top_search_button(), MockElement::new("Close"));
}

/// Flags for signing in to the fake workspace
pub fn flags() -> Flags {
    let values: HashMap<String, String> = [
        ("workspace_url", WORKSPACE_URL),
        ("user_email", USER_EMAIL),
        ("user_pwd", USER_PWD),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    Flags::new(values)
}

/// Wait budgets short enough for real-time tests
pub fn fast_config(report_dir: &std::path::Path, tags: &str) -> Config {
    Config {
        poll_interval_ms: 100,
        search_poll_interval_secs: 1,
        search_resubmit_interval_secs: 1,
        report_dir: report_dir.display().to_string(),
        tags: tags.to_string(),
        ..Config::default()
    }
}

pub fn fast_waits() -> WaitSettings {
    fast_config(&std::env::temp_dir(), "").wait_settings()
}

/// Report directory removed when the returned guard is dropped
pub fn report_dir(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("create report directory")
}

/// Static copy of the workspace sign-in form
pub fn login_html() -> String {
    r#"
<!DOCTYPE html>
<html>
<head>
    <title>Sign in | Slack</title>
</head>
<body>
    <h1>Sign in to Example</h1>
    <input id="email" type="email" />
    <input id="password" type="password" />
    <button id="signin_btn">Sign In</button>
</body>
</html>
    "#
    .to_string()
}

/// Data URL of the sign-in form
pub fn login_data_url() -> String {
    "data:text/html;charset=utf-8,".to_string() + &urlencoding::encode(&login_html())
}
