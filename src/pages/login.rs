//! Workspace sign-in page

use super::base::PageBase;
use crate::browser::{Element, Session};
use crate::{Error, Result};
use std::str::FromStr;
use tracing::{debug, instrument};

/// Locators of the sign-in form
pub mod locators {
    use crate::driver::Locator;

    pub fn header() -> Locator {
        Locator::tag_name("h1")
    }

    pub fn email_input() -> Locator {
        Locator::id("email")
    }

    pub fn password_input() -> Locator {
        Locator::id("password")
    }

    pub fn sign_in_button() -> Locator {
        Locator::id("signin_btn")
    }
}

/// Fillable form fields, named as a user reads them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    EmailAddress,
    Password,
}

impl FromStr for LoginField {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "email address" => Ok(LoginField::EmailAddress),
            "password" => Ok(LoginField::Password),
            _ => Err(Error::unknown_field(name)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginPage {
    base: PageBase,
    header: Element,
    email_input: Element,
    password_input: Element,
    sign_in_button: Element,
}

impl LoginPage {
    pub async fn load(session: &Session) -> Result<Self> {
        let base = PageBase::load(session).await?;
        Ok(Self {
            header: base.element(locators::header()),
            email_input: base.element(locators::email_input()),
            password_input: base.element(locators::password_input()),
            sign_in_button: base.element(locators::sign_in_button()),
            base,
        })
    }

    pub fn session(&self) -> &Session {
        self.base.session()
    }

    /// Trimmed text of the page heading
    pub async fn header(&self) -> Result<String> {
        self.header.text().await
    }

    /// Replace the content of the field called `field` (case-insensitive)
    #[instrument(skip(self, value))]
    pub async fn fill(&self, field: &str, value: &str) -> Result<()> {
        let input = match field.parse()? {
            LoginField::EmailAddress => &self.email_input,
            LoginField::Password => &self.password_input,
        };
        input.clear().await?;
        input.type_text(value).await?;
        debug!("Filled {}", input.locator());
        Ok(())
    }

    pub async fn click_sign_in(&self) -> Result<()> {
        self.sign_in_button.click().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::WaitSettings;
    use crate::driver::{MockDriver, MockElement, MockEvent};
    use std::sync::Arc;

    fn login_form() -> MockDriver {
        let driver = MockDriver::new();
        {
            let mut dom = driver.dom();
            dom.set_url("https://acme.slack.com/");
            dom.add_element(locators::header(), MockElement::new("  Sign in to Acme \n"));
            dom.add_element(locators::email_input(), MockElement::new(""));
            dom.add_element(locators::password_input(), MockElement::new(""));
            dom.add_element(locators::sign_in_button(), MockElement::new("Sign In"));
        }
        driver
    }

    async fn page(driver: &MockDriver) -> LoginPage {
        let session = Session::new(Arc::new(driver.clone()), WaitSettings::default());
        LoginPage::load(&session).await.unwrap()
    }

    #[test]
    fn test_field_names_are_case_insensitive() {
        assert_eq!("Email address".parse::<LoginField>().unwrap(), LoginField::EmailAddress);
        assert_eq!("EMAIL ADDRESS".parse::<LoginField>().unwrap(), LoginField::EmailAddress);
        assert_eq!("Password".parse::<LoginField>().unwrap(), LoginField::Password);
        assert!(matches!(
            "Username".parse::<LoginField>(),
            Err(Error::UnknownField { field }) if field == "Username"
        ));
    }

    #[tokio::test]
    async fn test_header_is_trimmed() {
        let driver = login_form();
        assert_eq!(page(&driver).await.header().await.unwrap(), "Sign in to Acme");
    }

    #[tokio::test]
    async fn test_fill_replaces_field_content() {
        let driver = login_form();
        driver
            .dom()
            .element_mut(&locators::email_input(), 0)
            .unwrap()
            .value = "stale@acme.test".to_string();
        let login = page(&driver).await;

        login.fill("Email address", "qa@acme.test").await.unwrap();
        login.fill("password", "secret").await.unwrap();

        let dom = driver.dom();
        assert_eq!(dom.elements(&locators::email_input())[0].value, "qa@acme.test");
        assert_eq!(dom.elements(&locators::password_input())[0].value, "secret");
    }

    #[tokio::test]
    async fn test_unknown_field_touches_nothing() {
        let driver = login_form();
        let login = page(&driver).await;

        let err = login.fill("Username", "qa").await.unwrap_err();

        assert_eq!(err.to_string(), "Username field is not defined at LoginPage");
        assert!(driver.events().is_empty());
    }

    #[tokio::test]
    async fn test_click_sign_in() {
        let driver = login_form();
        page(&driver).await.click_sign_in().await.unwrap();
        assert_eq!(
            driver.events(),
            vec![MockEvent::Click(locators::sign_in_button(), 0)]
        );
    }
}
