//! Expected conditions for `Wait::until` and `Wait::until_some`
//!
//! A condition that cannot find its element fails with `ElementNotFound`,
//! which a wait treats as "not yet".

use super::element::{Element, Elements};
use super::session::Session;
use crate::driver::scripts::READY_STATE_SCRIPT;
use crate::Result;

/// The element, once displayed
pub async fn visible(element: &Element) -> Result<Option<Element>> {
    Ok(element.is_displayed().await?.then(|| element.clone()))
}

/// The element, once displayed and enabled
pub async fn clickable(element: &Element) -> Result<Option<Element>> {
    let state = element.state().await?;
    Ok((state.visible && state.enabled).then(|| element.clone()))
}

/// At least one match exists; yields all of them
pub async fn any_present(elements: &Elements) -> Result<Option<Vec<Element>>> {
    let all = elements.all().await?;
    Ok((!all.is_empty()).then_some(all))
}

/// The live URL equals `url`
pub async fn url_to_be(session: &Session, url: &str) -> Result<bool> {
    Ok(session.current_url().await? == url)
}

/// `document.readyState` is "complete"
pub async fn document_ready(session: &Session) -> Result<bool> {
    let state = session.driver().evaluate(READY_STATE_SCRIPT).await?;
    Ok(state.as_str() == Some("complete"))
}
