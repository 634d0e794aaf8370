//! # Page objects
//!
//! Every page waits for the document to finish loading before it binds its
//! locators. Element handles re-resolve on each access, so a page object
//! stays valid across re-renders but is never reused across navigations:
//! `PageResolver::current_page` builds a fresh one from the live URL.
//!
//! ## Modules
//! - `base`: load wait shared by all pages
//! - `resolver`: URL classification, `CurrentPage`
//! - `login`: `LoginPage`
//! - `client`: `ClientPage`

pub mod base;
pub mod resolver;
pub mod login;
pub mod client;

pub use base::PageBase;
pub use client::ClientPage;
pub use login::{LoginField, LoginPage};
pub use resolver::{CurrentPage, PageKind, PageResolver};
