//! # Workflow layer
//!
//! ## Modules
//! - `flags`: named runtime flags
//! - `attachments`: per-scenario details and screenshots
//! - `hooks`: before/after scenario browser lifecycle
//! - `ui`: `UiSteps`, the per-scenario world and its steps

pub mod flags;
pub mod attachments;
pub mod hooks;
pub mod ui;

pub use attachments::{Attachment, AttachmentBody, AttachmentSink};
pub use flags::Flags;
pub use ui::UiSteps;
