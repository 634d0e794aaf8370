//! Per-scenario attachments: step details and screenshots

use crate::Result;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TEXT_PLAIN: &str = "text/plain";
pub const IMAGE_PNG: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentBody {
    Text(String),
    Binary(Bytes),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub body: AttachmentBody,
    pub mime_type: String,
    pub label: String,
}

impl Attachment {
    fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            IMAGE_PNG => "png",
            TEXT_PLAIN => "txt",
            _ => "bin",
        }
    }
}

/// Attachments collected while a scenario runs
#[derive(Debug, Clone, Default)]
pub struct AttachmentSink {
    attachments: Vec<Attachment>,
}

impl AttachmentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, body: AttachmentBody, mime_type: &str, label: &str) {
        self.attachments.push(Attachment {
            body,
            mime_type: mime_type.to_string(),
            label: label.to_string(),
        });
    }

    /// Plain-text note, labelled "Details"
    pub fn attach_details<S: Into<String>>(&mut self, text: S) {
        self.attach(AttachmentBody::Text(text.into()), TEXT_PLAIN, "Details");
    }

    /// PNG, labelled "Screenshot"
    pub fn attach_screenshot(&mut self, png: Vec<u8>) {
        self.attach(AttachmentBody::Binary(Bytes::from(png)), IMAGE_PNG, "Screenshot");
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Write every attachment into `<dir>/<scenario>/`, numbered in order
    pub async fn write_to(&self, dir: &Path, scenario: &str) -> Result<Vec<PathBuf>> {
        if self.attachments.is_empty() {
            return Ok(Vec::new());
        }

        let scenario_dir = dir.join(file_name(scenario));
        tokio::fs::create_dir_all(&scenario_dir).await?;

        let mut paths = Vec::with_capacity(self.attachments.len());
        for (i, attachment) in self.attachments.iter().enumerate() {
            let path = scenario_dir.join(format!(
                "{:03}-{}.{}",
                i + 1,
                file_name(&attachment.label),
                attachment.extension()
            ));
            match &attachment.body {
                AttachmentBody::Text(text) => tokio::fs::write(&path, text.as_bytes()).await?,
                AttachmentBody::Binary(bytes) => tokio::fs::write(&path, bytes).await?,
            }
            paths.push(path);
        }

        debug!("Wrote {} attachments to {}", paths.len(), scenario_dir.display());
        Ok(paths)
    }
}

/// Lower-case, file-system safe rendition of `name`
pub fn file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("Save a message to Saved items"), "save_a_message_to_saved_items");
        assert_eq!(file_name("  Sign in: @smoke / \"general\" "), "sign_in_smoke_general");
    }

    #[test]
    fn test_labels_and_mime_types() {
        let mut sink = AttachmentSink::new();
        sink.attach_details("Sending the message to the current channel: hi");
        sink.attach_screenshot(vec![0x89, b'P', b'N', b'G']);

        let labels: Vec<_> = sink
            .attachments()
            .iter()
            .map(|a| (a.label.as_str(), a.mime_type.as_str()))
            .collect();
        assert_eq!(labels, vec![("Details", TEXT_PLAIN), ("Screenshot", IMAGE_PNG)]);
    }

    #[tokio::test]
    async fn test_write_to_scenario_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("reports");
        let mut sink = AttachmentSink::new();
        sink.attach_details("Sign in workspace at https://acme.slack.com/");
        sink.attach_screenshot(vec![1, 2, 3]);

        let paths = sink.write_to(&dir, "Sign in").await.unwrap();

        assert_eq!(paths[0], dir.join("sign_in").join("001-details.txt"));
        assert_eq!(paths[1], dir.join("sign_in").join("002-screenshot.png"));
        assert_eq!(
            std::fs::read_to_string(&paths[0]).unwrap(),
            "Sign in workspace at https://acme.slack.com/"
        );
        assert_eq!(std::fs::read(&paths[1]).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_sink_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("reports");
        assert!(AttachmentSink::new().write_to(&dir, "none").await.unwrap().is_empty());
        assert!(!dir.exists());
    }
}
