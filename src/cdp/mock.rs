//! Mock CDP implementation for testing
//!
//! `MockCdpClient` records every command it receives and answers
//! evaluations from a script queue, so the CDP driver can be exercised
//! without a browser.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

use crate::cdp::traits::*;
use crate::Error;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 1x1 PNG
const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53,
    0xDE,
];

/// Mock CDP client
#[derive(Debug, Default)]
pub struct MockCdpClient {
    calls: Mutex<Vec<(String, Value)>>,
    evaluations: Mutex<VecDeque<EvaluationResult>>,
    fallback: Mutex<Option<EvaluationResult>>,
    subscribers: Mutex<Vec<(String, mpsc::Sender<CdpEvent>)>>,
    failing: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MockCdpClient {
    /// Create a new mock CDP client
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next `Runtime.evaluate`
    pub fn push_evaluation(&self, result: EvaluationResult) {
        lock(&self.evaluations).push_back(result);
    }

    /// Result returned once the queue is empty (default `Null`)
    pub fn set_fallback_evaluation(&self, result: EvaluationResult) {
        *lock(&self.fallback) = Some(result);
    }

    /// Make every later `method` command fail with a protocol error
    pub fn fail_method(&self, method: &str) {
        lock(&self.failing).push(method.to_string());
    }

    /// Every command received so far, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        lock(&self.calls).clone()
    }

    /// Method names of every command received so far
    pub fn methods(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|(m, _)| m.clone()).collect()
    }

    /// Expressions passed to `Runtime.evaluate`
    pub fn evaluated_scripts(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter(|(m, _)| m == "Runtime.evaluate")
            .filter_map(|(_, p)| p.get("expression").and_then(|e| e.as_str()).map(|s| s.to_string()))
            .collect()
    }

    /// Deliver an event to matching subscribers
    pub async fn emit(&self, method: &str, params: Value) {
        let targets: Vec<mpsc::Sender<CdpEvent>> = lock(&self.subscribers)
            .iter()
            .filter(|(filter, _)| filter == method || filter == "*")
            .map(|(_, sender)| sender.clone())
            .collect();

        for sender in targets {
            let _ = sender
                .send(CdpEvent {
                    method: method.to_string(),
                    params: params.clone(),
                    session_id: None,
                })
                .await;
        }
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, method: &str, params: Value) -> Result<(), Error> {
        if self.is_closed() {
            return Err(Error::websocket("Connection is not active"));
        }
        lock(&self.calls).push((method.to_string(), params));
        Ok(())
    }
}

#[async_trait]
impl CdpClient for MockCdpClient {
    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        self.record("Page.navigate", serde_json::json!({ "url": url }))?;
        Ok(NavigationResult {
            frame_id: Some(uuid::Uuid::new_v4().to_string()),
            loader_id: Some(uuid::Uuid::new_v4().to_string()),
        })
    }

    async fn evaluate(&self, script: &str, _await_promise: bool) -> Result<EvaluationResult, Error> {
        self.record("Runtime.evaluate", serde_json::json!({ "expression": script }))?;

        let queued = lock(&self.evaluations).pop_front();
        Ok(queued
            .or_else(|| lock(&self.fallback).clone())
            .unwrap_or(EvaluationResult::Null))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, Error> {
        self.record("Page.captureScreenshot", Value::Null)?;
        Ok(PNG_PIXEL.to_vec())
    }

    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        self.record(&format!("{}.enable", domain), Value::Null)
    }

    async fn call_method(&self, method: &str, params: Value) -> Result<Value, Error> {
        self.record(method, params)?;
        if lock(&self.failing).iter().any(|m| m == method) {
            return Err(Error::cdp(format!("{} failed", method)));
        }
        Ok(serde_json::json!({}))
    }

    async fn subscribe_events(&self, event_type: &str) -> Result<mpsc::Receiver<CdpEvent>, Error> {
        let (tx, rx) = mpsc::channel(100);
        lock(&self.subscribers).push((event_type.to_string(), tx));
        Ok(rx)
    }

    async fn close(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::SeqCst);
        lock(&self.subscribers).clear();
        Ok(())
    }
}

/// Mock CDP browser handing out one shared `MockCdpClient`
#[derive(Debug)]
pub struct MockCdpBrowser {
    client: Arc<MockCdpClient>,
    closed_targets: Mutex<Vec<String>>,
    is_active: AtomicBool,
}

impl MockCdpBrowser {
    /// Create a new mock CDP browser
    pub fn new(client: Arc<MockCdpClient>) -> Self {
        Self {
            client,
            closed_targets: Mutex::new(Vec::new()),
            is_active: AtomicBool::new(true),
        }
    }

    /// Targets closed through `close_target`
    pub fn closed_targets(&self) -> Vec<String> {
        lock(&self.closed_targets).clone()
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        !self.is_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CdpBrowser for MockCdpBrowser {
    async fn create_client(&self, _target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        if self.is_closed() {
            return Err(Error::cdp("Browser is closed"));
        }
        Ok(self.client.clone())
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::SeqCst);
        self.client.close().await
    }

    async fn create_target(&self, _url: &str) -> Result<String, Error> {
        if self.is_closed() {
            return Err(Error::cdp("Browser is closed"));
        }
        Ok(format!(
            "ws://localhost:9222/devtools/page/{}",
            uuid::Uuid::new_v4()
        ))
    }

    async fn close_target(&self, target_id: &str) -> Result<(), Error> {
        lock(&self.closed_targets).push(target_id.to_string());
        Ok(())
    }
}
