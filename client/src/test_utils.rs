//! Test Utilities Module
//!
//! Scripted transport and recording display used by the unit tests.
//! This module is only compiled when running tests.

#![cfg(test)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::display::{DisplayField, DisplaySurface, Notice};
use crate::transport::{QueryParams, Transport, TransportError, TransportResponse};

// ============================================================================
// Scripted Transport
// ============================================================================

/// A request seen by `ScriptedTransport`
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub query: QueryParams,
    pub body: Option<Value>,
}

/// Transport that replays queued responses in order and records every call
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, body: Value) {
        self.push_status(200, body);
    }

    pub fn push_status(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(TransportResponse::new(status, body)));
    }

    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next(&self, call: RecordedCall) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, query: &QueryParams) -> Result<TransportResponse, TransportError> {
        self.next(RecordedCall {
            method: "GET",
            url: url.to_string(),
            query: query.clone(),
            body: None,
        })
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<TransportResponse, TransportError> {
        self.next(RecordedCall {
            method: "POST",
            url: url.to_string(),
            query: Vec::new(),
            body: Some(body.clone()),
        })
    }
}

// ============================================================================
// Recording Display
// ============================================================================

/// Display surface that remembers every write
#[derive(Default)]
pub struct RecordingDisplay {
    pub loading_changes: Mutex<Vec<bool>>,
    pub texts: Mutex<Vec<(DisplayField, String)>>,
    pub notices: Mutex<Vec<Notice>>,
    pub results_visible: Mutex<Option<bool>>,
}

impl RecordingDisplay {
    pub fn loading_changes(&self) -> Vec<bool> {
        self.loading_changes.lock().unwrap().clone()
    }
}

impl DisplaySurface for RecordingDisplay {
    fn set_text(&self, field: DisplayField, text: &str) {
        self.texts.lock().unwrap().push((field, text.to_string()));
    }

    fn set_loading(&self, visible: bool) {
        self.loading_changes.lock().unwrap().push(visible);
    }

    fn set_results_visible(&self, visible: bool) {
        *self.results_visible.lock().unwrap() = Some(visible);
    }

    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
