//! Scripted services for tests and offline previews.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use super::{
    CheckCodeRequest, RawReply, ReplyResult, SendCodeRequest, SubmissionService,
    TransportError, VerificationService,
};
use crate::models::SubmissionPayload;

/// Holds calls open until released.
#[derive(Clone)]
pub struct CallGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl CallGate {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

impl Default for CallGate {
    fn default() -> Self {
        Self::new()
    }
}

fn next_reply(queue: &Mutex<VecDeque<ReplyResult>>, fallback: ReplyResult) -> ReplyResult {
    queue
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .pop_front()
        .unwrap_or(fallback)
}

/// Verification service replaying scripted replies.
///
/// With nothing scripted, sends succeed and checks approve.
#[derive(Default)]
pub struct MockVerificationService {
    send_replies: Mutex<VecDeque<ReplyResult>>,
    check_replies: Mutex<VecDeque<ReplyResult>>,
    gate: Option<CallGate>,
    send_calls: AtomicUsize,
    check_calls: AtomicUsize,
    last_check: Mutex<Option<CheckCodeRequest>>,
    last_send: Mutex<Option<SendCodeRequest>>,
}

impl MockVerificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_send_reply(self, reply: ReplyResult) -> Self {
        self.send_replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
        self
    }

    pub fn with_check_reply(self, reply: ReplyResult) -> Self {
        self.check_replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
        self
    }

    pub fn with_gate(mut self, gate: CallGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn last_send(&self) -> Option<SendCodeRequest> {
        self.last_send.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last_check(&self) -> Option<CheckCodeRequest> {
        self.last_check.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn approved() -> ReplyResult {
        Ok(RawReply::json(200, json!({"success": true, "status": "approved"})))
    }

    pub fn unreachable() -> ReplyResult {
        Err(TransportError::Connect("http://backend.invalid".into()))
    }
}

#[async_trait]
impl VerificationService for MockVerificationService {
    async fn send_code(&self, request: &SendCodeRequest) -> ReplyResult {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_send.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        next_reply(
            &self.send_replies,
            Ok(RawReply::json(200, json!({"success": true}))),
        )
    }

    async fn check_code(&self, request: &CheckCodeRequest) -> ReplyResult {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_check.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        next_reply(&self.check_replies, Self::approved())
    }
}

/// Submission service replaying scripted replies.
///
/// With nothing scripted, every submission is accepted.
#[derive(Default)]
pub struct MockSubmissionService {
    replies: Mutex<VecDeque<ReplyResult>>,
    gate: Option<CallGate>,
    calls: AtomicUsize,
    received: Mutex<Vec<(SubmissionPayload, String)>>,
}

impl MockSubmissionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: ReplyResult) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
        self
    }

    pub fn with_gate(mut self, gate: CallGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Payloads received, with their idempotency keys.
    pub fn received(&self) -> Vec<(SubmissionPayload, String)> {
        self.received.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SubmissionService for MockSubmissionService {
    async fn submit(&self, payload: &SubmissionPayload, idempotency_key: &str) -> ReplyResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((payload.clone(), idempotency_key.to_string()));
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        next_reply(
            &self.replies,
            Ok(RawReply::json(201, json!({"id": "RPT-0001"}))),
        )
    }
}
