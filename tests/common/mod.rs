//! Shared fixtures: a scripted model and an in-memory companion

#![allow(dead_code)]

use futures::future::BoxFuture;
use futures::FutureExt;
use medizen::config::AppConfig;
use medizen::features::Companion;
use medizen::gateway::{
    AiGateway, GenerateContentRequest, GenerateContentResponse, GenerativeModel, RecordingBackoff,
};
use medizen::store::{MemoryBackend, StateStore};
use medizen::{MediZenError, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;

/// Model answering from a queue; once the queue is empty every call gets
/// the fallback error
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<GenerateContentResponse>>>,
    fallback: MediZenError,
    calls: Mutex<Vec<(String, GenerateContentRequest)>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: MediZenError::ApiError {
                status: 500,
                message: "INTERNAL: script exhausted".to_string(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `error`
    pub fn failing(error: MediZenError) -> Self {
        Self {
            fallback: error,
            ..Self::new()
        }
    }

    pub fn reply_text(self, text: impl Into<String>) -> Self {
        self.replies
            .lock()
            .push_back(Ok(GenerateContentResponse::from_text(text)));
        self
    }

    pub fn reply_json(self, value: Value) -> Self {
        self.reply_text(value.to_string())
    }

    pub fn reply(self, response: GenerateContentResponse) -> Self {
        self.replies.lock().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: MediZenError) -> Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Model names in call order
    pub fn models_called(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn last_request(&self) -> Option<GenerateContentRequest> {
        self.calls.lock().last().map(|(_, r)| r.clone())
    }
}

impl GenerativeModel for ScriptedModel {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        request: &'a GenerateContentRequest,
    ) -> BoxFuture<'a, Result<GenerateContentResponse>> {
        self.calls.lock().push((model.to_string(), request.clone()));
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(self.fallback.clone()));
        futures::future::ready(reply).boxed()
    }
}

pub fn quota_error() -> MediZenError {
    MediZenError::ApiError {
        status: 429,
        message: "RESOURCE_EXHAUSTED: Quota exceeded for requests per minute".to_string(),
    }
}

pub fn auth_error() -> MediZenError {
    MediZenError::ApiError {
        status: 400,
        message: "INVALID_ARGUMENT: API key not valid. Please pass a valid API key.".to_string(),
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::new("test-key")
}

pub fn gateway(model: Arc<ScriptedModel>) -> (AiGateway, RecordingBackoff) {
    let backoff = RecordingBackoff::new();
    let gateway =
        AiGateway::with_client(model, &test_config()).with_backoff(Arc::new(backoff.clone()));
    (gateway, backoff)
}

pub fn loaded_store(backend: Arc<MemoryBackend>) -> Arc<StateStore> {
    let store = Arc::new(StateStore::new(backend));
    store.load();
    store
}

/// Companion over a fresh in-memory store
pub fn companion(model: Arc<ScriptedModel>) -> (Companion, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let (gateway, _) = gateway(model);
    let app = Companion::new(loaded_store(backend.clone()), gateway);
    (app, backend)
}

pub fn diagnosis_json(specialty: &str) -> Value {
    json!({
        "summary": "Elevated blood pressure with occasional palpitations.",
        "recommendations": ["Reduce sodium intake", "Track BP twice daily"],
        "medications": ["Amlodipine 5mg"],
        "specialty": specialty,
        "fullSpeechText": "Your readings suggest mild hypertension."
    })
}
