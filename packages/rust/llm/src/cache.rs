//! Prompt-result memoization behind a substitutable interface.
//!
//! The pipeline itself holds no global state; any per-process cache is an
//! explicit value the caller constructs and passes in.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{ChatBackend, ChatOptions};
use issuebrief_shared::Result;

/// Cache key for one prompt pair under one model.
pub fn prompt_key(model: &str, system: &str, user: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0]);
    hasher.update(system.as_bytes());
    hasher.update([0]);
    hasher.update(user.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Lookup/store interface for memoized completions.
pub trait PromptCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str);
}

/// Cache that never hits.
pub struct NoopCache;

impl PromptCache for NoopCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
    fn put(&self, _key: &str, _value: &str) {}
}

/// In-process cache; lives as long as the caller keeps it.
#[derive(Default)]
pub struct MemoryCache {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PromptCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().expect("cache lock poisoned").get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

/// A [`ChatBackend`] wrapper that consults a [`PromptCache`] before calling
/// through. Errors are never cached.
pub struct CachedChat<B, C> {
    backend: B,
    cache: C,
    model_tag: String,
}

impl<B: ChatBackend, C: PromptCache> CachedChat<B, C> {
    pub fn new(backend: B, cache: C, model_tag: impl Into<String>) -> Self {
        Self {
            backend,
            cache,
            model_tag: model_tag.into(),
        }
    }
}

#[async_trait]
impl<B: ChatBackend, C: PromptCache> ChatBackend for CachedChat<B, C> {
    async fn chat(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String> {
        let key = prompt_key(&self.model_tag, system, user);
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %&key[..12], "prompt cache hit");
            return Ok(hit);
        }

        let reply = self.backend.chat(system, user, options).await?;
        self.cache.put(&key, &reply);
        Ok(reply)
    }
}
