// Copyright 2025 Rageval Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Oracle response caching
//!
//! Judge prompts are deterministic functions of the sample, so a
//! re-run after an interrupted evaluation repeats identical prompts.
//! Caching on the prompt hash makes those re-runs nearly free.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use crate::oracle::{JudgeOracle, OracleError, OracleResponse};

const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Hit and miss counters for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Caching decorator over any [`JudgeOracle`].
///
/// Only successful responses are stored. Errors pass through so retry
/// logic upstream sees every failure.
pub struct CachedOracle {
    inner: Arc<dyn JudgeOracle>,
    cache: Cache<u64, OracleResponse>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedOracle {
    pub fn new(inner: Arc<dyn JudgeOracle>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(DEFAULT_MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn prompt_key(&self, prompt: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.inner.model_name().hash(&mut hasher);
        prompt.hash(&mut hasher);
        hasher.finish()
    }
}

#[async_trait]
impl JudgeOracle for CachedOracle {
    async fn invoke(&self, prompt: &str) -> Result<OracleResponse, OracleError> {
        let key = self.prompt_key(prompt);
        if let Some(cached) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "oracle cache hit");
            return Ok(cached);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let response = self.inner.invoke(prompt).await?;
        self.cache.insert(key, response.clone()).await;
        Ok(response)
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
