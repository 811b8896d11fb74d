//! Instrumented policy and cookie stores for broker integration tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cookie_broker_core::{
    CookieQuery, CookieRecord, CookieStore, CookieStoreError, MemoryCookieStore,
    PolicyConfiguration, PolicyError, PolicyStore,
};
use tokio::sync::Barrier;

/// Cookie store that records every query before delegating to memory.
///
/// With a barrier installed, each query blocks until `n` queries are in
/// flight at once, so sequential execution would never complete.
#[derive(Debug, Default)]
pub struct RecordingCookieStore {
    inner: MemoryCookieStore,
    queries: Mutex<Vec<CookieQuery>>,
    barrier: Option<Arc<Barrier>>,
    fail_domain: Option<String>,
}

impl RecordingCookieStore {
    pub fn new(cookies: Vec<CookieRecord>) -> Self {
        Self {
            inner: MemoryCookieStore::from_records(cookies),
            ..Self::default()
        }
    }

    pub fn require_concurrency(mut self, n: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub fn failing_for(mut self, domain: &str) -> Self {
        self.fail_domain = Some(domain.to_string());
        self
    }

    pub fn queries(&self) -> Vec<CookieQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CookieStore for RecordingCookieStore {
    async fn get_all(&self, query: &CookieQuery) -> Result<Vec<CookieRecord>, CookieStoreError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.fail_domain.as_deref() == Some(query.domain.as_str()) {
            return Err(CookieStoreError::Unavailable("simulated outage".to_string()));
        }
        self.inner.get_all(query).await
    }
}

/// Policy store that counts loads and can be swapped between requests.
#[derive(Debug, Default)]
pub struct CountingPolicyStore {
    configuration: Mutex<PolicyConfiguration>,
    loads: AtomicUsize,
    broken: bool,
}

impl CountingPolicyStore {
    pub fn new(configuration: PolicyConfiguration) -> Self {
        Self {
            configuration: Mutex::new(configuration),
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn replace(&self, configuration: PolicyConfiguration) {
        *self.configuration.lock().unwrap() = configuration;
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicyStore for CountingPolicyStore {
    async fn load(&self) -> Result<PolicyConfiguration, PolicyError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(PolicyError::Unavailable("managed storage offline".to_string()));
        }
        Ok(self.configuration.lock().unwrap().clone())
    }
}
