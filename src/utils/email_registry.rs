use anyhow::Result;
use autoscale_cuckoo_filter::CuckooFilter;
use moka::future::Cache;
use std::sync::RwLock;
use std::time::Duration;

use crate::store::{Store, StoreError};

/// Expected capacity and false-positive rate.
/// Tune these based on real member counts.
const FILTER_CAPACITY: usize = 10_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fast "is this email taken?" answers in front of the store.
///
/// The cuckoo filter gives a definite "never registered"; the cache gives a
/// definite "taken" for recently seen emails; anything else asks the store.
pub struct EmailRegistry {
    filter: RwLock<CuckooFilter<String>>,
    /// true => email is TAKEN
    cache: Cache<String, bool>,
}

impl Default for EmailRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailRegistry {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            cache: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }

    /// Check if an email might be registered (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        match self.filter.read() {
            Ok(filter) => filter.contains(&email),
            // Poisoned: fall through to the slower checks.
            Err(_) => true,
        }
    }

    pub async fn mark_taken(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.filter.write() {
            filter.add(&email);
        }
        self.cache.insert(email, true).await;
    }

    /// Forget an email after its user is deleted.
    pub async fn release(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.filter.write() {
            filter.remove(&email);
        }
        self.cache.invalidate(&email).await;
    }

    /// true  => email AVAILABLE
    /// false => email TAKEN
    pub async fn is_available(&self, email: &str, store: &dyn Store) -> Result<bool, StoreError> {
        let email = normalize(email);

        // Cuckoo filter: a miss means never registered
        if !self.might_exist(&email) {
            return Ok(true);
        }

        // Cache: a hit means taken
        if self.cache.get(&email).await.unwrap_or(false) {
            return Ok(false);
        }

        // Otherwise ask the store
        let taken = store.find_credentials(&email).await?.is_some();
        if taken {
            self.cache.insert(email, true).await;
        }
        Ok(!taken)
    }

    /// Load every registered email into the filter, in batches.
    pub async fn warmup(&self, store: &dyn Store, batch_size: usize) -> Result<()> {
        let users = store.list_users(None).await?;
        let total = users.len();

        for batch in users.chunks(batch_size.max(1)) {
            let emails: Vec<String> = batch.iter().map(|u| normalize(&u.email)).collect();
            self.insert_batch(&emails).await;
        }

        log::info!("Email registry warmup complete: {} users", total);
        Ok(())
    }

    async fn insert_batch(&self, emails: &[String]) {
        if let Ok(mut filter) = self.filter.write() {
            for email in emails {
                filter.add(email);
            }
        }

        let inserts: Vec<_> = emails
            .iter()
            .map(|e| self.cache.insert(e.clone(), true))
            .collect();

        // Await all insertions concurrently
        futures::future::join_all(inserts).await;
    }
}
