//! Session lifetime policy: idle-TTL eviction.
//!
//! A session idle for at least `idle_ttl` is expired.  The gateway sweeps
//! periodically and drops the transcript and spend entry of every expired
//! session together with its registry entry.

use chrono::{DateTime, Duration, Utc};

use cg_domain::config::SessionsConfig;

use crate::resolver::SessionId;
use crate::store::SessionEntry;

/// Evaluates whether sessions have outlived their idle TTL.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    idle_ttl: Duration,
}

impl LifecycleManager {
    pub fn new(idle_ttl: Duration) -> Self {
        Self { idle_ttl }
    }

    pub fn from_config(config: &SessionsConfig) -> Self {
        Self::new(Duration::minutes(i64::from(config.idle_ttl_minutes)))
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.last_seen) >= self.idle_ttl
    }

    /// Ids of all expired entries.
    pub fn expired<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a SessionEntry>,
        now: DateTime<Utc>,
    ) -> Vec<SessionId> {
        entries
            .into_iter()
            .filter(|e| self.is_expired(e, now))
            .map(|e| e.session_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(last_seen: DateTime<Utc>) -> SessionEntry {
        SessionEntry {
            session_id: SessionId::generate(),
            created_at: last_seen,
            last_seen,
        }
    }

    #[test]
    fn not_expired_before_ttl() {
        let lm = LifecycleManager::new(Duration::minutes(60));
        let now = Utc::now();
        assert!(!lm.is_expired(&entry(now - Duration::minutes(59)), now));
    }

    #[test]
    fn expired_at_ttl_boundary() {
        let lm = LifecycleManager::new(Duration::minutes(60));
        let now = Utc::now();
        assert!(lm.is_expired(&entry(now - Duration::minutes(60)), now));
    }

    #[test]
    fn from_config_uses_minutes() {
        let lm = LifecycleManager::from_config(&SessionsConfig {
            idle_ttl_minutes: 15,
            ..Default::default()
        });
        assert_eq!(lm.idle_ttl(), Duration::minutes(15));
    }

    #[test]
    fn expired_filters_entries() {
        let lm = LifecycleManager::new(Duration::minutes(10));
        let now = Utc::now();
        let old = entry(now - Duration::hours(1));
        let recent = entry(now);
        let ids = lm.expired([&old, &recent], now);
        assert_eq!(ids, vec![old.session_id.clone()]);
    }
}
