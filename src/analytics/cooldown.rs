//! Dedup bookkeeping for repeated detections.
//!
//! A [`CooldownTable`] remembers when each key last fired. Only a successful
//! fire moves the timestamp, so a stream of suppressed attempts cannot keep a
//! key muted forever.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

/// Last-fired timestamps keyed by a dedup key
#[derive(Debug)]
pub struct CooldownTable<K> {
    window: Duration,
    last_fired: Mutex<HashMap<K, DateTime<Utc>>>,
}

impl<K: Eq + Hash> CooldownTable<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a fire for `key` at `now` unless the key fired less than
    /// `window` ago. Returns whether the fire was accepted.
    pub fn try_fire(&self, key: K, now: DateTime<Utc>) -> bool {
        let mut last_fired = self.last_fired.lock();
        if let Some(previous) = last_fired.get(&key) {
            if now - *previous < self.window {
                return false;
            }
        }
        last_fired.insert(key, now);
        true
    }

    pub fn len(&self) -> usize {
        self.last_fired.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget keys whose cooldown has long expired
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut last_fired = self.last_fired.lock();
        let before = last_fired.len();
        last_fired.retain(|_, previous| now - *previous < self.window);
        before - last_fired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_suppressed_attempts_do_not_extend_window() {
        let table = CooldownTable::new(Duration::seconds(120));
        assert!(table.try_fire("a", t0()));
        assert!(!table.try_fire("a", t0() + Duration::seconds(60)));
        assert!(!table.try_fire("a", t0() + Duration::seconds(119)));
        // Measured from the first fire, not the suppressed attempts
        assert!(table.try_fire("a", t0() + Duration::seconds(120)));
    }

    #[test]
    fn test_keys_are_independent() {
        let table = CooldownTable::new(Duration::seconds(300));
        assert!(table.try_fire("delhi:CO2_HIGH", t0()));
        assert!(table.try_fire("delhi:AQI_HIGH", t0()));
        assert!(!table.try_fire("delhi:CO2_HIGH", t0() + Duration::seconds(10)));
        assert!(table.try_fire("mumbai:CO2_HIGH", t0() + Duration::seconds(10)));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_prune_drops_expired_keys() {
        let table = CooldownTable::new(Duration::seconds(300));
        table.try_fire("old", t0());
        table.try_fire("fresh", t0() + Duration::seconds(400));
        assert_eq!(table.prune(t0() + Duration::seconds(500)), 1);
        assert_eq!(table.len(), 1);
    }
}
