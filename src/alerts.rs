//! Low-stat alerting.
//!
//! The core only hands over a [`StatSnapshot`]; this module decides which
//! alerts to raise or withdraw and remembers when each one last fired so a
//! still-low stat re-alerts at most once per cooldown.

use crate::model::{Stat, StatSnapshot};
use crate::sim::Milestone;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_COOLDOWN_MS: i64 = 5 * 60 * 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlertTier {
    /// (15, 25]
    Warning,
    /// (0, 15]
    Emergency,
}

impl AlertTier {
    pub const ALL: [AlertTier; 2] = [AlertTier::Warning, AlertTier::Emergency];

    pub fn contains(self, value: f64) -> bool {
        let (upper, lower) = match self {
            AlertTier::Warning => (25.0, 15.0),
            AlertTier::Emergency => (15.0, 0.0),
        };
        value <= upper && value > lower
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub stat: Stat,
    pub tier: AlertTier,
}

impl AlertKey {
    pub fn new(stat: Stat, tier: AlertTier) -> Self {
        Self { stat, tier }
    }

    pub fn title(&self) -> String {
        let stat = self.stat.label();
        match self.tier {
            AlertTier::Warning => format!("Low {stat}"),
            AlertTier::Emergency => format!("{} emergency!", stat.to_uppercase()),
        }
    }

    pub fn body(&self) -> &'static str {
        match (self.stat, self.tier) {
            (Stat::Hunger, AlertTier::Warning) => "Your pet is getting hungry. Feed it soon.",
            (Stat::Hunger, AlertTier::Emergency) => "Your pet is starving! Feed it now!",
            (Stat::Happiness, AlertTier::Warning) => "Your pet is feeling down. Some play would help.",
            (Stat::Happiness, AlertTier::Emergency) => "Your pet is miserable! Play with it now!",
            (Stat::Energy, AlertTier::Warning) => "Your pet is getting tired. Rest soon?",
            (Stat::Energy, AlertTier::Emergency) => "Your pet is exhausted! Put it to sleep!",
            (Stat::Cleanliness, AlertTier::Warning) => "Your pet is getting dirty. A bath would be nice.",
            (Stat::Cleanliness, AlertTier::Emergency) => "Your pet is filthy! Clean it right away!",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertSignal {
    Raise(AlertKey),
    Cancel(AlertKey),
}

impl AlertSignal {
    pub fn key(&self) -> AlertKey {
        match self {
            AlertSignal::Raise(k) | AlertSignal::Cancel(k) => *k,
        }
    }
}

/// Per-signal cooldown: key -> last fired, plus which keys are showing.
#[derive(Clone, Debug)]
pub struct CooldownTracker {
    cooldown_ms: i64,
    active: BTreeSet<AlertKey>,
    last_fired: BTreeMap<AlertKey, i64>,
}

impl CooldownTracker {
    pub fn new(cooldown_ms: i64) -> Self {
        Self {
            cooldown_ms: cooldown_ms.max(0),
            active: BTreeSet::new(),
            last_fired: BTreeMap::new(),
        }
    }

    pub fn is_active(&self, key: AlertKey) -> bool {
        self.active.contains(&key)
    }

    pub fn should_fire(&self, key: AlertKey, now_ms: i64) -> bool {
        if !self.is_active(key) {
            return true;
        }
        match self.last_fired.get(&key) {
            Some(last) => now_ms.saturating_sub(*last) > self.cooldown_ms,
            None => true,
        }
    }

    pub fn fired(&mut self, key: AlertKey, now_ms: i64) {
        self.active.insert(key);
        self.last_fired.insert(key, now_ms);
    }

    /// Returns whether the key was showing.
    pub fn clear(&mut self, key: AlertKey) -> bool {
        self.active.remove(&key)
    }

    /// Clear and restamp so the key does not bounce straight back.
    pub fn quiet(&mut self, key: AlertKey, now_ms: i64) -> bool {
        self.last_fired.insert(key, now_ms);
        self.clear(key)
    }

    pub fn reset(&mut self) -> Vec<AlertKey> {
        self.last_fired.clear();
        std::mem::take(&mut self.active).into_iter().collect()
    }
}

#[derive(Clone, Debug)]
pub struct AlertMonitor {
    tracker: CooldownTracker,
}

impl Default for AlertMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}

impl AlertMonitor {
    pub fn new(cooldown_ms: i64) -> Self {
        Self {
            tracker: CooldownTracker::new(cooldown_ms),
        }
    }

    pub fn tracker(&self) -> &CooldownTracker {
        &self.tracker
    }

    pub fn evaluate(&mut self, snap: &StatSnapshot, alive: bool, now_ms: i64) -> Vec<AlertSignal> {
        if !alive {
            return self.tracker.reset().into_iter().map(AlertSignal::Cancel).collect();
        }

        let mut out = Vec::new();
        for stat in Stat::ALL {
            let value = snap.get(stat);
            for tier in AlertTier::ALL {
                let key = AlertKey::new(stat, tier);

                // Low energy is expected while asleep; it is recovering.
                if stat == Stat::Energy && snap.sleeping {
                    if self.tracker.quiet(key, now_ms) {
                        out.push(AlertSignal::Cancel(key));
                    }
                    continue;
                }

                if tier.contains(value) {
                    if self.tracker.should_fire(key, now_ms) {
                        self.tracker.fired(key, now_ms);
                        out.push(AlertSignal::Raise(key));
                    }
                } else if self.tracker.clear(key) {
                    out.push(AlertSignal::Cancel(key));
                }
            }
        }
        out
    }
}

pub trait AlertSink {
    fn signal(&mut self, signal: &AlertSignal);
    fn milestone(&mut self, milestone: &Milestone);
}

pub fn milestone_message(milestone: &Milestone) -> String {
    format!("Milestone reached! Your pet is now {} days old!", milestone.days)
}

/// Routes alerts through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn signal(&mut self, signal: &AlertSignal) {
        match signal {
            AlertSignal::Raise(key) => warn!("{}: {}", key.title(), key.body()),
            AlertSignal::Cancel(key) => info!("alert cleared: {}", key.title()),
        }
    }

    fn milestone(&mut self, milestone: &Milestone) {
        info!("{}", milestone_message(milestone));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(hunger: f64, happiness: f64, energy: f64, cleanliness: f64) -> StatSnapshot {
        StatSnapshot {
            hunger,
            happiness,
            energy,
            cleanliness,
            sleeping: false,
        }
    }

    fn raise(stat: Stat, tier: AlertTier) -> AlertSignal {
        AlertSignal::Raise(AlertKey::new(stat, tier))
    }

    fn cancel(stat: Stat, tier: AlertTier) -> AlertSignal {
        AlertSignal::Cancel(AlertKey::new(stat, tier))
    }

    #[test]
    fn tier_bands() {
        assert!(AlertTier::Warning.contains(25.0));
        assert!(AlertTier::Warning.contains(15.01));
        assert!(!AlertTier::Warning.contains(15.0));
        assert!(!AlertTier::Warning.contains(25.01));
        assert!(AlertTier::Emergency.contains(15.0));
        assert!(AlertTier::Emergency.contains(0.01));
        assert!(!AlertTier::Emergency.contains(0.0));
    }

    #[test]
    fn healthy_pet_is_quiet() {
        let mut m = AlertMonitor::default();
        assert!(m.evaluate(&snap(80.0, 80.0, 80.0, 80.0), true, 0).is_empty());
    }

    #[test]
    fn raise_then_hold_for_cooldown() {
        let mut m = AlertMonitor::new(1_000);
        let s = snap(20.0, 80.0, 80.0, 80.0);
        assert_eq!(m.evaluate(&s, true, 0), vec![raise(Stat::Hunger, AlertTier::Warning)]);
        assert!(m.evaluate(&s, true, 500).is_empty());
        assert!(m.evaluate(&s, true, 1_000).is_empty());
        assert_eq!(m.evaluate(&s, true, 1_001), vec![raise(Stat::Hunger, AlertTier::Warning)]);
    }

    #[test]
    fn moving_between_tiers_swaps_alerts() {
        let mut m = AlertMonitor::new(60_000);
        m.evaluate(&snap(20.0, 80.0, 80.0, 80.0), true, 0);
        let out = m.evaluate(&snap(10.0, 80.0, 80.0, 80.0), true, 10);
        assert_eq!(
            out,
            vec![
                cancel(Stat::Hunger, AlertTier::Warning),
                raise(Stat::Hunger, AlertTier::Emergency),
            ]
        );
        let out = m.evaluate(&snap(90.0, 80.0, 80.0, 80.0), true, 20);
        assert_eq!(out, vec![cancel(Stat::Hunger, AlertTier::Emergency)]);
    }

    #[test]
    fn sleeping_cancels_energy_only() {
        let mut m = AlertMonitor::new(60_000);
        let mut s = snap(20.0, 80.0, 10.0, 80.0);
        m.evaluate(&s, true, 0);
        assert!(m.tracker().is_active(AlertKey::new(Stat::Energy, AlertTier::Emergency)));

        s.sleeping = true;
        let out = m.evaluate(&s, true, 100);
        assert_eq!(out, vec![cancel(Stat::Energy, AlertTier::Emergency)]);
        assert!(m.tracker().is_active(AlertKey::new(Stat::Hunger, AlertTier::Warning)));

        // Still asleep and still low: nothing new about energy.
        assert!(m.evaluate(&s, true, 200_000).iter().all(|sig| sig.key().stat != Stat::Energy));
    }

    #[test]
    fn death_withdraws_everything() {
        let mut m = AlertMonitor::new(60_000);
        m.evaluate(&snap(20.0, 10.0, 80.0, 80.0), true, 0);
        let out = m.evaluate(&snap(0.0, 10.0, 80.0, 80.0), false, 10);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| matches!(s, AlertSignal::Cancel(_))));
        assert!(m.evaluate(&snap(0.0, 10.0, 80.0, 80.0), false, 20).is_empty());
    }

    #[test]
    fn milestone_text() {
        let m = Milestone { number: 2, days: 20 };
        assert!(milestone_message(&m).contains("20 days"));
    }
}
