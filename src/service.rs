//! Pet service: the one mutator every driver goes through.
//!
//! Each call reloads the stored record, applies the change with the shared
//! [`Rules`], stamps `lastUpdate`, and saves. Two drivers touching the same
//! store therefore never overwrite each other with a stale copy; the last
//! write wins.

use crate::alerts::{AlertMonitor, AlertSink};
use crate::clock::Clock;
use crate::model::{PetState, Rules};
use crate::sim::{
    apply_elapsed, catch_up, Action, ActionOutcome, CatchUpKind, CatchUpSummary, ElapsedReport,
};
use crate::storage::PetStore;
use log::{debug, info, warn};
use std::ops::ControlFlow;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    pub pet: PetState,
    pub report: ElapsedReport,
}

pub struct PetService<S, C> {
    store: S,
    clock: C,
    rules: Rules,
}

impl<S: PetStore, C: Clock> PetService<S, C> {
    pub fn new(store: S, clock: C, rules: Rules) -> Self {
        Self { store, clock, rules }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Load the stored pet. A missing or unreadable record becomes a fresh
    /// pet, persisted straight away.
    pub fn load(&self) -> PetState {
        match self.store.load() {
            Ok(Some(pet)) => pet,
            Ok(None) => {
                info!("no saved pet, hatching a new one");
                self.fresh()
            }
            Err(e) => {
                warn!("could not load pet ({e}), starting over");
                self.fresh()
            }
        }
    }

    fn fresh(&self) -> PetState {
        let pet = PetState::fresh(self.clock.now_millis());
        self.persist(&pet);
        pet
    }

    fn persist(&self, pet: &PetState) {
        if let Err(e) = self.store.save(pet) {
            warn!("could not save pet: {e}");
        }
    }

    /// Current stored pet, no time applied.
    pub fn snapshot(&self) -> PetState {
        self.load()
    }

    /// Catch-up reconciliation for app resume or a background wake.
    pub fn resume(&self) -> (PetState, CatchUpSummary) {
        let mut pet = self.load();
        let summary = catch_up(&mut pet, self.clock.now_millis(), &self.rules);
        // Frozen pets are already stored as dead; anything else moved.
        if summary.kind != CatchUpKind::Frozen {
            self.persist(&pet);
        }
        debug!(
            "catch-up {:?} over {:.2} min",
            summary.kind, summary.elapsed_minutes
        );
        (pet, summary)
    }

    /// One live step of `step` wall time.
    pub fn tick(&self, step: Duration) -> Update {
        let mut pet = self.load();
        if !pet.is_alive() {
            return Update {
                pet,
                report: ElapsedReport::default(),
            };
        }
        let report = apply_elapsed(&mut pet, step.as_secs_f64() / 60.0, &self.rules);
        pet.set_last_update_ms(self.clock.now_millis());
        self.persist(&pet);
        if report.died {
            info!("pet died at age {:.2} days", pet.age());
        }
        Update { pet, report }
    }

    pub fn act(&self, action: Action) -> (PetState, ActionOutcome) {
        let mut pet = self.load();
        let outcome = pet.apply(action, self.clock.now_millis());
        match outcome {
            ActionOutcome::Applied(_) => {
                if action == Action::Reset {
                    if let Err(e) = self.store.clear() {
                        warn!("could not clear old pet: {e}");
                    }
                }
                self.persist(&pet);
                debug!("{action:?} applied");
            }
            ActionOutcome::Rejected(why) => debug!("{action:?} rejected: {why:?}"),
        }
        (pet, outcome)
    }
}

/// One background wake: reconcile, report milestones and alerts. Breaks
/// once the pet is dead so the owning driver stops itself.
pub fn watch_step<S, C, K>(
    service: &PetService<S, C>,
    monitor: &mut AlertMonitor,
    sink: &mut K,
) -> ControlFlow<()>
where
    S: PetStore,
    C: Clock,
    K: AlertSink + ?Sized,
{
    let (pet, summary) = service.resume();
    for milestone in &summary.report.milestones {
        sink.milestone(milestone);
    }
    let now = service.now_millis();
    for signal in monitor.evaluate(&pet.snapshot(), pet.is_alive(), now) {
        sink.signal(&signal);
    }
    if pet.is_alive() {
        ControlFlow::Continue(())
    } else {
        info!("pet is gone, background watch stopping");
        ControlFlow::Break(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn service(start: i64) -> (PetService<Arc<MemoryStore>, ManualClock>, Arc<MemoryStore>, ManualClock) {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(start);
        (
            PetService::new(store.clone(), clock.clone(), Rules::default()),
            store,
            clock,
        )
    }

    #[test]
    fn first_load_persists_a_fresh_pet() {
        let (svc, store, _) = service(1_000);
        assert!(store.raw().is_none());
        let pet = svc.load();
        assert_eq!(pet, PetState::fresh(1_000));
        assert!(store.raw().is_some());
    }

    #[test]
    fn corrupt_record_degrades_to_fresh() {
        let store = Arc::new(MemoryStore::with_raw("{oops"));
        let svc = PetService::new(store.clone(), ManualClock::new(7), Rules::default());
        assert_eq!(svc.load(), PetState::fresh(7));
        assert_eq!(store.load().unwrap(), Some(PetState::fresh(7)));
    }

    #[test]
    fn tick_decays_and_stamps() {
        let (svc, store, clock) = service(0);
        svc.load();
        clock.advance_ms(1_000);
        let update = svc.tick(Duration::from_secs(60));
        assert!((update.pet.hunger() - 99.92).abs() < 1e-9);
        assert_eq!(update.pet.last_update_ms(), 1_000);
        assert_eq!(store.load().unwrap(), Some(update.pet));
    }

    #[test]
    fn actions_reload_before_mutating() {
        let (svc, store, _) = service(0);
        let mut other = PetState::fresh(0);
        other.set_hunger(40.0);
        other.set_age(2.0);
        store.save(&other).unwrap();

        let (pet, outcome) = svc.act(Action::Feed);
        assert!(outcome.is_applied());
        assert_eq!(pet.hunger(), 65.0);
    }

    #[test]
    fn rejected_actions_do_not_save() {
        let (svc, store, clock) = service(0);
        let mut pet = PetState::fresh(0);
        pet.set_sleeping(true);
        store.save(&pet).unwrap();
        let before = store.raw();
        clock.advance_minutes(3);
        let (_, outcome) = svc.act(Action::Clean);
        assert!(!outcome.is_applied());
        assert_eq!(store.raw(), before);
    }

    #[test]
    fn resume_applies_the_gap_once() {
        let (svc, _, clock) = service(0);
        let mut pet = PetState::fresh(0);
        pet.set_hunger(30.0);
        svc.store().save(&pet).unwrap();

        clock.advance_minutes(100);
        let (pet, _) = svc.resume();
        assert!((pet.hunger() - 22.0).abs() < 1e-9);

        let (again, _) = svc.resume();
        assert!((again.hunger() - 22.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_applies_no_time() {
        let (svc, _, clock) = service(0);
        let mut pet = PetState::fresh(0);
        pet.set_age(4.0);
        svc.store().save(&pet).unwrap();
        clock.advance_minutes(500);
        assert_eq!(svc.snapshot(), pet);
    }

    #[test]
    fn reset_replaces_the_stored_pet() {
        let (svc, store, clock) = service(0);
        let mut pet = PetState::fresh(0);
        pet.set_hunger(0.0);
        pet.check_death();
        store.save(&pet).unwrap();

        clock.set(50_000);
        let (pet, outcome) = svc.act(Action::Reset);
        assert!(outcome.is_applied());
        assert_eq!(pet, PetState::fresh(50_000));
        assert_eq!(store.load().unwrap(), Some(PetState::fresh(50_000)));
    }
}
