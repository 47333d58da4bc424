use serde::{Deserialize, Serialize};

pub const STAT_MIN: f64 = 0.0;
pub const STAT_MAX: f64 = 100.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LifeStage {
    Egg,
    Baby,
    Teen,
    Adult,
}

impl LifeStage {
    /// Stage breakpoints in days: [0,1) egg, [1,3) baby, [3,7) teen, 7+ adult.
    pub fn from_age(age: f64) -> Self {
        if age >= 7.0 {
            LifeStage::Adult
        } else if age >= 3.0 {
            LifeStage::Teen
        } else if age >= 1.0 {
            LifeStage::Baby
        } else {
            LifeStage::Egg
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifeStage::Egg => "egg",
            LifeStage::Baby => "baby",
            LifeStage::Teen => "teen",
            LifeStage::Adult => "adult",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mood {
    Default,
    Sleeping,
    Hungry,
    Tired,
    Dirty,
    Happy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stat {
    Hunger,
    Happiness,
    Energy,
    Cleanliness,
}

impl Stat {
    pub const ALL: [Stat; 4] = [Stat::Hunger, Stat::Happiness, Stat::Energy, Stat::Cleanliness];

    pub fn label(self) -> &'static str {
        match self {
            Stat::Hunger => "hunger",
            Stat::Happiness => "happiness",
            Stat::Energy => "energy",
            Stat::Cleanliness => "cleanliness",
        }
    }
}

fn clamp_stat(current: f64, value: f64) -> f64 {
    if value.is_nan() {
        return current;
    }
    value.clamp(STAT_MIN, STAT_MAX)
}

/// The one creature. Stats saturate in `[0, 100]` on every write and the
/// stage is always recomputed from age.
#[derive(Clone, Debug, PartialEq)]
pub struct PetState {
    hunger: f64,
    happiness: f64,
    energy: f64,
    cleanliness: f64,
    age: f64,
    stage: LifeStage,
    sleeping: bool,
    alive: bool,
    last_update_ms: i64,
    milestones_achieved: u32,
}

impl PetState {
    pub fn fresh(now_ms: i64) -> Self {
        Self {
            hunger: STAT_MAX,
            happiness: STAT_MAX,
            energy: STAT_MAX,
            cleanliness: STAT_MAX,
            age: 0.0,
            stage: LifeStage::Egg,
            sleeping: false,
            alive: true,
            last_update_ms: now_ms,
            milestones_achieved: 0,
        }
    }

    pub fn hunger(&self) -> f64 {
        self.hunger
    }
    pub fn happiness(&self) -> f64 {
        self.happiness
    }
    pub fn energy(&self) -> f64 {
        self.energy
    }
    pub fn cleanliness(&self) -> f64 {
        self.cleanliness
    }
    pub fn age(&self) -> f64 {
        self.age
    }
    pub fn stage(&self) -> LifeStage {
        self.stage
    }
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }
    pub fn is_alive(&self) -> bool {
        self.alive
    }
    pub fn last_update_ms(&self) -> i64 {
        self.last_update_ms
    }
    pub fn milestones_achieved(&self) -> u32 {
        self.milestones_achieved
    }

    pub fn stat(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Hunger => self.hunger,
            Stat::Happiness => self.happiness,
            Stat::Energy => self.energy,
            Stat::Cleanliness => self.cleanliness,
        }
    }

    pub fn set_stat(&mut self, stat: Stat, value: f64) {
        let slot = match stat {
            Stat::Hunger => &mut self.hunger,
            Stat::Happiness => &mut self.happiness,
            Stat::Energy => &mut self.energy,
            Stat::Cleanliness => &mut self.cleanliness,
        };
        *slot = clamp_stat(*slot, value);
    }

    pub fn set_hunger(&mut self, value: f64) {
        self.set_stat(Stat::Hunger, value);
    }
    pub fn set_happiness(&mut self, value: f64) {
        self.set_stat(Stat::Happiness, value);
    }
    pub fn set_energy(&mut self, value: f64) {
        self.set_stat(Stat::Energy, value);
    }
    pub fn set_cleanliness(&mut self, value: f64) {
        self.set_stat(Stat::Cleanliness, value);
    }

    /// Decreases are accepted; keeping age monotonic is the caller's job.
    pub fn set_age(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.age = value.max(0.0);
        self.stage = LifeStage::from_age(self.age);
    }

    pub fn set_sleeping(&mut self, sleeping: bool) {
        self.sleeping = sleeping;
    }

    pub fn set_last_update_ms(&mut self, now_ms: i64) {
        self.last_update_ms = now_ms;
    }

    pub fn set_milestones_achieved(&mut self, count: u32) {
        self.milestones_achieved = count;
    }

    /// Used by storage when reading back a record.
    pub(crate) fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }

    /// One-way: never resurrects.
    pub fn check_death(&mut self) {
        if Stat::ALL.iter().any(|s| self.stat(*s) == STAT_MIN) {
            self.alive = false;
        }
    }

    pub fn reset(&mut self, now_ms: i64) {
        *self = PetState::fresh(now_ms);
    }

    pub fn is_fresh(&self) -> bool {
        Stat::ALL.iter().all(|s| self.stat(*s) == STAT_MAX) && self.age == 0.0
    }

    pub fn snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            hunger: self.hunger,
            happiness: self.happiness,
            energy: self.energy,
            cleanliness: self.cleanliness,
            sleeping: self.sleeping,
        }
    }
}

/// What the alerting side gets to see each tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatSnapshot {
    pub hunger: f64,
    pub happiness: f64,
    pub energy: f64,
    pub cleanliness: f64,
    pub sleeping: bool,
}

impl StatSnapshot {
    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Hunger => self.hunger,
            Stat::Happiness => self.happiness,
            Stat::Energy => self.energy,
            Stat::Cleanliness => self.cleanliness,
        }
    }
}

/// Awake loss per minute.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DecayRates {
    pub hunger: f64,
    pub happiness: f64,
    pub energy: f64,
    pub cleanliness: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SleepRates {
    pub energy_gain: f64,      // per minute
    pub hunger_dampener: f64,  // multiplies awake loss
    pub happiness_dampener: f64,
    pub cleanliness_dampener: f64,
}

/// The single rate table shared by every driver.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Rules {
    pub awake: DecayRates,
    pub sleep: SleepRates,
    pub minutes_per_day: f64,
    pub milestone_days: f64,
    pub tick_step_ms: u64,   // live foreground step
    pub watch_step_secs: u64, // background wake interval
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            awake: DecayRates {
                hunger: 0.08,
                happiness: 0.04,
                energy: 0.04,
                cleanliness: 0.016,
            },
            sleep: SleepRates {
                energy_gain: 0.24,
                hunger_dampener: 0.3,
                happiness_dampener: 0.4,
                cleanliness_dampener: 0.5,
            },
            minutes_per_day: 1440.0,
            milestone_days: 10.0,
            tick_step_ms: 1000,
            watch_step_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_pet_defaults() {
        let pet = PetState::fresh(42);
        assert_eq!(pet.hunger(), 100.0);
        assert_eq!(pet.happiness(), 100.0);
        assert_eq!(pet.energy(), 100.0);
        assert_eq!(pet.cleanliness(), 100.0);
        assert_eq!(pet.age(), 0.0);
        assert_eq!(pet.stage(), LifeStage::Egg);
        assert!(pet.is_alive());
        assert!(!pet.is_sleeping());
        assert_eq!(pet.last_update_ms(), 42);
        assert_eq!(pet.milestones_achieved(), 0);
        assert!(pet.is_fresh());
    }

    #[test]
    fn setters_saturate() {
        let mut pet = PetState::fresh(0);
        pet.set_hunger(150.0);
        pet.set_happiness(-20.0);
        pet.set_energy(f64::INFINITY);
        pet.set_cleanliness(f64::NEG_INFINITY);
        assert_eq!(pet.hunger(), 100.0);
        assert_eq!(pet.happiness(), 0.0);
        assert_eq!(pet.energy(), 100.0);
        assert_eq!(pet.cleanliness(), 0.0);
    }

    #[test]
    fn nan_leaves_stat_untouched() {
        let mut pet = PetState::fresh(0);
        pet.set_hunger(40.0);
        pet.set_hunger(f64::NAN);
        assert_eq!(pet.hunger(), 40.0);
        pet.set_age(2.0);
        pet.set_age(f64::NAN);
        assert_eq!(pet.age(), 2.0);
    }

    #[test]
    fn stage_breakpoints() {
        let cases = [
            (0.0, LifeStage::Egg),
            (0.99, LifeStage::Egg),
            (1.0, LifeStage::Baby),
            (2.99, LifeStage::Baby),
            (3.0, LifeStage::Teen),
            (6.99, LifeStage::Teen),
            (7.0, LifeStage::Adult),
            (120.0, LifeStage::Adult),
        ];
        let mut pet = PetState::fresh(0);
        for (age, stage) in cases {
            pet.set_age(age);
            assert_eq!(pet.stage(), stage, "age {age}");
        }
    }

    #[test]
    fn age_decrease_is_accepted_and_restages() {
        let mut pet = PetState::fresh(0);
        pet.set_age(8.0);
        pet.set_age(2.0);
        assert_eq!(pet.age(), 2.0);
        assert_eq!(pet.stage(), LifeStage::Baby);
    }

    #[test]
    fn death_needs_an_exact_zero() {
        let mut pet = PetState::fresh(0);
        for s in Stat::ALL {
            pet.set_stat(s, 0.01);
        }
        pet.check_death();
        assert!(pet.is_alive());

        pet.set_cleanliness(0.0);
        pet.check_death();
        assert!(!pet.is_alive());

        pet.set_cleanliness(100.0);
        pet.check_death();
        assert!(!pet.is_alive(), "check_death never resurrects");
    }

    #[test]
    fn reset_replaces_everything() {
        let mut pet = PetState::fresh(0);
        pet.set_hunger(0.0);
        pet.set_age(12.0);
        pet.set_sleeping(true);
        pet.set_milestones_achieved(1);
        pet.check_death();
        pet.reset(9_000);
        assert_eq!(pet, PetState::fresh(9_000));
    }
}
