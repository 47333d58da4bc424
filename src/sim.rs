use crate::model::{LifeStage, Mood, PetState, Rules, Stat};

pub const FEED_HUNGER: f64 = 25.0;
pub const FEED_HAPPINESS: f64 = 5.0;
pub const FEED_MESS: f64 = 5.0;
pub const PLAY_HAPPINESS: f64 = 15.0;
pub const PLAY_ENERGY_COST: f64 = 8.0;
pub const PLAY_HUNGER_COST: f64 = 3.0;
pub const PLAY_MESS: f64 = 3.0;
pub const PLAY_MIN_ENERGY: f64 = 20.0;
pub const CLEAN_HAPPINESS: f64 = 10.0;

/// Upper bound on milestones reported by one `apply_elapsed` call.
pub const MAX_MILESTONES_PER_STEP: u32 = 100;

/// Absences shorter than this are not worth a recap.
pub const RECAP_MIN_MINUTES: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Feed,
    Play,
    Clean,
    ToggleSleep,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Dead,
    Asleep,
    TooTired,
}

impl Rejection {
    pub fn message(self) -> &'static str {
        match self {
            Rejection::Dead => "Your pet has passed away...",
            Rejection::Asleep => "Your pet is sleeping! Wait for it to wake up.",
            Rejection::TooTired => "Your pet is too tired to play right now.",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied(&'static str),
    Rejected(Rejection),
}

impl ActionOutcome {
    pub fn message(self) -> &'static str {
        match self {
            ActionOutcome::Applied(msg) => msg,
            ActionOutcome::Rejected(r) => r.message(),
        }
    }

    pub fn is_applied(self) -> bool {
        matches!(self, ActionOutcome::Applied(_))
    }
}

impl Action {
    /// Precondition for the action; the front end uses it to grey out keys.
    pub fn check(self, pet: &PetState) -> Result<(), Rejection> {
        match self {
            Action::Reset => Ok(()),
            _ if !pet.is_alive() => Err(Rejection::Dead),
            Action::ToggleSleep => Ok(()),
            _ if pet.is_sleeping() => Err(Rejection::Asleep),
            Action::Play if pet.energy() < PLAY_MIN_ENERGY => Err(Rejection::TooTired),
            _ => Ok(()),
        }
    }
}

impl PetState {
    pub fn apply(&mut self, action: Action, now_ms: i64) -> ActionOutcome {
        if let Err(rejection) = action.check(self) {
            return ActionOutcome::Rejected(rejection);
        }

        let msg = match action {
            Action::Feed => {
                self.set_hunger(self.hunger() + FEED_HUNGER);
                self.set_happiness(self.happiness() + FEED_HAPPINESS);
                self.set_cleanliness(self.cleanliness() - FEED_MESS);
                "Yum! Your pet enjoyed the meal!"
            }
            Action::Play => {
                self.set_happiness(self.happiness() + PLAY_HAPPINESS);
                self.set_energy(self.energy() - PLAY_ENERGY_COST);
                self.set_hunger(self.hunger() - PLAY_HUNGER_COST);
                self.set_cleanliness(self.cleanliness() - PLAY_MESS);
                "Your pet had fun playing!"
            }
            Action::Clean => {
                self.set_cleanliness(100.0);
                self.set_happiness(self.happiness() + CLEAN_HAPPINESS);
                "Your pet feels fresh and clean!"
            }
            Action::ToggleSleep => {
                let sleeping = !self.is_sleeping();
                self.set_sleeping(sleeping);
                if sleeping {
                    "Sweet dreams..."
                } else {
                    "Rise and shine!"
                }
            }
            Action::Reset => {
                self.reset(now_ms);
                return ActionOutcome::Applied("A new pet has arrived! Take good care of it.");
            }
        };

        self.check_death();
        self.set_last_update_ms(now_ms);
        ActionOutcome::Applied(msg)
    }
}

/// A crossed multiple of `Rules::milestone_days`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Milestone {
    pub number: u32,
    pub days: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatDelta {
    pub hunger: f64,
    pub happiness: f64,
    pub energy: f64,
    pub cleanliness: f64,
    pub age: f64,
}

impl StatDelta {
    fn between(before: &PetState, after: &PetState) -> Self {
        Self {
            hunger: after.hunger() - before.hunger(),
            happiness: after.happiness() - before.happiness(),
            energy: after.energy() - before.energy(),
            cleanliness: after.cleanliness() - before.cleanliness(),
            age: after.age() - before.age(),
        }
    }

    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Hunger => self.hunger,
            Stat::Happiness => self.happiness,
            Stat::Energy => self.energy,
            Stat::Cleanliness => self.cleanliness,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElapsedReport {
    pub delta: StatDelta,
    pub milestones: Vec<Milestone>,
    pub died: bool,
}

/// Advance `pet` by `minutes` of wall-clock time. This is the only place
/// decay is computed; live ticks, resume catch-up and the background watcher
/// all come through here with the same `rules`.
pub fn apply_elapsed(pet: &mut PetState, minutes: f64, rules: &Rules) -> ElapsedReport {
    let mut report = ElapsedReport::default();
    if !pet.is_alive() || !minutes.is_finite() || minutes <= 0.0 {
        return report;
    }

    let before = pet.clone();
    let awake = rules.awake;

    let mut hunger_loss = minutes * awake.hunger;
    let mut happiness_loss = minutes * awake.happiness;
    let mut energy_loss = minutes * awake.energy;
    let mut cleanliness_loss = minutes * awake.cleanliness;

    if pet.is_sleeping() {
        let sleep = rules.sleep;
        pet.set_energy(pet.energy() + minutes * sleep.energy_gain);
        hunger_loss *= sleep.hunger_dampener;
        happiness_loss *= sleep.happiness_dampener;
        cleanliness_loss *= sleep.cleanliness_dampener;
        energy_loss = 0.0;
    }

    pet.set_hunger(pet.hunger() - hunger_loss);
    pet.set_happiness(pet.happiness() - happiness_loss);
    pet.set_energy(pet.energy() - energy_loss);
    pet.set_cleanliness(pet.cleanliness() - cleanliness_loss);

    let previous_age = pet.age();
    pet.set_age(previous_age + minutes / rules.minutes_per_day);
    pet.check_death();

    report.milestones = cross_milestones(pet, previous_age, rules);
    report.delta = StatDelta::between(&before, pet);
    report.died = !pet.is_alive();
    report
}

fn cross_milestones(pet: &mut PetState, previous_age: f64, rules: &Rules) -> Vec<Milestone> {
    let span = rules.milestone_days;
    if span <= 0.0 {
        return Vec::new();
    }
    let before = (previous_age / span).floor() as u32;
    let after = (pet.age() / span).floor() as u32;
    let already = pet.milestones_achieved();

    // `milestones_achieved` guards against re-firing a boundary we already
    // celebrated before a reload. It comes from disk, so it may be anything.
    let Some(first) = before.max(already).checked_add(1) else {
        return Vec::new();
    };
    if first > after {
        return Vec::new();
    }
    // Only the most recent boundaries of an absurd jump are reported.
    let first = first.max(after.saturating_sub(MAX_MILESTONES_PER_STEP - 1));
    let crossed: Vec<Milestone> = (first..=after)
        .map(|number| Milestone {
            number,
            days: (number as f64 * span) as u32,
        })
        .collect();

    pet.set_milestones_achieved(after);
    crossed
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatchUpKind {
    Applied,
    /// Untouched newborn: only the timestamp moved.
    FreshPet,
    /// Dead pets are frozen.
    Frozen,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchUpSummary {
    pub kind: CatchUpKind,
    pub elapsed_minutes: f64,
    pub report: ElapsedReport,
}

impl CatchUpSummary {
    pub fn has_anything(&self) -> bool {
        self.kind == CatchUpKind::Applied
            && (self.elapsed_minutes >= RECAP_MIN_MINUTES
                || self.report.died
                || !self.report.milestones.is_empty())
    }
}

/// Apply the whole wall-clock gap since the last stamped update in one jump.
pub fn catch_up(pet: &mut PetState, now_ms: i64, rules: &Rules) -> CatchUpSummary {
    let elapsed_ms = now_ms.saturating_sub(pet.last_update_ms());
    let elapsed_minutes = (elapsed_ms as f64 / 60_000.0).max(0.0);

    if !pet.is_alive() {
        return CatchUpSummary {
            kind: CatchUpKind::Frozen,
            elapsed_minutes,
            report: ElapsedReport::default(),
        };
    }

    if pet.is_fresh() {
        pet.set_last_update_ms(now_ms);
        return CatchUpSummary {
            kind: CatchUpKind::FreshPet,
            elapsed_minutes,
            report: ElapsedReport::default(),
        };
    }

    let report = apply_elapsed(pet, elapsed_minutes, rules);
    pet.set_last_update_ms(now_ms);
    CatchUpSummary {
        kind: CatchUpKind::Applied,
        elapsed_minutes,
        report,
    }
}

/// Critical needs win over the happy face: hunger, then energy, then dirt.
pub fn derive_mood(pet: &PetState) -> Mood {
    if !pet.is_alive() || pet.stage() == LifeStage::Egg {
        return Mood::Default;
    }
    if pet.is_sleeping() {
        return Mood::Sleeping;
    }
    if pet.hunger() < 20.0 {
        return Mood::Hungry;
    }
    if pet.energy() < 20.0 {
        return Mood::Tired;
    }
    if pet.cleanliness() < 30.0 {
        return Mood::Dirty;
    }
    if pet.happiness() > 70.0 && pet.energy() > 50.0 && pet.hunger() > 50.0 {
        return Mood::Happy;
    }
    Mood::Default
}
