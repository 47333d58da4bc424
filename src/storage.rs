use crate::clock::{Clock, SystemClock};
use crate::config::atomic_write;
use crate::error::StoreError;
use crate::model::PetState;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// Persistence gateway. One record per install; `load` returning `None`
/// means no pet was ever saved.
pub trait PetStore {
    fn load(&self) -> Result<Option<PetState>, StoreError>;
    fn save(&self, pet: &PetState) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

impl<T: PetStore + ?Sized> PetStore for Arc<T> {
    fn load(&self) -> Result<Option<PetState>, StoreError> {
        (**self).load()
    }
    fn save(&self, pet: &PetState) -> Result<(), StoreError> {
        (**self).save(pet)
    }
    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

fn full() -> f64 {
    100.0
}

fn yes() -> bool {
    true
}

/// Flat on-disk layout. Missing keys fall back to fresh-pet values.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PetRecord {
    #[serde(default = "full")]
    pub hunger: f64,
    #[serde(default = "full")]
    pub happiness: f64,
    #[serde(default = "full")]
    pub energy: f64,
    #[serde(default = "full")]
    pub cleanliness: f64,
    #[serde(default)]
    pub age: f64,
    /// Display cache only; never read back into the model.
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub sleeping: bool,
    #[serde(default = "yes")]
    pub alive: bool,
    #[serde(default)]
    pub last_update: Option<i64>,
    #[serde(default)]
    pub milestones_achieved: u32,
}

impl From<&PetState> for PetRecord {
    fn from(pet: &PetState) -> Self {
        Self {
            hunger: pet.hunger(),
            happiness: pet.happiness(),
            energy: pet.energy(),
            cleanliness: pet.cleanliness(),
            age: pet.age(),
            stage: pet.stage().as_str().to_string(),
            sleeping: pet.is_sleeping(),
            alive: pet.is_alive(),
            last_update: Some(pet.last_update_ms()),
            milestones_achieved: pet.milestones_achieved(),
        }
    }
}

impl PetRecord {
    /// Rebuild the model through its setters so clamping and the stage
    /// derivation apply to whatever was on disk.
    pub fn into_state(self, fallback_now_ms: i64) -> PetState {
        let mut pet = PetState::fresh(self.last_update.unwrap_or(fallback_now_ms));
        pet.set_hunger(self.hunger);
        pet.set_happiness(self.happiness);
        pet.set_energy(self.energy);
        pet.set_cleanliness(self.cleanliness);
        pet.set_age(self.age);
        pet.set_sleeping(self.sleeping);
        pet.set_alive(self.alive);
        pet.set_milestones_achieved(self.milestones_achieved);
        pet.check_death();
        pet
    }
}

fn decode(raw: &str) -> Result<PetState, StoreError> {
    let record: PetRecord = serde_json::from_str(raw)?;
    Ok(record.into_state(SystemClock.now_millis()))
}

fn encode(pet: &PetState) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec_pretty(&PetRecord::from(pet))?)
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PetStore for JsonFileStore {
    fn load(&self) -> Result<Option<PetState>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(s) => decode(&s).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, pet: &PetState) -> Result<(), StoreError> {
        atomic_write(&self.path, &encode(pet)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the serialized record in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with raw record text, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

impl PetStore for MemoryStore {
    fn load(&self) -> Result<Option<PetState>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        slot.as_deref().map(decode).transpose()
    }

    fn save(&self, pet: &PetState) -> Result<(), StoreError> {
        let text = String::from_utf8_lossy(&encode(pet)?).into_owned();
        *self.slot.lock().map_err(|_| StoreError::Poisoned)? = Some(text);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().map_err(|_| StoreError::Poisoned)? = None;
        Ok(())
    }
}
