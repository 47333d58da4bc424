use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub fps_cap: u32,
    pub enable_color: bool,
    pub alert_cooldown_secs: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            alert_cooldown_secs: 5 * 60,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn alert_cooldown_ms(&self) -> i64 {
        (self.alert_cooldown_secs as i64).saturating_mul(1000)
    }
}

pub struct Paths {
    pub data_dir: PathBuf,
    pub pet_path: PathBuf,
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

impl Paths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            pet_path: dir.join("pet.json"),
            settings_path: dir.join("settings.json"),
            log_path: dir.join("digipet.log"),
            data_dir: dir,
        }
    }
}

/// `override_dir` wins over the platform data directory.
pub fn project_paths(override_dir: Option<&Path>) -> Result<Paths> {
    let dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => ProjectDirs::from("com", "digipet", "Digipet")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data dir {}", dir.display()))?;
    Ok(Paths::in_dir(dir))
}

pub fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
        log::warn!("ignoring unreadable settings at {}", path.display());
    }
    Settings::default()
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let data = serde_json::to_vec_pretty(s)?;
    atomic_write(path, &data)?;
    Ok(())
}

/// Write to a uniquely named sibling temp file, then rename it over `to`.
/// Readers see either the old or the new file, never a partial one, even
/// with several processes writing at once.
pub fn atomic_write(to: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match to.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(to).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_defaults() {
        let s: Settings = serde_json::from_str(r#"{"fps_cap":60}"#).unwrap();
        assert_eq!(s.fps_cap, 60);
        assert_eq!(s.alert_cooldown_secs, 300);
        assert!(s.enable_color);
    }

    #[test]
    fn settings_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let paths = project_paths(Some(dir.path())).unwrap();
        let mut s = Settings::default();
        s.enable_color = false;
        s.log_level = "debug".into();
        save_settings_atomic(&paths.settings_path, &s).unwrap();
        assert_eq!(load_settings(&paths.settings_path), s);
    }

    #[test]
    fn atomic_write_leaves_only_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("pet.json")]);
    }

    #[test]
    fn garbage_settings_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{{{").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }
}
