use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use dn2_engine::persistence::{read_text_if_exists, write_text_atomic};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const PROFILE_VERSION: u32 = 1;
pub(crate) const NUM_SAVE_SLOTS: usize = 8;
pub(crate) const NUM_EPISODES: usize = 4;
pub(crate) const NUM_HIGH_SCORE_ENTRIES: usize = 10;

/// Level name prefixes per episode, e.g. `l1`..`l8` belong to episode 0.
const EPISODE_LEVEL_PREFIXES: [char; NUM_EPISODES] = ['l', 'm', 'n', 'o'];

#[derive(Debug, Error)]
pub(crate) enum ProfileError {
    #[error("read profile '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse profile json: {message}")]
    Parse { message: String },
    #[error("profile version mismatch: expected {expected}, got {actual}")]
    Version { expected: u32, actual: u32 },
    #[error("encode profile json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("write profile '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SavedWeapon {
    #[default]
    Regular,
    Laser,
}

/// State needed to resume at the start of a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SavedGame {
    pub(crate) name: String,
    pub(crate) level: String,
    pub(crate) score: i32,
    #[serde(default)]
    pub(crate) weapon: SavedWeapon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct HighScoreEntry {
    pub(crate) name: String,
    pub(crate) score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct UserProfile {
    pub(crate) version: u32,
    pub(crate) save_slots: [Option<SavedGame>; NUM_SAVE_SLOTS],
    pub(crate) high_score_lists: [Vec<HighScoreEntry>; NUM_EPISODES],
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            version: PROFILE_VERSION,
            save_slots: Default::default(),
            high_score_lists: Default::default(),
        }
    }
}

impl UserProfile {
    pub(crate) fn save_slot(&self, slot: usize) -> Option<&SavedGame> {
        self.save_slots.get(slot).and_then(Option::as_ref)
    }

    pub(crate) fn store_save_slot(&mut self, slot: usize, saved_game: SavedGame) {
        if let Some(entry) = self.save_slots.get_mut(slot) {
            *entry = Some(saved_game);
        }
    }

    pub(crate) fn is_new_high_score(&self, episode: usize, score: i32) -> bool {
        let Some(list) = self.high_score_lists.get(episode) else {
            return false;
        };
        score > 0
            && (list.len() < NUM_HIGH_SCORE_ENTRIES
                || list.last().is_some_and(|lowest| score > lowest.score))
    }

    /// Keeps the list sorted by descending score and at most
    /// `NUM_HIGH_SCORE_ENTRIES` long. Equal scores keep earlier entries
    /// first. Returns whether the entry made it into the list.
    pub(crate) fn insert_high_score(&mut self, episode: usize, entry: HighScoreEntry) -> bool {
        if !self.is_new_high_score(episode, entry.score) {
            return false;
        }
        let Some(list) = self.high_score_lists.get_mut(episode) else {
            return false;
        };
        let index = list
            .iter()
            .position(|existing| existing.score < entry.score)
            .unwrap_or(list.len());
        list.insert(index, entry);
        list.truncate(NUM_HIGH_SCORE_ENTRIES);
        true
    }
}

/// The profile is shared by every game mode and written back at shutdown.
pub(crate) type ProfileHandle = Rc<RefCell<UserProfile>>;

pub(crate) fn episode_for_level(level: &str) -> usize {
    level
        .chars()
        .next()
        .map(|first| first.to_ascii_lowercase())
        .and_then(|first| EPISODE_LEVEL_PREFIXES.iter().position(|prefix| *prefix == first))
        .unwrap_or(0)
}

/// A missing file yields a fresh profile.
pub(crate) fn load_profile(path: &Path) -> Result<UserProfile, ProfileError> {
    let raw = read_text_if_exists(path).map_err(|source| ProfileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let Some(raw) = raw else {
        debug!(path = %path.display(), "profile_missing_using_default");
        return Ok(UserProfile::default());
    };

    let profile = parse_profile_json(&raw)?;
    if profile.version != PROFILE_VERSION {
        return Err(ProfileError::Version {
            expected: PROFILE_VERSION,
            actual: profile.version,
        });
    }
    info!(path = %path.display(), "profile_loaded");
    Ok(profile)
}

pub(crate) fn save_profile(path: &Path, profile: &UserProfile) -> Result<(), ProfileError> {
    let json = serde_json::to_string_pretty(profile).map_err(ProfileError::Encode)?;
    write_text_atomic(path, &json).map_err(|source| ProfileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "profile_saved");
    Ok(())
}

fn parse_profile_json(raw: &str) -> Result<UserProfile, ProfileError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, UserProfile>(&mut deserializer) {
        Ok(profile) => Ok(profile),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            let message = if path.is_empty() || path == "." {
                source.to_string()
            } else {
                format!("at {path}: {source}")
            };
            Err(ProfileError::Parse { message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: i32) -> HighScoreEntry {
        HighScoreEntry {
            name: name.to_string(),
            score,
        }
    }

    #[test]
    fn missing_profile_file_loads_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let profile = load_profile(&dir.path().join("profile.json")).expect("load");
        assert_eq!(profile, UserProfile::default());
    }

    #[test]
    fn profile_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("user_data").join("profile.json");

        let mut profile = UserProfile::default();
        profile.store_save_slot(
            2,
            SavedGame {
                name: "autosave".to_string(),
                level: "l3".to_string(),
                score: 12_300,
                weapon: SavedWeapon::Laser,
            },
        );
        profile.insert_high_score(1, entry("duke", 5000));

        save_profile(&path, &profile).expect("save");
        let loaded = load_profile(&path).expect("load");
        assert_eq!(loaded, profile);
    }

    #[test]
    fn parse_error_names_json_path() {
        let raw = r#"{"version": 1, "save_slots": [null, null, null, null, null, null, null, null],
            "high_score_lists": [[{"name": "duke", "score": "lots"}], [], [], []]}"#;
        let error = parse_profile_json(raw).expect_err("invalid score");
        let message = error.to_string();
        assert!(message.contains("high_score_lists[0][0].score"), "{message}");
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profile.json");
        let mut profile = UserProfile::default();
        profile.version = PROFILE_VERSION + 1;
        save_profile(&path, &profile).expect("save");

        let error = load_profile(&path).expect_err("version");
        assert!(matches!(error, ProfileError::Version { .. }));
    }

    #[test]
    fn high_scores_stay_sorted_and_capped() {
        let mut profile = UserProfile::default();
        for score in 1..=12 {
            profile.insert_high_score(0, entry("duke", score * 100));
        }

        let list = &profile.high_score_lists[0];
        assert_eq!(list.len(), NUM_HIGH_SCORE_ENTRIES);
        assert_eq!(list.first().map(|entry| entry.score), Some(1200));
        assert_eq!(list.last().map(|entry| entry.score), Some(300));
        assert!(!profile.is_new_high_score(0, 300));
        assert!(profile.is_new_high_score(0, 301));
    }

    #[test]
    fn equal_score_goes_after_existing_entry() {
        let mut profile = UserProfile::default();
        profile.insert_high_score(0, entry("first", 500));
        profile.insert_high_score(0, entry("second", 500));

        let names: Vec<&str> = profile.high_score_lists[0]
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn zero_score_never_enters_list() {
        let mut profile = UserProfile::default();
        assert!(!profile.insert_high_score(0, entry("duke", 0)));
        assert!(profile.high_score_lists[0].is_empty());
    }

    #[test]
    fn episode_follows_level_prefix() {
        assert_eq!(episode_for_level("l1"), 0);
        assert_eq!(episode_for_level("M4"), 1);
        assert_eq!(episode_for_level("o8"), 3);
        assert_eq!(episode_for_level("custom"), 0);
    }
}
