use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use dn2_engine::app::LoggingAudio;
use dn2_engine::{
    resolve_app_paths, AppError, AppServices, AssetError, FileAssetProvider, LoopConfig,
    StartupError,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::menu::MenuMode;
use super::profile::{load_profile, ProfileError, ProfileHandle};

const START_LEVEL_ENV_VAR: &str = "DN2_LEVEL";
const SEED_ENV_VAR: &str = "DN2_SEED";
const DEFAULT_START_LEVEL: &str = "l1";
const DEFAULT_SEED: u64 = 0x5eed;

#[derive(Debug, Error)]
pub(crate) enum GameError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    App(#[from] AppError),
}

/// Settings shared by the menu and in-game modes.
#[derive(Debug, Clone)]
pub(crate) struct GameSettings {
    pub(crate) start_level: String,
    pub(crate) seed: u64,
    pub(crate) profile: ProfileHandle,
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) services: AppServices,
    pub(crate) menu: MenuMode,
    pub(crate) profile: ProfileHandle,
    pub(crate) profile_path: PathBuf,
}

pub(crate) fn build_app() -> Result<AppWiring, GameError> {
    init_tracing();
    info!("=== Duke Nukem II Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        assets = %paths.assets_dir.display(),
        "app_paths_resolved"
    );

    let assets = FileAssetProvider::open(&paths.assets_dir)?;
    let profile = Rc::new(RefCell::new(load_profile(&paths.profile_path)?));

    let settings = GameSettings {
        start_level: start_level_from_env(),
        seed: seed_from_env(),
        profile: Rc::clone(&profile),
    };
    info!(
        start_level = %settings.start_level,
        seed = settings.seed,
        "game_settings"
    );

    Ok(AppWiring {
        config: LoopConfig::default(),
        services: AppServices {
            audio: Box::new(LoggingAudio::new()),
            assets: Box::new(assets),
        },
        menu: MenuMode::new(settings),
        profile,
        profile_path: paths.profile_path,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn start_level_from_env() -> String {
    std::env::var(START_LEVEL_ENV_VAR)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|level| !level.is_empty())
        .unwrap_or_else(|| DEFAULT_START_LEVEL.to_string())
}

fn seed_from_env() -> u64 {
    match std::env::var(SEED_ENV_VAR) {
        Ok(raw) => parse_seed(&raw).unwrap_or_else(|| {
            warn!(
                var = SEED_ENV_VAR,
                value = %raw,
                default = DEFAULT_SEED,
                "invalid_seed_using_default"
            );
            DEFAULT_SEED
        }),
        Err(_) => DEFAULT_SEED,
    }
}

/// Accepts decimal or `0x`-prefixed hex.
fn parse_seed(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_parses_decimal_and_hex() {
        assert_eq!(parse_seed("42"), Some(42));
        assert_eq!(parse_seed(" 0x2A "), Some(42));
        assert_eq!(parse_seed("0Xff"), Some(255));
        assert_eq!(parse_seed("seed"), None);
        assert_eq!(parse_seed(""), None);
    }
}
