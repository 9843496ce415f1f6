use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod asset_names;
pub mod assets;
pub mod base;
pub mod persistence;
pub mod world;

pub use app::{
    run_app, run_app_with_metrics, AppError, AppServices, AudioService, FrameOrchestrator,
    GameMode, InputAction, InputEvent, LoopConfig, LoopMetricsSnapshot, MetricsHandle,
    ModeContext, Renderer, SoundId,
};
pub use asset_names::AssetNameError;
pub use assets::{AssetError, AssetProvider, FileAssetProvider};

pub const ROOT_ENV_VAR: &str = "DN2_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub profile_path: PathBuf,
}

/// Why the game data directory could not be located.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot read DN2_ROOT: {0}")]
    EnvVar(#[source] env::VarError),
    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("cannot create {path}: {source}")]
    CreateUserDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("DN2_ROOT={path} has no assets/actors.json")]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "no directory above {searched_from} contains assets/actors.json; \
set DN2_ROOT to the game directory"
    )]
    RootNotFound { searched_from: PathBuf },
}

/// Locates the game directory and makes sure `user_data/` exists.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env_root()? {
        Some(root) => root,
        None => root_above_executable()?,
    };
    app_paths_for_root(root)
}

fn app_paths_for_root(root: PathBuf) -> Result<AppPaths, StartupError> {
    let user_data_dir = root.join("user_data");
    fs::create_dir_all(&user_data_dir).map_err(|source| StartupError::CreateUserDataDir {
        path: user_data_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        assets_dir: root.join("assets"),
        profile_path: user_data_dir.join("profile.json"),
        root,
    })
}

fn env_root() -> Result<Option<PathBuf>, StartupError> {
    let value = match env::var(ROOT_ENV_VAR) {
        Ok(value) => value,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(source) => return Err(StartupError::EnvVar(source)),
    };
    let path = canonical_or_given(Path::new(&value));
    if has_actor_catalog(&path) {
        Ok(Some(path))
    } else {
        Err(StartupError::InvalidEnvRoot { path })
    }
}

fn root_above_executable() -> Result<PathBuf, StartupError> {
    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    let searched_from = exe.parent().unwrap_or(&exe).to_path_buf();
    let found = searched_from
        .ancestors()
        .find(|dir| has_actor_catalog(dir))
        .map(canonical_or_given);
    found.ok_or(StartupError::RootNotFound { searched_from })
}

fn has_actor_catalog(root: &Path) -> bool {
    root.join("assets").join("actors.json").is_file()
}

fn canonical_or_given(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
