use std::process::ExitCode;

use dn2_engine::run_app;
use tracing::{error, info};

use super::bootstrap::{build_app, GameError};
use super::profile::save_profile;

pub(crate) fn run() -> ExitCode {
    match try_run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

fn try_run() -> Result<(), GameError> {
    let app = build_app()?;
    run_app(app.config, app.services, Box::new(app.menu))?;

    save_profile(&app.profile_path, &app.profile.borrow())?;
    info!("shutdown_complete");
    Ok(())
}
