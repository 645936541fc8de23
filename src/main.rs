mod arranger;
mod catalog;
mod config;
mod data;
mod error;
mod planner;
mod server;
mod solver;
mod validator;

use log::{error, warn};

#[tokio::main]
async fn main() {
    let config = config::Config::from_env();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    for var in &config.rejected_vars {
        warn!("Ignoring unparseable {}, using the default", var);
    }

    let state = match server::AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Could not start the arrangement pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::run_server(&config, state).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
