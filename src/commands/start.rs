use tracing::error;

use super::Cli;
use crate::app::relayer::run_relayer_daemon;
use crate::config::Config;

pub async fn execute(cli: &Cli) {
    let conf = match Config::from_file(&cli.home) {
        Ok(conf) => conf,
        Err(e) => {
            error!("Failed to load config from {}: {e}", &cli.home);
            return;
        }
    };
    run_relayer_daemon(conf).await;
}
