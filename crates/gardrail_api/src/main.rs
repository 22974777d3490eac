//! JSON REST server for the gardrail biomedical catalog.

use gardrail_api::{setup_and_serve, ApiContext, Config};
use gardrail_core::db::open_db;
use gardrail_core::init_logging;
use log::info;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("logging setup failed: {err}");
            std::process::exit(2);
        }
    }

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("cannot open catalog database `{}`: {err}", config.db_path);
            std::process::exit(1);
        }
    };
    info!(
        "event=app_start module=api status=ok db_path={}",
        config.db_path
    );

    if let Err(err) = setup_and_serve(ApiContext::new(conn), config.port).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
