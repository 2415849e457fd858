use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use keepsake::config::{Opts, Parameters};
use keepsake::error::Result;
use keepsake::server::{self, AppState};
use keepsake::session::SessionKeys;
use keepsake::state::Database;
use keepsake::vault::Vault;

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    setup_log(opts.dbg);

    if let Err(e) = run(opts).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(opts: Opts) -> Result<()> {
    if let Some(path) = &opts.config {
        let params = Parameters::load(path)?;
        debug!(volumes = params.volumes.len(), "loaded config file");
    }

    let secret = opts.decode_secret()?;

    let db = Database::connect(&opts.dburi, opts.timeout()).await?;
    db.migrate().await?;

    std::fs::create_dir_all(&opts.blobs_dir)?;

    let state = AppState {
        vault: Vault::new(db, opts.blobs_dir.clone()),
        sessions: SessionKeys::new(&secret, opts.lifespan()),
    };

    server::serve(state, &opts.listen, opts.timeout()).await
}

fn setup_log(dbg: bool) {
    let default_level = if dbg { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}
