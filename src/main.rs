//! pext main entry point

use clap::Parser;
use pext_config::Config;
use pext_seed::SeedImporter;
use pext_store::Store;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pext")]
#[command(version = "0.1.0")]
#[command(about = "A lightweight personal-finance tracker with file-backed JSON storage", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = if args.config.exists() {
        Config::load(args.config.clone())?
    } else {
        log::warn!(
            "Config file {} not found, using defaults",
            args.config.display()
        );
        Config::default()
    };

    log::info!(
        "Config loaded: data path={}, registry={}",
        config.storage.path.display(),
        config.storage.registry_file
    );

    let store = Store::open(&config)?;

    // The importer runs before anything touches the store and never aborts
    // startup; an empty store is a valid starting state.
    if config.seed.enable {
        let report = SeedImporter::run(&store, &config.seed_path());
        log::info!(
            "Seed import finished: {} users adopted, {} shards materialized",
            report.users_adopted,
            report.shards_materialized
        );
    } else {
        log::info!("Seed import disabled");
    }

    log::info!(
        "Store ready: {} users, {} banks, {} shards",
        store.users().len(),
        store.banks().list().len(),
        store.shards().user_ids().len()
    );

    Ok(())
}
