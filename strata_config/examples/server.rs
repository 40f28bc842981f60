//! A minimal server configuration resolved from file, environment and flags.
//!
//! Try it with, for example:
//!
//! ```text
//! cargo run --example server -- --port 9090 --db.host db.internal
//! SERVER_TIMEOUT=1m cargo run --example server
//! cargo run --example server -- --help
//! ```

use std::time::Duration;

use strata_config::{Loader, StrataConfig};

#[derive(Debug, Default, StrataConfig)]
struct ServerConfig {
    #[strata(desc = "path to the config file")]
    config: String,
    #[strata(default = "8080", short = 'p', desc = "port to listen on")]
    port: u16,
    #[strata(default = "30s", desc = "request timeout")]
    timeout: Duration,
    #[strata(desc = "verbose logging")]
    verbose: bool,
    #[strata(id = "db")]
    database: DbConfig,
}

#[derive(Debug, Default, StrataConfig)]
struct DbConfig {
    #[strata(default = "localhost", desc = "database host")]
    host: String,
    #[strata(default = "5432", desc = "database port")]
    port: u16,
}

fn main() {
    let mut config = ServerConfig::default();
    let loader = Loader::new()
        .config_file_option("config")
        .default_filename("server.yaml")
        .env_prefix("SERVER_");

    if let Err(err) = loader.load(&mut config) {
        eprintln!("failed to load configuration: {err}");
        std::process::exit(1);
    }

    println!("resolved configuration: {config:#?}");
}
