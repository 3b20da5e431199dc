use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use regauth::config::{CommonConfig, ConfigArgs};
use regauth::server::config::ServerConfig;
use regauth::server::factory::ServerFactory;

/// Token authorization server for container registries. Clients authenticate
/// with Basic auth and receive a signed token granting the repository actions
/// the configured rules allow.
#[derive(Parser)]
#[command(author, version, about)]
struct ServerArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Print the resolved config as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

impl ServerArgs {
    async fn run(&self) -> Result<()> {
        let ps = self.config.build_path_set()?;
        let cfg: ServerConfig = ps.load_config("server", ServerConfig::default)?;

        if self.print_config {
            let json = serde_json::to_string_pretty(&cfg).context("encode config")?;
            println!("{json}");
            return Ok(());
        }

        cfg.logs.init("regauth")?;
        info!(
            "Loaded {} rules and {} users from '{}'",
            cfg.authz.rules.len(),
            cfg.authn.users.len(),
            ps.config_path.display()
        );

        let factory = ServerFactory::new(cfg);
        let srv = factory.build_server()?;
        srv.run().await
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServerArgs::parse();
    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            _ = writeln!(io::stderr(), "Fatal: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
