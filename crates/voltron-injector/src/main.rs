use std::process;

use anyhow::Result;
use tracing::{error, info};
use voltron_injector::{InjectorServer, cli, config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = config::Config::from_args(&matches)?;

    // We cannot rely on `tracing` until the subscriber is in place
    if let Err(e) = logging::setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)
    {
        eprintln!("Error setting up tracing: {e}");
        process::exit(1);
    }

    info!(
        service = config::SERVICE_NAME,
        version = env!("CARGO_PKG_VERSION"),
        address = config.addr.to_string().as_str(),
        tls = config.tls_config.is_some(),
        "starting"
    );

    let server = match InjectorServer::new_from_config(config).await {
        Ok(server) => server,
        Err(e) => fatal_error(e.to_string()),
    };

    if let Err(e) = server.run().await {
        fatal_error(e.to_string());
    }

    Ok(())
}

fn fatal_error(msg: String) -> ! {
    error!("{}", msg);
    process::exit(1);
}
