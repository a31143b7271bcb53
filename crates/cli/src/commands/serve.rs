use clap::Args;
use common::config::read_config;
use common::error::ValidatorError;
use shared_clients::default_registry;
use std::path::Path;
use validation_web::run_backend;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind, overrides `server.addr`
    #[arg(long)]
    pub addr: Option<String>,
    /// Probe deadline in milliseconds, overrides `probe.timeout_ms`
    #[arg(long = "probe-timeout-ms")]
    pub probe_timeout_ms: Option<u64>,
}

pub async fn handle_serve(args: ServeArgs, config_path: Option<&Path>) -> Result<(), ValidatorError> {
    let config = read_config(config_path)
        .map_err(|e| ValidatorError::Init(Box::new(e)))?
        .with_overrides(args.addr, args.probe_timeout_ms);
    config
        .validate()
        .map_err(|e| ValidatorError::Init(Box::new(e)))?;

    let registry = default_registry().map_err(|e| ValidatorError::Init(Box::new(e)))?;
    run_backend(&config, registry)
        .await
        .map_err(|e| ValidatorError::Serve(Box::new(e)))
}
