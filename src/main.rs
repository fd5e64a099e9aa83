use clap::Parser;
use dynamic_deploy::action::{ActionOutputs, load_envelope};
use dynamic_deploy::error::Result;
use dynamic_deploy::logging::{FileLogger, setup_logging};
use dynamic_deploy::{DeployConfig, Dispatcher};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Forward the triggering CI event to the dynamic deploy service
#[derive(Debug, Parser)]
#[command(version)]
struct Opts {
    /// Base URL of the deploy service; the event is POSTed to `<endpoint>/add`
    #[arg(long, env = "INPUT_DYNAMIC_DEPLOY_ENDPOINT")]
    endpoint: Option<String>,

    /// Name of the triggering event, e.g. `pull_request`
    #[arg(long, env = "GITHUB_EVENT_NAME", default_value = "")]
    event_name: String,

    /// JSON file holding the event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(long, env = "DEPLOY_CONFIG")]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "INPUT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Also write logs to a rolling file in this directory
    #[arg(long, env = "DEPLOY_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Build and log the request without sending it
    #[arg(long, env = "INPUT_DRY_RUN")]
    dry_run: bool,

    #[arg(long, env = "GITHUB_OUTPUT", hide = true)]
    github_output: Option<PathBuf>,
}

impl Opts {
    /// Config file values, overridden by flags and Actions inputs
    fn resolve_config(&self) -> Result<DeployConfig> {
        let from_file = match &self.config {
            Some(path) => {
                info!("Using config at {:?}", path);
                DeployConfig::load(path)?
            }
            None => DeployConfig::default(),
        };

        Ok(from_file.merge(DeployConfig {
            endpoint: self.endpoint.clone(),
            timeout_secs: self.timeout_secs,
        }))
    }
}

async fn run(opts: &Opts) -> Result<String> {
    if let Ok(cwd) = std::env::current_dir() {
        info!("working in: {}", cwd.display());
    }

    let config = opts.resolve_config()?;
    let dispatcher = Dispatcher::new(&config)?.with_dry_run(opts.dry_run);
    info!("Deploy endpoint: {}", dispatcher.endpoint());
    let envelope = load_envelope(&opts.event_name, opts.event_path.as_deref())?;

    dispatcher.dispatch(&envelope).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let opts = Opts::parse();

    let file_logger = opts.log_dir.clone().map(FileLogger::new);
    let _guard = match setup_logging(file_logger.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("File logging disabled: {}", e);
            setup_logging(None).ok().flatten()
        }
    };

    let outputs = ActionOutputs::new(opts.github_output.clone());
    let result = run(&opts).await;
    outputs.report(&result)
}
