// # livedns - DNS record reconciler
//
// Thin command-line layer over livedns-core. It is responsible for:
// 1. Reading the declared records and settings
// 2. Initializing logging and the runtime
// 3. Registering record stores and state stores
// 4. Running one engine operation and reporting the result
//
// ## Usage
//
// ```text
// livedns plan          show what apply would change
// livedns apply         refresh, plan and apply
// livedns refresh       refresh local state from the remote store
// livedns destroy       delete every managed record
// livedns import ID     adopt an existing record set (zone/name/type)
// ```
//
// ## Configuration
//
// - `LIVEDNS_CONFIG`: Path to the JSON configuration (required)
// - `LIVEDNS_API_KEY`: Gandi API key, overrides the file
// - `LIVEDNS_API_URL`: Gandi API base URL, overrides the file
// - `LIVEDNS_STATE_PATH`: Use a file state store at this path
// - `LIVEDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
// - `LIVEDNS_MODE`: `dry-run` to log writes instead of sending them
//
// ## Example
//
// ```bash
// export LIVEDNS_CONFIG=/etc/livedns/records.json
// export LIVEDNS_API_KEY=your_key
// export LIVEDNS_STATE_PATH=/var/lib/livedns/state.json
//
// livedns apply
// ```

use anyhow::{Context, Result};
use livedns_core::config::{LiveDnsConfig, StateStoreConfig, StoreConfig};
use livedns_core::{EngineEvent, ReconcileEngine, StoreRegistry};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Run completed without failures
/// - 1: Configuration or startup error
/// - 2: Runtime error, including records that failed to reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiveDnsExitCode {
    /// Clean run
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<LiveDnsExitCode> for ExitCode {
    fn from(code: LiveDnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Operation requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Plan,
    Apply,
    Refresh,
    Destroy,
    Import(String),
}

impl Command {
    fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut args = args.into_iter();
        let command = match args.next().as_deref() {
            Some("plan") => Command::Plan,
            Some("apply") => Command::Apply,
            Some("refresh") => Command::Refresh,
            Some("destroy") => Command::Destroy,
            Some("import") => match args.next() {
                Some(id) => Command::Import(id),
                None => anyhow::bail!("import requires a record id: zone/name/type"),
            },
            Some(other) => anyhow::bail!(
                "Unknown command '{}'. Usage: livedns <plan|apply|refresh|destroy|import ID>",
                other
            ),
            None => anyhow::bail!("Usage: livedns <plan|apply|refresh|destroy|import ID>"),
        };

        if let Some(extra) = args.next() {
            anyhow::bail!("Unexpected argument '{}'", extra);
        }
        Ok(command)
    }
}

/// Application configuration
struct Config {
    config_path: PathBuf,
    api_key: Option<String>,
    api_url: Option<String>,
    state_path: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            config_path: env::var("LIVEDNS_CONFIG")
                .map(PathBuf::from)
                .context("LIVEDNS_CONFIG is required. Set it via: export LIVEDNS_CONFIG=/path/to/records.json")?,
            api_key: env::var("LIVEDNS_API_KEY").ok(),
            api_url: env::var("LIVEDNS_API_URL").ok(),
            state_path: env::var("LIVEDNS_STATE_PATH").ok(),
            log_level: env::var("LIVEDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Read the JSON configuration and apply environment overrides
    fn load(&self) -> Result<LiveDnsConfig> {
        let raw = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read {}", self.config_path.display()))?;
        let mut config: LiveDnsConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.config_path.display()))?;
        self.apply_overrides(&mut config)?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut LiveDnsConfig) -> Result<()> {
        if self.api_key.is_some() || self.api_url.is_some() {
            match &mut config.store {
                StoreConfig::Gandi { api_key, api_url } => {
                    if let Some(key) = &self.api_key {
                        *api_key = key.clone();
                    }
                    if let Some(url) = &self.api_url {
                        *api_url = Some(url.clone());
                    }
                }
                other => anyhow::bail!(
                    "LIVEDNS_API_KEY/LIVEDNS_API_URL only apply to the gandi store, not '{}'",
                    other.type_name()
                ),
            }
        }

        if let Some(path) = &self.state_path {
            if path.is_empty() {
                anyhow::bail!("LIVEDNS_STATE_PATH cannot be empty");
            }
            config.state_store = StateStoreConfig::File { path: path.clone() };
        }

        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "LIVEDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    let command = match Command::from_args(env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return LiveDnsExitCode::ConfigError.into();
        }
    };

    let env_config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return LiveDnsExitCode::ConfigError.into();
        }
    };

    let log_level = match env_config.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return LiveDnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return LiveDnsExitCode::ConfigError.into();
    }

    let config = match env_config.load().and_then(|c| {
        c.validate()?;
        Ok(c)
    }) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration validation error: {:#}", e);
            return LiveDnsExitCode::ConfigError.into();
        }
    };

    info!(
        "Loaded {} record(s) from {}",
        config.records.len(),
        env_config.config_path.display()
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return LiveDnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(command, config).await {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                LiveDnsExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the stores and the engine, then run one operation
async fn run(command: Command, config: LiveDnsConfig) -> Result<LiveDnsExitCode> {
    let registry = StoreRegistry::with_builtins();

    #[cfg(feature = "gandi")]
    {
        debug!("Registering Gandi LiveDNS store");
        livedns_provider_gandi::register(&registry);
    }

    let store = registry
        .create_store(&config.store)
        .context("Failed to create record store")?;
    let state_store = registry
        .create_state_store(&config.state_store)
        .await
        .context("Failed to create state store")?;

    let (engine, mut events) = ReconcileEngine::new(store, state_store, config)?;

    let monitor = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let code = execute(&engine, command).await;

    // Closing the sender lets the monitor drain and stop
    drop(engine);
    if let Err(e) = monitor.await {
        debug!("Event monitor ended abnormally: {}", e);
    }

    code
}

async fn execute(engine: &ReconcileEngine, command: Command) -> Result<LiveDnsExitCode> {
    let summary = match command {
        Command::Plan => {
            let changes = engine.plan().await?;
            let pending = changes.iter().filter(|c| c.is_change()).count();
            for change in &changes {
                println!("{}", change);
            }
            println!("Plan: {} change(s), {} unchanged", pending, changes.len() - pending);
            return Ok(LiveDnsExitCode::Success);
        }
        Command::Import(id) => {
            let record = engine.import(&id).await?;
            println!("Imported {} with values {:?}", record.id, record.values);
            return Ok(LiveDnsExitCode::Success);
        }
        Command::Apply => engine.apply().await?,
        Command::Refresh => engine.refresh().await?,
        Command::Destroy => engine.destroy().await?,
    };

    println!(
        "{} created, {} updated, {} deleted, {} unchanged, {} drifted, {} failed",
        summary.created.len(),
        summary.updated.len(),
        summary.deleted.len(),
        summary.unchanged.len(),
        summary.drifted.len(),
        summary.failed.len()
    );
    for (id, message) in &summary.failed {
        eprintln!("failed: {}: {}", id, message);
    }

    if summary.is_success() {
        Ok(LiveDnsExitCode::Success)
    } else {
        Ok(LiveDnsExitCode::RuntimeError)
    }
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::Failed { id, error } => debug!(record = %id, "event: failed: {}", error),
        EngineEvent::Deleted { id, outcome } => debug!(record = %id, "event: deleted ({:?})", outcome),
        other => debug!("event: {:?}", other),
    }
}
