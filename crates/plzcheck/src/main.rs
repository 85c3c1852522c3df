// # plzcheck - interactive locality / postal code form
//
// A thin line-oriented front end for the PLZ sync engine. Every field edit
// goes through plz-core; this binary only wires configuration, logging and
// the terminal to it.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `PLZ_LOOKUP_URL`: Base URL of the OpenPLZ API (default https://openplzapi.org)
// - `PLZ_HTTP_TIMEOUT_SECS`: Per-request timeout in seconds (default 10)
// - `PLZ_DEBOUNCE_MS`: Quiet period before a field value is looked up (default 1000)
// - `PLZ_LOG_LEVEL`: trace, debug, info, warn or error (default info)
//
// ## Commands
//
// One command per line on stdin:
//
// ```text
// locality <text>   set the locality field
// plz <text>        set the postal code field
// select <code>     pick a postal code from the candidates
// reset             clear the form
// show              print the current form state
// wait <ms>         pause reading input (handy in scripts)
// quit              exit
// ```
//
// Every state change is printed to stdout as one JSON line; logs go to stderr.
//
// ## Example
//
// ```bash
// printf 'locality München\nwait 2000\nselect 80331\nquit\n' | plzcheck
// ```

use anyhow::Result;
use plz_core::config::{DEFAULT_OPENPLZ_URL, EngineConfig, LookupServiceConfig, SyncConfig};
use plz_core::{EngineEvent, EngineHandle, FieldState, LookupServiceRegistry, SyncEngine};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum PlzExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<PlzExitCode> for ExitCode {
    fn from(code: PlzExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    lookup_url: String,
    http_timeout_secs: u64,
    debounce_ms: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            lookup_url: lookup("PLZ_LOOKUP_URL")
                .unwrap_or_else(|| DEFAULT_OPENPLZ_URL.to_string()),
            http_timeout_secs: parse_number(&lookup, "PLZ_HTTP_TIMEOUT_SECS", 10)?,
            debounce_ms: parse_number(&lookup, "PLZ_DEBOUNCE_MS", 1000)?,
            log_level: lookup("PLZ_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.lookup_url.starts_with("https://") && !self.lookup_url.starts_with("http://") {
            anyhow::bail!(
                "PLZ_LOOKUP_URL must use HTTP or HTTPS scheme. Got: {}",
                self.lookup_url
            );
        }

        if !(1..=120).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "PLZ_HTTP_TIMEOUT_SECS must be between 1 and 120 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        if self.log_level().is_none() {
            anyhow::bail!(
                "PLZ_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        self.sync_config().validate()?;
        Ok(())
    }

    /// Tracing level for the configured log level
    fn log_level(&self) -> Option<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }

    /// Core configuration derived from the environment
    fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            lookup: LookupServiceConfig::OpenPlz {
                base_url: self.lookup_url.clone(),
                timeout_secs: self.http_timeout_secs,
            },
            engine: EngineConfig::default().with_debounce_ms(self.debounce_ms),
        }
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer. Got: {}", key, raw)),
        None => Ok(default),
    }
}

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Locality(String),
    PostalCode(String),
    Select(String),
    Reset,
    Show,
    Wait(Duration),
    Quit,
}

/// Parse one input line
///
/// Blank lines yield `Ok(None)`. Field values keep their inner spacing; an
/// empty value clears the field.
fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_lowercase().as_str() {
        "locality" | "ort" => Command::Locality(rest.to_string()),
        "plz" | "postal_code" => Command::PostalCode(rest.to_string()),
        "select" => {
            if rest.is_empty() {
                anyhow::bail!("select needs a postal code");
            }
            Command::Select(rest.to_string())
        }
        "reset" => Command::Reset,
        "show" => Command::Show,
        "wait" => {
            let ms: u64 = rest
                .parse()
                .map_err(|_| anyhow::anyhow!("wait needs a duration in milliseconds"))?;
            Command::Wait(Duration::from_millis(ms))
        }
        "quit" | "exit" => Command::Quit,
        other => anyhow::bail!("Unknown command '{}'", other),
    };

    Ok(Some(command))
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return PlzExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return PlzExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level().unwrap_or(Level::INFO))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PlzExitCode::ConfigError.into();
    }

    info!("Starting plzcheck against {}", config.lookup_url);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PlzExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let (engine, handle, events) = match build_engine(&config) {
            Ok(parts) => parts,
            Err(e) => {
                error!("Startup error: {}", e);
                return PlzExitCode::ConfigError;
            }
        };

        match run(engine, handle, events).await {
            Ok(()) => PlzExitCode::CleanShutdown,
            Err(e) => {
                error!("Runtime error: {}", e);
                PlzExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Register lookup services and build the engine
fn build_engine(config: &Config) -> Result<(SyncEngine, EngineHandle, mpsc::Receiver<EngineEvent>)> {
    let registry = LookupServiceRegistry::new();

    #[cfg(feature = "openplz")]
    {
        info!("Registering OpenPLZ lookup service");
        plz_lookup_openplz::register(&registry);
    }

    let sync_config = config.sync_config();
    let service = registry.create_lookup_service(&sync_config.lookup)?;
    info!(
        "Using {} lookup service, debounce {} ms",
        service.service_name(),
        sync_config.engine.debounce_ms
    );
    Ok(SyncEngine::new(service, sync_config.engine)?)
}

/// Drive the engine from stdin until quit, EOF or Ctrl-C
async fn run(
    engine: SyncEngine,
    handle: EngineHandle,
    mut events: mpsc::Receiver<EngineEvent>,
) -> Result<()> {
    let engine_task = tokio::spawn(engine.run());

    let mut states = handle.watch();
    let printer = tokio::spawn(async move {
        while let Some(state) = states.next().await {
            print_state(&state);
        }
    });

    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "Engine event");
        }
    });

    let session = read_commands(&handle).await;

    // The engine applies every queued command, then stops once the last handle is gone
    drop(handle);
    let engine_result = engine_task.await;

    // Both streams end when the engine drops its state store and event sender
    let _ = printer.await;
    let _ = event_log.await;

    session?;
    engine_result.map_err(|e| anyhow::anyhow!("Engine task failed: {}", e))??;

    info!("plzcheck stopped");
    Ok(())
}

/// Forward stdin commands to the engine
async fn read_commands(handle: &EngineHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT");
                return Ok(());
            }
        };

        let Some(line) = line else {
            debug!("End of input");
            return Ok(());
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        match command {
            Command::Locality(value) => handle.set_locality(value).await?,
            Command::PostalCode(value) => handle.set_postal_code(value).await?,
            Command::Select(code) => handle.select_candidate(code).await?,
            Command::Reset => handle.reset().await?,
            Command::Show => print_state(&handle.state()),
            Command::Wait(duration) => tokio::time::sleep(duration).await,
            Command::Quit => return Ok(()),
        }
    }
}

fn print_state(state: &FieldState) {
    match serde_json::to_string(state) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to encode state: {}", e),
    }
}
