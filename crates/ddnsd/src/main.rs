// # ddnsd - DDNS HTTP Endpoint
//
// ⚠️ ARCHITECTURAL CONSTRAINTS ⚠️
//
// - This is a THIN integration layer ONLY
// - DO NOT add DNS logic here: validation, zone resolution and record
//   reconciliation live in ddns-reconciler
// - Configuration is via environment variables ONLY
// - The caller's API token arrives per request and is never logged
//
// The ddnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and logging
// 3. Registering providers
// 4. Serving the update endpoint until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Server
// - `DDNS_LISTEN_ADDR`: Socket address to bind (default `0.0.0.0:8080`)
//
// ### DNS Provider
// - `DDNS_PROVIDER_TYPE`: Provider type (cloudflare)
// - `DDNS_CLOUDFLARE_API_BASE`: API base URL (default: public Cloudflare API v4)
// - `DDNS_HTTP_TIMEOUT_SECS`: Per-request provider timeout (default 30)
// - `DDNS_MODE`: `live` (default) or `dry-run`
//
// ### Records
// - `DDNS_RECORD_TTL`: TTL written on records (default 1 = automatic)
//
// ### Logging
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DDNS_LISTEN_ADDR=127.0.0.1:8080
// export DDNS_MODE=dry-run
//
// ddnsd
// curl 'http://127.0.0.1:8080/update?cf_key=...&domain=home.example.com&ipv4=1.2.3.4'
// ```

mod http;

use anyhow::{Context, Result};
use ddns_reconciler::config::DEFAULT_CLOUDFLARE_API_BASE;
use ddns_reconciler::diagnostics::DIAGNOSTIC_TARGET;
use ddns_reconciler::traits::AUTO_TTL;
use ddns_reconciler::{DdnsConfig, EngineConfig, ProviderConfig, ProviderRegistry};
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    listen_addr: String,
    provider_type: String,
    cloudflare_api_base: String,
    http_timeout_secs: u64,
    mode: String,
    record_ttl: u32,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            listen_addr: lookup("DDNS_LISTEN_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            provider_type: lookup("DDNS_PROVIDER_TYPE")
                .unwrap_or_else(|| "cloudflare".to_string()),
            cloudflare_api_base: lookup("DDNS_CLOUDFLARE_API_BASE")
                .unwrap_or_else(|| DEFAULT_CLOUDFLARE_API_BASE.to_string()),
            http_timeout_secs: parse_var(&lookup, "DDNS_HTTP_TIMEOUT_SECS", 30)?,
            mode: lookup("DDNS_MODE").unwrap_or_else(|| "live".to_string()),
            record_ttl: parse_var(&lookup, "DDNS_RECORD_TTL", AUTO_TTL)?,
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.listen_addr.parse::<SocketAddr>().with_context(|| {
            format!(
                "DDNS_LISTEN_ADDR '{}' is not a socket address (e.g. 0.0.0.0:8080)",
                self.listen_addr
            )
        })?;

        // Validate provider type
        match self.provider_type.as_str() {
            "cloudflare" => {} // Currently supported
            _ => anyhow::bail!(
                "DDNS_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: cloudflare",
                self.provider_type
            ),
        }

        match self.mode.as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        // Validate numeric ranges
        if !(1..=300).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "DDNS_HTTP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        // Cloudflare accepts 1 (automatic) or 60..=86400
        if self.record_ttl != AUTO_TTL && !(60..=86400).contains(&self.record_ttl) {
            anyhow::bail!(
                "DDNS_RECORD_TTL must be 1 (automatic) or between 60 and 86400. Got: {}",
                self.record_ttl
            );
        }

        // Validate log level
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.ddns_config().validate()?;
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        self.mode == "dry-run"
    }

    /// Library configuration derived from the environment
    fn ddns_config(&self) -> DdnsConfig {
        DdnsConfig {
            provider: ProviderConfig::Cloudflare {
                api_base: self.cloudflare_api_base.clone(),
                timeout_secs: self.http_timeout_secs,
                dry_run: self.is_dry_run(),
            },
            engine: EngineConfig {
                ttl: self.record_ttl,
            },
        }
    }
}

/// Filter at `level`; the per-request diagnostic stream passes at INFO
/// regardless, since requests opt into it with `log=true`
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{},{}=info", level.to_lowercase(), DIAGNOSTIC_TARGET))
}

/// Parse an optional numeric variable, falling back to `default` when unset
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number. Got: '{}'", key, raw)),
        None => Ok(default),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(&config.log_level))
        .with_target(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> Result<()> {
    let registry = ProviderRegistry::new();

    info!("Registering Cloudflare provider");
    ddns_provider_cloudflare::register(&registry);
    info!("Registered providers: {}", registry.list_providers().join(", "));

    if config.is_dry_run() {
        warn!("DRY-RUN mode: records are read but never written");
    }
    info!("Provider type: {}", config.provider_type);
    info!("Provider API base: {}", config.cloudflare_api_base);
    info!("Record TTL: {}", config.record_ttl);

    let state = http::AppState::new(Arc::new(registry), config.ddns_config());
    let app = http::router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match wait_for_shutdown().await {
                Ok(signal) => info!("Received shutdown signal: {}", signal),
                Err(e) => error!("Shutdown handler error: {}", e),
            }
        })
        .await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
