//! Command-line host for an OIDC session.
//!
//! Run with: `oidc-session <command>`
//!
//! This is a CLI tool, so `println!` and `eprintln!` are intentionally used
//! for user-facing output; diagnostics go through `tracing`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use oidc_session_common::auth::{
    AuthorizeRequest, EndSessionRequest, InteractiveBrowser, NetworkReachability, OidcClient,
    ProviderError, ProviderLogin,
};
use oidc_session_common::{KeychainProvider, SessionManager, TokenStore};
use oidc_session_domain::constants::DEFAULT_KEYCHAIN_SERVICE;
use oidc_session_domain::{AuthConfig, TokenResult};
use oidc_session_infra::config::ConfigLoader;
use oidc_session_infra::{
    init_tracing, AuthenticatedClient, ConnectivityConfig, ConnectivityMonitor, ForecastRepository,
    HttpClient, HttpUserInfoProbe, LogFormat,
};
use tracing::debug;

type Session = SessionManager<OidcClient<UnavailableBrowser>, HttpUserInfoProbe, KeychainProvider>;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    let format = env::var("OIDC_SESSION_LOG_FORMAT").map(|v| LogFormat::parse(&v)).unwrap_or_default();
    init_tracing("info", format);

    let command = env::args().nth(1);

    let result = match command.as_deref() {
        Some("status") => run_status().await,
        Some("userinfo") => run_user_info().await,
        Some("login") => run_login().await,
        Some("logout") => run_logout().await,
        Some("forecast") => run_forecast().await,
        Some("config") => run_config(),
        Some("help") | None => {
            print_help();
            Ok(())
        }
        Some(unknown) => {
            eprintln!("Unknown command: {unknown}");
            eprintln!();
            print_help();
            Err(anyhow!("Unknown command"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Command failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("OIDC Session");
    println!();
    println!("USAGE:");
    println!("    oidc-session <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    status    Show the persisted session and validate it");
    println!("    userinfo  Fetch the user-info document with the current token");
    println!("    login     Run the interactive login flow");
    println!("    logout    End the session at the provider and locally");
    println!("    forecast  Call the protected API with the current token");
    println!("    config    Print the effective configuration");
    println!("    help      Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    OIDC_SESSION_CONFIG_DIR        Directory holding appsettings files (default: .)");
    println!("    OIDC_SESSION_KEYCHAIN_SERVICE  Keychain service name");
    println!("    OIDC_SESSION_LOG_FORMAT        `json` for JSON log lines");
    println!("    OIDC_SESSION_*                 Settings overrides, see the config loader");
}

/// Front channel for hosts without a system browser integration
struct UnavailableBrowser;

#[async_trait]
impl InteractiveBrowser for UnavailableBrowser {
    async fn login(&self, _request: &AuthorizeRequest) -> Result<ProviderLogin, ProviderError> {
        Err(ProviderError::Browser("interactive login is not available in this host".into()))
    }

    async fn logout(&self, _request: &EndSessionRequest) -> Result<(), ProviderError> {
        Err(ProviderError::Browser("interactive logout is not available in this host".into()))
    }
}

/// Everything a command needs, wired once
struct App {
    config: Arc<AuthConfig>,
    session: Session,
    // Keeps the background probe alive for the session's lifetime
    _monitor: Arc<ConnectivityMonitor>,
}

fn load_config() -> anyhow::Result<AuthConfig> {
    let dir = env::var("OIDC_SESSION_CONFIG_DIR").map_or_else(|_| PathBuf::from("."), PathBuf::from);
    debug!(dir = %dir.display(), "Loading settings");
    ConfigLoader::new(&dir)
        .load()
        .with_context(|| format!("failed to load settings from {}", dir.display()))
}

async fn build_app() -> anyhow::Result<App> {
    let config = Arc::new(load_config()?);

    let service = env::var("OIDC_SESSION_KEYCHAIN_SERVICE")
        .unwrap_or_else(|_| DEFAULT_KEYCHAIN_SERVICE.to_string());
    let store = Arc::new(TokenStore::new(Arc::new(KeychainProvider::new(service))));

    let connectivity = ConnectivityConfig::for_authority(&config.oidc.authority)
        .context("invalid authority")?;
    let mut monitor = ConnectivityMonitor::new(connectivity);
    monitor.start().await.context("failed to start connectivity monitor")?;
    let monitor = Arc::new(monitor);
    let network: Arc<dyn NetworkReachability> = monitor.clone();

    let provider = Arc::new(
        OidcClient::new(Arc::clone(&config), Arc::new(UnavailableBrowser))
            .context("failed to build HTTP client")?,
    );
    let probe = Arc::new(HttpUserInfoProbe::new().context("failed to build HTTP client")?);

    let session = SessionManager::new(Arc::clone(&config), store, provider, probe, network);
    session.initialize().await.context("failed to read the persisted session")?;

    Ok(App { config, session, _monitor: monitor })
}

async fn run_status() -> anyhow::Result<()> {
    let app = build_app().await?;
    let tokens = app.session.token_store().snapshot();

    println!("state:       {}", app.session.state());
    match tokens.usable_expiration() {
        Some(at) => println!("expires at:  {}", at.to_rfc3339()),
        None => println!("expires at:  -"),
    }
    match app.session.scheduled_refresh_delay() {
        Some(delay) => println!("next refresh in {}s", delay.as_secs()),
        None => println!("no refresh scheduled"),
    }

    if app.session.is_authenticated() {
        println!("validation:  {}", app.session.validate_token().await);
    }
    Ok(())
}

async fn run_user_info() -> anyhow::Result<()> {
    let app = build_app().await?;
    let info = app.session.get_user_info::<serde_json::Value>().await;

    println!("status: {}", info.status);
    if let Some(value) = info.value {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

async fn run_login() -> anyhow::Result<()> {
    let app = build_app().await?;
    let login = app.session.try_login().await;

    println!("result: {}", login.result);
    if let Some(message) = &login.error_message {
        println!("error:  {message}");
    }
    if let Some(user) = &login.user {
        println!("{}", serde_json::to_string_pretty(user)?);
    }

    match login.result {
        TokenResult::Valid => Ok(()),
        other => Err(anyhow!("login did not complete: {other}")),
    }
}

async fn run_logout() -> anyhow::Result<()> {
    let app = build_app().await?;
    let logout = app.session.try_logout().await;

    println!("status: {}", logout.status);
    if let Some(message) = &logout.error_message {
        println!("error:  {message}");
    }
    Ok(())
}

async fn run_forecast() -> anyhow::Result<()> {
    let app = build_app().await?;
    let api_url =
        app.config.api_url.clone().context("Auth.ApiUrl is not configured")?;

    let validation = app.session.validate_token().await;
    if validation != TokenResult::Valid {
        return Err(anyhow!("session is not valid: {validation}"));
    }

    let http = HttpClient::new().context("failed to build HTTP client")?;
    let client = AuthenticatedClient::new(http, Arc::clone(app.session.token_store()));
    let repository = ForecastRepository::new(client, &api_url)?;
    let forecast = repository.get_forecast().await?;

    println!("date:        {}", forecast.date.to_rfc3339());
    println!("temperature: {}°C / {}°F", forecast.temperature_c, forecast.fahrenheit());
    if let Some(summary) = &forecast.summary {
        println!("summary:     {summary}");
    }
    Ok(())
}

fn run_config() -> anyhow::Result<()> {
    let config = load_config()?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    println!();
    println!("redirect uri:   {}", config.redirect_uri());
    println!("token endpoint: {}", config.oidc.token_url());
    Ok(())
}
