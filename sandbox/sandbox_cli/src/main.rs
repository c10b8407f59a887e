use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use decision_endpoint::{router, serve, DecisionEndpoint};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use verdict_renderer::{Identity, IdentityGenerator, PageAddress, Theme, VerdictRenderer};

mod config;

use config::SandboxConfig;

#[derive(Parser, Debug)]
#[command(
    name = "verdict-sandbox",
    version,
    about = "Fake login endpoint whose responses carry risk verdicts"
)]
struct Cli {
    /// Sandbox configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the decision endpoint until interrupted.
    Serve {
        /// Overrides `endpoint.bind`.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Posts login attempts from a page URL and prints the rendered verdict.
    Submit(SubmitArgs),
    /// Prints placeholder identities.
    Identity {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// Page address, e.g. `http://127.0.0.1:3000/checkout?workspaceId=ws_1`.
    page_url: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    /// Overrides `renderer.theme`.
    #[arg(long)]
    theme: Option<String>,
    /// Number of consecutive attempts.
    #[arg(long, default_value_t = 1)]
    repeat: usize,
    /// Prints each view as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SandboxConfig::load_or_default(cli.config.as_deref())?;
    init_tracing(&config);
    match cli.command {
        Commands::Serve { bind } => handle_serve(config, bind).await,
        Commands::Submit(args) => handle_submit(config, args).await,
        Commands::Identity { seed, count } => {
            let mut generator =
                seed.map_or_else(IdentityGenerator::from_entropy, IdentityGenerator::seeded);
            for _ in 0..count {
                let identity = generator.generate();
                println!("{}  {}", identity.email, identity.password);
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &SandboxConfig) {
    let fallback = config
        .telemetry
        .level()
        .map_or_else(|_| "info".to_string(), |level| level.to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_serve(config: SandboxConfig, bind: Option<SocketAddr>) -> Result<()> {
    let policy = config.endpoint.policy.build()?;
    let telemetry = config.telemetry.build("decision-endpoint")?;
    let endpoint = Arc::new(DecisionEndpoint::new(policy).with_telemetry(telemetry));
    let addr = bind.unwrap_or(config.endpoint.bind);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(policy = endpoint.policy_name(), "risk policy ready");
    let app = router(endpoint, config.endpoint.body_limit_bytes);
    serve(listener, app, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
}

async fn handle_submit(config: SandboxConfig, args: SubmitArgs) -> Result<()> {
    let page = PageAddress::parse(&args.page_url)?;
    let theme = match &args.theme {
        Some(name) => Theme::by_name(name)?,
        None => config.renderer.resolve_theme()?,
    };
    let telemetry = config.telemetry.build("verdict-renderer")?;
    let renderer = VerdictRenderer::builder(page)
        .transport(Arc::new(config.renderer.transport()?))
        .theme(theme)
        .dashboard(config.renderer.dashboard.clone())
        .telemetry(telemetry)
        .build()?;
    if args.email.is_some() || args.password.is_some() {
        let current = renderer.identity();
        renderer.set_identity(Identity::new(
            args.email.unwrap_or(current.email),
            args.password.unwrap_or(current.password),
        ));
    }
    for attempt in 1..=args.repeat.max(1) {
        let transition = renderer.submit().await;
        let view = renderer.view();
        if args.json {
            let report = json!({
                "attempt": attempt,
                "transition": transition,
                "identity": renderer.identity(),
                "view": view,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            let identity = renderer.identity();
            println!("--- attempt {attempt} as {} ---", identity.email);
            print!("{view}");
        }
    }
    Ok(())
}
