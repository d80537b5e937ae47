use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use headshot_client::app_state::AppState;
use headshot_client::config::AppConfig;
use headshot_client::models::job::{JobId, StyleSelection};
use headshot_client::models::order::{OrderId, TeamSize};
use headshot_client::models::upload::UploadCandidate;
use headshot_client::services::{
    account::AccountError,
    api_client::ApiError,
    assets::AssetError,
    catalog::CatalogError,
    dashboard::DashboardError,
    poller::{PollError, PollState},
    pricing,
    rerun::RerunError,
    retry::RetryPolicy,
    submission::{SubmissionError, SubmissionRequest},
    support::SupportError,
};

#[derive(Parser, Debug)]
#[command(name = "headshot")]
#[command(about = "Command-line client for the HeadShot AI headshot service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Service base URL (overrides HEADSHOT_API_BASE_URL)
    #[arg(long)]
    api_base_url: Option<String>,

    /// Bearer token (overrides HEADSHOT_TOKEN)
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the package catalog
    Packages,
    /// Price a package for a team
    Quote {
        /// Plan id (e.g. "basic")
        plan: String,
        /// Team size; non-numeric input counts as 1
        #[arg(short, long, default_value = "1")]
        team_size: String,
    },
    /// Validate selfies, place an order and queue a generation job
    Submit {
        #[arg(short, long)]
        plan: String,
        #[arg(short, long, default_value = "1")]
        team_size: String,
        #[arg(long, default_value = "corporate")]
        style: String,
        #[arg(long, default_value = "office")]
        background: String,
        #[arg(long, default_value = "business")]
        outfit: String,
        /// Keep polling until the job finishes
        #[arg(short, long)]
        wait: bool,
        /// Selfie files (at least 8)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Show one job's current status
    Status {
        #[arg(value_name = "JOB_ID")]
        job_id: JobId,
    },
    /// Poll a job until it completes, fails or polling gives up
    Watch {
        #[arg(value_name = "JOB_ID")]
        job_id: JobId,
    },
    /// Start a derivative job from an existing one
    Rerun {
        #[arg(value_name = "JOB_ID")]
        job_id: JobId,
        /// Keep polling until the new job finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// List a completed job's downloadable assets
    Assets {
        #[arg(value_name = "JOB_ID")]
        job_id: JobId,
        /// Retry while the assets are not ready yet
        #[arg(long)]
        retry: bool,
    },
    /// List orders
    Orders,
    /// List jobs
    Jobs,
    /// Delete an order and its jobs
    DeleteOrder {
        #[arg(value_name = "ORDER_ID")]
        order_id: OrderId,
    },
    /// Delete a job
    DeleteJob {
        #[arg(value_name = "JOB_ID")]
        job_id: JobId,
    },
    /// Open a support ticket
    Support {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        order_id: Option<OrderId>,
        #[arg(short, long)]
        message: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Log in and print the session token
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the data retention policy
    Privacy,
    /// List branding crop previews
    Previews,
    /// Show dashboard counters
    Metrics,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Rerun(#[from] RerunError),
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Support(#[from] SupportError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error("could not read {path}: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("polling for job #{0} did not finish")]
    Unsettled(JobId),
}

#[tokio::main]
async fn main() {
    // Structured logs go to stderr; command output goes to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().expect("Failed to load configuration from environment");
    if let Some(url) = cli.api_base_url.clone() {
        config.api_base_url = url;
    }
    if let Some(token) = cli.token.clone() {
        config.token = Some(token);
    }

    tracing::info!(api_base_url = %config.api_base_url, "Initializing headshot client");
    let state = AppState::new(&config).expect("Failed to initialize HTTP client");

    let mut events = state.subscribe();
    let event_logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(event = ?event, "{}", event.status_line()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger fell behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let outcome = run(&state, cli.command).await;
    state.shutdown();
    // The logger sees `Closed` once the last event sender is dropped.
    drop(state);
    if let Err(e) = event_logger.await {
        tracing::warn!(error = %e, "Event logger task failed");
    }

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(state: &AppState, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Packages => {
            let catalog = state.catalog.packages().await?;
            for package in catalog.iter() {
                println!(
                    "{:<12} {:<16} {:>8}  {} headshots, {}",
                    package.id,
                    package.name,
                    pricing::format_usd(package.price_cents),
                    package.headshot_count,
                    package.delivery
                );
            }
        }
        Commands::Quote { plan, team_size } => {
            let quote = state
                .catalog
                .quote(&plan, TeamSize::parse_lenient(&team_size))
                .await?;
            println!("{}", quote.summary());
        }
        Commands::Submit {
            plan,
            team_size,
            style,
            background,
            outfit,
            wait,
            files,
        } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in files {
                let candidate = UploadCandidate::from_path(&path)
                    .await
                    .map_err(|source| CliError::Upload {
                        path: path.clone(),
                        source,
                    })?;
                uploads.push(candidate);
            }

            // Load the catalog so unknown plans are caught before paying.
            let quote = state
                .catalog
                .quote(&plan, TeamSize::parse_lenient(&team_size))
                .await?;
            println!("{}", quote.summary());

            let receipt = state
                .submission
                .submit(SubmissionRequest {
                    plan_id: plan,
                    team_size: quote.team_size,
                    uploads,
                    selection: StyleSelection {
                        style,
                        background,
                        outfit,
                    },
                })
                .await?;
            println!(
                "Order #{} paid ({}); job #{} queued, ~{}s",
                receipt.order_id,
                pricing::format_usd(receipt.amount_cents),
                receipt.job_id,
                receipt.seconds_remaining
            );
            if wait {
                settle(state, receipt.job_id).await?;
            }
        }
        Commands::Status { job_id } => {
            let job: serde_json::Value = state.api.get(&format!("/api/jobs/{job_id}")).await?.body;
            println!("{}", serde_json::to_string_pretty(&job).unwrap_or_default());
        }
        Commands::Watch { job_id } => {
            state.poller.start(job_id)?;
            settle(state, job_id).await?;
        }
        Commands::Rerun { job_id, wait } => {
            let receipt = state.rerun.rerun(job_id).await?;
            println!(
                "Rerun started as #{} (from #{}), ~{}s",
                receipt.job_id, receipt.source_job_id, receipt.seconds_remaining
            );
            if wait {
                settle(state, receipt.job_id).await?;
            }
        }
        Commands::Assets { job_id, retry } => {
            let assets = if retry {
                state
                    .assets
                    .list_assets_when_ready(job_id, &RetryPolicy::default())
                    .await?
            } else {
                state.assets.list_assets(job_id).await?
            };
            for asset in assets {
                println!("{:<20} {}", asset.variant, asset.url);
            }
        }
        Commands::Orders => {
            for order in state.dashboard.fetch_orders().await? {
                println!(
                    "#{:<6} {:<12} team {:<3} {:>8}  credits {}",
                    order.id,
                    order.plan,
                    order.team_size,
                    pricing::format_usd(order.amount_cents),
                    order.rerun_credits
                );
            }
        }
        Commands::Jobs => {
            for job in state.dashboard.fetch_jobs().await? {
                let order = job
                    .order_id
                    .map(|id| format!("#{id}"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{:<6} order {:<7} {:<10} {}/{}/{}",
                    job.id, order, job.status, job.style, job.background, job.outfit
                );
            }
        }
        Commands::DeleteOrder { order_id } => {
            state.dashboard.delete_order(order_id).await?;
            println!("Order #{order_id} deleted.");
        }
        Commands::DeleteJob { job_id } => {
            state.dashboard.delete_job(job_id).await?;
            println!("Job #{job_id} deleted");
        }
        Commands::Support {
            email,
            order_id,
            message,
        } => {
            let ticket = state
                .support
                .create_ticket(&email, order_id, &message)
                .await?;
            println!("Support ticket #{} created.", ticket.id);
        }
        Commands::Register { email, password } => {
            state.account.register(&email, &password).await?;
            println!("Registered {email}");
        }
        Commands::Login { email, password } => {
            let user = state.account.login(&email, &password).await?;
            println!("Logged in as {}", user.email);
            if let Some(token) = state.session.credential() {
                println!("export HEADSHOT_TOKEN={token}");
            }
        }
        Commands::Logout => {
            state.account.logout().await;
            println!("Logged out.");
        }
        Commands::Privacy => {
            println!("{}", state.catalog.privacy().await?.summary());
        }
        Commands::Previews => {
            for preview in state.catalog.branding_previews().await? {
                println!(
                    "{:<20} {:<28} {}x{}",
                    preview.id, preview.label, preview.width, preview.height
                );
            }
        }
        Commands::Metrics => {
            let metrics = state.dashboard.fetch_metrics().await?;
            println!(
                "orders {} · jobs {} · completed {} · tickets {} · conversion {:.1}%",
                metrics.orders,
                metrics.jobs,
                metrics.completed_jobs,
                metrics.support_tickets,
                metrics.estimated_conversion_rate
            );
        }
    }
    Ok(())
}

async fn settle(state: &AppState, job_id: JobId) -> Result<(), CliError> {
    match state.poller.wait_until_settled().await {
        PollState::Completed { job_id } => {
            println!("Job #{job_id} completed.");
            Ok(())
        }
        PollState::Failed { job_id } => {
            println!("Job #{job_id} failed.");
            Ok(())
        }
        _ => Err(CliError::Unsettled(job_id)),
    }
}
