//! Printshop RS operator CLI
//!
//! Drives the client services from a terminal: sign in, browse the task
//! list, toggle process steps, change status, comment, create tasks.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ps_client::HttpTaskApi;
use ps_core::config::ClientConfig;
use ps_core::PsError;
use ps_notifications::{ExpoPushGateway, PushService};
use ps_services::{FileSessionStorage, QueryCache, ServiceContext, Session, StatusFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "printshop", version, about = "인쇄 작업 관리 도구")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Do not send push notifications for changes
    #[arg(long, global = true)]
    no_push: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and keep the session on disk
    Login {
        id: String,
        #[arg(long, env = "PRINTSHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Task list under a status tab
    List {
        #[arg(long, default_value = "전체")]
        tab: StatusFilter,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Task detail with steps and recent history
    Show { key: String },
    /// Flip a process step between 완료 and 미완료
    Toggle { key: String, index: usize },
    /// Move a task to 대기, 진행중 or 완료
    Status { key: String, status: String },
    Delete { key: String },
    Comment { key: String, content: String },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        company: String,
        /// 보통, 중요 or 긴급
        #[arg(long)]
        priority: Option<String>,
        /// METHOD:OPTION, e.g. 디지털인쇄:내부인쇄
        #[arg(long)]
        printing: Option<String>,
        /// CATEGORY:TYPE:VENDOR, repeatable
        #[arg(long = "post")]
        post: Vec<String>,
        #[arg(long)]
        order_date: Option<NaiveDate>,
        #[arg(long)]
        delivery_date: Option<NaiveDate>,
        #[arg(long)]
        paper: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Create as 진행중
        #[arg(long)]
        quick: bool,
    },
    /// Turn push notifications on or off for the signed-in user
    Push {
        state: Toggle,
        #[arg(long, env = "PRINTSHOP_PUSH_TOKEN")]
        token: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", user_message(&e));
            tracing::debug!(error = ?e, "command failed");
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing/logging; stdout is kept for command output
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,ps_services=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

/// Alert text for a failed command
fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<PsError>() {
        Some(e) => e.user_message(),
        None => format!("{:#}", err),
    }
}

/// Everything a command runs against
pub(crate) struct App {
    pub config: ClientConfig,
    pub api: Arc<HttpTaskApi>,
    pub session: Session,
    pub ctx: ServiceContext,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ClientConfig::from_env().map_err(PsError::from)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.api.base_url,
        "printshop starting"
    );

    let api = Arc::new(HttpTaskApi::new(&config.api)?);
    let gateway = ExpoPushGateway::new(config.push.endpoint.clone(), config.timeout())
        .map_err(PsError::from)?;
    let push = Arc::new(PushService::new(api.clone(), Arc::new(gateway), &config.push));
    let session =
        Session::hydrate(Arc::new(FileSessionStorage::new(&config.session.path))).await;

    let mut ctx = ServiceContext::new(api.clone(), Arc::new(QueryCache::new()), push)
        .with_admin_key(session.admin_key());
    if cli.no_push {
        ctx = ctx.without_notifications();
    }

    let app = App {
        config,
        api,
        session,
        ctx,
    };

    match cli.command {
        Command::Login { id, password } => commands::login(&app, &id, &password).await,
        Command::Logout => commands::logout(&app).await,
        Command::List { tab, pages } => commands::list(&app, tab, pages).await,
        Command::Show { key } => commands::show(&app, &key).await,
        Command::Toggle { key, index } => commands::toggle(&app, &key, index).await,
        Command::Status { key, status } => commands::status(&app, &key, &status).await,
        Command::Delete { key } => commands::delete(&app, &key).await,
        Command::Comment { key, content } => commands::comment(&app, &key, &content).await,
        Command::Create {
            title,
            company,
            priority,
            printing,
            post,
            order_date,
            delivery_date,
            paper,
            description,
            quick,
        } => {
            let request = commands::CreateArgs {
                title,
                company,
                priority,
                printing,
                post,
                order_date,
                delivery_date,
                paper,
                description,
                quick,
            };
            commands::create(&app, request).await
        }
        Command::Push { state, token } => commands::push(&app, state == Toggle::On, token).await,
    }
}
