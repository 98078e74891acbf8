//! `casedesk`: command-line front end for the repair-case dashboard.
//!
//! One-shot commands print tables or JSON and exit. `casedesk dashboard`
//! runs the live view: stdin lines feed the debounced search and `:`
//! commands, while sync progress and refetches arrive in the background.

mod input;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use casedesk::config::{ConfigError, DeskConfig, parse_base_url};
use casedesk::net::api::{ApiClient, ExportDownload, StaticToken, TokenSource};
use casedesk::net::identity::AuthError;
use casedesk::net::types::{ApiError, CreateUserRequest, ExportOldCasesRequest, SyncKind};
use casedesk::services::case_list::CaseListController;
use casedesk::services::session::SessionProvider;
use casedesk::state::query::{InsuranceFilter, PageSize, QueryState, SortDirection, SortKey, TimeRange};
use casedesk::state::sync::{STARTING_MESSAGE, started_notice};
use casedesk::{Dashboard, DashboardUpdate, SyncStartError};

use input::{HELP, Input, parse_input};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Sync(#[from] SyncStartError),
    #[error("nicht angemeldet; bitte zuerst `casedesk login` ausführen oder --token setzen")]
    NotSignedIn,
    #[error("Zugriff verweigert: nur Administratoren dürfen Benutzer verwalten.")]
    NotAdmin,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Fälle konnten nicht geladen werden")]
    FetchFailed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "casedesk", about = "Repair case dashboard CLI")]
struct Cli {
    /// Backend base URL; overrides `CASEDESK_API_URL` from the environment.
    #[arg(long, env = "CASEDESK_API_URL")]
    api_url: Option<String>,

    /// Fixed bearer token instead of the stored sign-in session.
    #[arg(long, env = "CASEDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend is reachable.
    Health,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CASEDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    Cases(CasesCommand),
    Sync(SyncCommand),
    Export(ExportCommand),
    Users(UsersCommand),
    /// Live case list with search input and sync progress.
    Dashboard(FilterArgs),
}

#[derive(Args, Debug)]
struct CasesCommand {
    #[command(subcommand)]
    command: CasesSubcommand,
}

#[derive(Subcommand, Debug)]
enum CasesSubcommand {
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print the raw page as JSON.
        #[arg(long)]
        json: bool,
    },
    Show {
        case_id: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// 25, 50, 100 or 200.
    #[arg(long, default_value_t = 50)]
    limit: u32,
    #[arg(long)]
    insurance: Option<String>,
    #[arg(long)]
    search: Option<String>,
    /// Include inactive cases.
    #[arg(long)]
    include_inactive: bool,
    /// 0 (all), 1, 3, 6 or 12.
    #[arg(long, default_value_t = 0)]
    months: u32,
    /// Backend column, e.g. `customerName`.
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    desc: bool,
}

impl FilterArgs {
    fn to_query(&self) -> Result<QueryState, CliError> {
        let page_size = PageSize::from_limit(self.limit)
            .ok_or_else(|| CliError::InvalidArgument(format!("--limit {} (25, 50, 100 oder 200)", self.limit)))?;
        let time_range = TimeRange::from_months(self.months)
            .ok_or_else(|| CliError::InvalidArgument(format!("--months {} (0, 1, 3, 6 oder 12)", self.months)))?;
        let sort_key = self
            .sort
            .as_deref()
            .map(|column| {
                SortKey::from_column(column)
                    .ok_or_else(|| CliError::InvalidArgument(format!("--sort {column}: unbekannte Spalte")))
            })
            .transpose()?;

        Ok(QueryState {
            insurance: self.insurance.as_deref().map_or(InsuranceFilter::All, InsuranceFilter::from_value),
            page: self.page.max(1),
            page_size,
            search: self.search.as_deref().unwrap_or_default().trim().to_owned(),
            show_active_only: !self.include_inactive,
            time_range,
            sort_key,
            sort_direction: if self.desc { SortDirection::Descending } else { SortDirection::Ascending },
        })
    }
}

#[derive(Args, Debug)]
struct SyncCommand {
    #[command(subcommand)]
    command: SyncSubcommand,
}

#[derive(Subcommand, Debug)]
enum SyncSubcommand {
    Status,
    Start {
        /// Re-sync every insurance case instead of only changed ones.
        #[arg(long)]
        all: bool,
        /// Follow progress until the sync finishes.
        #[arg(long)]
        wait: bool,
    },
    /// Sync a single case by numeric id.
    Test { case_id: u64 },
}

#[derive(Args, Debug)]
struct ExportCommand {
    #[command(subcommand)]
    command: ExportSubcommand,
}

#[derive(Subcommand, Debug)]
enum ExportSubcommand {
    Csv {
        #[arg(long)]
        insurance: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Old {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Specific {
        /// Case numbers separated by newlines, commas or semicolons.
        #[arg(long)]
        cases: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List {
        #[arg(long)]
        page_token: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Create {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CASEDESK_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show how the backend sees the current caller.
    Me,
}

struct CliContext {
    config: DeskConfig,
    session: Arc<SessionProvider>,
    api: ApiClient,
    static_token: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("casedesk=info,cli=info")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = DeskConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config.api_url = parse_base_url("--api-url", url)?;
    }

    let session = Arc::new(SessionProvider::from_config(&config)?);
    let auth = session.restore().await;
    debug!(signed_in = auth.is_signed_in(), "session restored");

    let static_token = cli.token.is_some();
    let tokens: Arc<dyn TokenSource> = match cli.token.as_deref() {
        Some(token) => Arc::new(StaticToken::bearer(token)),
        None => session.clone(),
    };
    let api = ApiClient::new(&config.api_url, config.timeouts, tokens)?;
    let ctx = CliContext { config, session, api, static_token };

    match cli.command {
        Command::Health => run_health(&ctx).await,
        Command::Login { email, password } => run_login(&ctx, &email, &password).await,
        Command::Logout => {
            ctx.session.sign_out().await?;
            println!("abgemeldet");
            Ok(())
        }
        Command::Whoami => run_whoami(&ctx).await,
        Command::ResetPassword { email } => {
            ctx.session.send_password_reset(&email).await?;
            println!("Eine E-Mail zum Zurücksetzen des Passworts wurde an {email} gesendet.");
            Ok(())
        }
        Command::Cases(cases) => run_cases(&ctx, cases).await,
        Command::Sync(sync) => run_sync(&ctx, sync).await,
        Command::Export(export) => run_export(&ctx, export).await,
        Command::Users(users) => run_users(&ctx, users).await,
        Command::Dashboard(filters) => run_dashboard(&ctx, &filters).await,
    }
}

// =============================================================================
// ACCOUNT
// =============================================================================

async fn run_health(ctx: &CliContext) -> Result<(), CliError> {
    let health = ctx.api.check_health().await?.into_result()?;
    println!("{} ({})", health.status, ctx.api.base_url());
    Ok(())
}

async fn run_login(ctx: &CliContext, email: &str, password: &str) -> Result<(), CliError> {
    let user = ctx.session.sign_in(email, password).await?;
    info!(uid = %user.uid, "signed in");
    println!("angemeldet als {}", user.email.as_deref().unwrap_or(&user.uid));
    if ctx.config.is_admin(&user.uid) {
        println!("Administratorrechte: ja");
    }
    Ok(())
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    let Some(user) = ctx.session.current_user().await else {
        return Err(CliError::NotSignedIn);
    };
    println!("uid:   {}", user.uid);
    println!("email: {}", user.email.as_deref().unwrap_or("N/A"));
    let admin = ctx.session.is_admin(&ctx.config.admin_uids).await;
    println!("admin: {}", if admin { "ja" } else { "nein" });
    Ok(())
}

/// Commands that need a token fail early with a clear message.
async fn require_auth(ctx: &CliContext) -> Result<(), CliError> {
    if ctx.static_token || ctx.session.auth_state().await.is_signed_in() {
        Ok(())
    } else {
        Err(CliError::NotSignedIn)
    }
}

/// User management is limited to configured admin uids. Without a configured
/// list the backend is left to decide.
async fn require_admin(ctx: &CliContext) -> Result<(), CliError> {
    require_auth(ctx).await?;
    if ctx.config.admin_uids.is_empty() || ctx.static_token {
        return Ok(());
    }
    if ctx.session.is_admin(&ctx.config.admin_uids).await {
        Ok(())
    } else {
        Err(CliError::NotAdmin)
    }
}

// =============================================================================
// CASES
// =============================================================================

async fn run_cases(ctx: &CliContext, cases: CasesCommand) -> Result<(), CliError> {
    require_auth(ctx).await?;
    match cases.command {
        CasesSubcommand::List { filters, json } => {
            let query = filters.to_query()?;
            if json {
                let page = ctx.api.get_cases(&query.to_request()).await?.into_result()?;
                return print_json(&serde_json::to_value(page)?);
            }
            let mut ctl = CaseListController::with_query(Arc::new(ctx.api.clone()), query);
            let loaded = ctl.fetch().await;
            print!("{}", render::case_list(&ctl));
            if loaded { Ok(()) } else { Err(CliError::FetchFailed) }
        }
        CasesSubcommand::Show { case_id, json } => {
            let case = ctx.api.get_repair_case_details(&case_id).await?.into_result()?;
            if json {
                print_json(&serde_json::to_value(case)?)
            } else {
                print!("{}", render::case_detail(&case));
                Ok(())
            }
        }
    }
}

// =============================================================================
// SYNC
// =============================================================================

async fn run_sync(ctx: &CliContext, sync: SyncCommand) -> Result<(), CliError> {
    require_auth(ctx).await?;
    match sync.command {
        SyncSubcommand::Status => {
            let status = ctx.api.get_sync_status().await?.into_result()?;
            print_json(&serde_json::to_value(status)?)
        }
        SyncSubcommand::Start { all, wait } => {
            let kind = if all { SyncKind::All } else { SyncKind::Changed };
            start_sync(ctx, kind, wait).await
        }
        SyncSubcommand::Test { case_id } => {
            let result = ctx.api.test_single_sync(case_id).await?.into_result()?;
            print_json(&result)
        }
    }
}

async fn start_sync(ctx: &CliContext, kind: SyncKind, wait: bool) -> Result<(), CliError> {
    let mut dashboard = Dashboard::new(Arc::new(ctx.api.clone()), ctx.config.timings);
    eprintln!("{STARTING_MESSAGE}");
    dashboard.start_sync(kind).await?;
    let (title, detail) = started_notice(kind);
    println!("{title}: {detail}");

    if wait {
        loop {
            match dashboard.next_event().await {
                DashboardUpdate::SyncProgress => {
                    if let Some(line) = render::sync_line(dashboard.sync()) {
                        eprintln!("{line}");
                    }
                }
                DashboardUpdate::SyncFinished | DashboardUpdate::Closed => break,
                DashboardUpdate::Search { .. } | DashboardUpdate::CasesRefetched => {}
            }
        }
        if let Some(progress) = dashboard.sync().progress() {
            println!(
                "Synchronisierung abgeschlossen: {} verarbeitet, {} aktualisiert, {} Fehler",
                progress.processed, progress.upserted, progress.errors
            );
        }
    }
    dashboard.shutdown();
    Ok(())
}

// =============================================================================
// EXPORT
// =============================================================================

async fn run_export(ctx: &CliContext, export: ExportCommand) -> Result<(), CliError> {
    require_auth(ctx).await?;
    let (download, out) = match export.command {
        ExportSubcommand::Csv { insurance, out } => {
            (ctx.api.export_repair_cases_csv(insurance.as_deref()).await?, out)
        }
        ExportSubcommand::Old { out } => (ctx.api.export_old_repair_cases_excel().await?, out),
        ExportSubcommand::Specific { cases, out } => {
            let request = ExportOldCasesRequest::from_input(&cases);
            if request.case_numbers.is_empty() {
                return Err(CliError::InvalidArgument("Bitte mindestens eine Fallnummer angeben.".to_owned()));
            }
            (ctx.api.export_specific_old_cases(&request).await?, out)
        }
    };
    save_download(download, out.as_deref()).await
}

async fn save_download(download: ExportDownload, out: Option<&Path>) -> Result<(), CliError> {
    let path = out.map_or_else(|| PathBuf::from(&download.file_name), Path::to_path_buf);
    let bytes = download.save_to(&path).await?;
    info!(path = %path.display(), bytes, "export saved");
    println!("{} ({bytes} Bytes)", path.display());
    Ok(())
}

// =============================================================================
// USERS
// =============================================================================

async fn run_users(ctx: &CliContext, users: UsersCommand) -> Result<(), CliError> {
    match users.command {
        UsersSubcommand::List { page_token, json } => {
            require_admin(ctx).await?;
            let listing = ctx.api.list_firebase_users(page_token.as_deref()).await?.into_result()?;
            if json {
                return print_json(&serde_json::to_value(listing)?);
            }
            print!("{}", render::users_table(&listing.users));
            if let Some(token) = listing.next_page_token {
                println!("weitere Benutzer: --page-token {token}");
            }
            Ok(())
        }
        UsersSubcommand::Create { email, password } => {
            require_admin(ctx).await?;
            let request = CreateUserRequest { email, password };
            let created = ctx.api.create_firebase_user(&request).await?.into_result()?;
            println!(
                "Benutzer {} erfolgreich erstellt (UID: {})",
                created.email.as_deref().unwrap_or(&request.email),
                created.uid
            );
            Ok(())
        }
        UsersSubcommand::Me => {
            require_auth(ctx).await?;
            let me = ctx.api.read_admin_me().await?.into_result()?;
            print_json(&serde_json::to_value(me)?)
        }
    }
}

// =============================================================================
// LIVE DASHBOARD
// =============================================================================

async fn run_dashboard(ctx: &CliContext, filters: &FilterArgs) -> Result<(), CliError> {
    require_auth(ctx).await?;
    let query = filters.to_query()?;
    let mut dashboard = Dashboard::with_query(Arc::new(ctx.api.clone()), ctx.config.timings, query);
    dashboard.mount().await;
    print_dashboard(&dashboard);
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => handle_input(&mut dashboard, input).await,
                    Err(message) => eprintln!("{message}"),
                }
            }
            Some(event) = dashboard.recv_event() => {
                match dashboard.apply_event(event).await {
                    DashboardUpdate::SyncProgress => {
                        if let Some(line) = render::sync_line(dashboard.sync()) {
                            eprintln!("{line}");
                        }
                    }
                    DashboardUpdate::SyncFinished => eprintln!("Synchronisierung abgeschlossen."),
                    DashboardUpdate::Search { reloaded: true } | DashboardUpdate::CasesRefetched => {
                        print_dashboard(&dashboard);
                    }
                    DashboardUpdate::Search { reloaded: false } | DashboardUpdate::Closed => {}
                }
            }
        }
    }

    dashboard.shutdown();
    Ok(())
}

async fn handle_input(dashboard: &mut Dashboard, input: Input) {
    let changed = match input {
        Input::Search(text) => {
            dashboard.type_search(&text);
            false
        }
        Input::Page(page) => {
            let changed = dashboard.go_to_page(page).await;
            if !changed {
                eprintln!("Seite {page} ist nicht verfügbar.");
            }
            changed
        }
        Input::Limit(size) => dashboard.set_page_size(size).await,
        Input::Insurance(filter) => dashboard.set_insurance(filter).await,
        Input::Months(range) => dashboard.set_time_range(range).await,
        Input::Active(active) => dashboard.set_show_active_only(active).await,
        Input::Sort(key) => dashboard.toggle_sort(key).await,
        Input::Sync(kind) => {
            match dashboard.start_sync(kind).await {
                Ok(()) => {
                    let (title, detail) = started_notice(kind);
                    eprintln!("{title}: {detail}");
                }
                Err(e) => eprintln!("{e}"),
            }
            false
        }
        Input::Refresh => {
            dashboard.reload().await;
            true
        }
        Input::Help => {
            eprintln!("{HELP}");
            false
        }
        Input::Quit => false,
    };
    if changed {
        print_dashboard(dashboard);
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    if let Some(line) = render::sync_line(dashboard.sync()) {
        println!("{line}");
    }
    print!("{}", render::case_list(dashboard.cases()));
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
