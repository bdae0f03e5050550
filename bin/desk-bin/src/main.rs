mod cli;

use std::{
    io::{BufRead, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use dotenvy::dotenv;
use repairdesk_client::{
    AggregatePayload, ClientConfig, ClientError, HttpDashboardClient, SessionContext,
    SessionState,
};
use repairdesk_dashboard::{
    CounterAnimation, DashboardConfig, DashboardFetcher, DashboardState, FetchError,
    FilePayloadStore, render_dashboard,
};
use repairdesk_metrics::MetricsRegistry;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn init_logger() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout is reserved for the dashboard itself.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

struct App {
    client: Arc<HttpDashboardClient>,
    session: SessionContext,
    config: DashboardConfig,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let config = DashboardConfig {
            state_dir: cli.state_dir.clone(),
            ..DashboardConfig::default()
        };

        let client_config = ClientConfig::new(&cli.base_url)
            .context("Invalid backend base URL")?
            .with_timeout(Duration::from_secs(cli.timeout_secs))
            .with_session_file(config.session_file());
        let client = Arc::new(
            HttpDashboardClient::new(client_config).context("Failed to create HTTP client")?,
        );
        let session = SessionContext::new(client.clone());

        Ok(Self {
            client,
            session,
            config,
        })
    }

    fn fetcher(&self, metrics: &MetricsRegistry) -> DashboardFetcher {
        let store = Arc::new(FilePayloadStore::new(&self.config.state_dir));
        DashboardFetcher::new(self.client.clone(), store, metrics.dashboard.clone())
            .with_session(self.session.clone())
    }
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn login(app: &App, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };

    match app.session.login(username, &password).await {
        Ok(user) => {
            println!("Signed in as {} ({})", user.username, user.role);
            Ok(())
        }
        Err(ClientError::LoginRejected {
            message,
            resolution,
        }) => match resolution {
            Some(resolution) => bail!("{message}. {resolution}"),
            None => bail!("{message}"),
        },
        Err(err) => Err(err).context("Login failed"),
    }
}

async fn whoami(app: &App) -> Result<()> {
    match app.session.check().await.context("Failed to reach the backend")? {
        SessionState::Authenticated(user) => println!("{} ({})", user.username, user.role),
        SessionState::Unknown | SessionState::Anonymous => println!("Not signed in"),
    }
    Ok(())
}

fn report_fetch_error(state: &DashboardState) {
    if state.error == Some(FetchError::Unauthorized) {
        eprintln!("Not signed in or session expired. Run `repairdesk login` first.");
    }
}

async fn dashboard(app: &App, metrics: &MetricsRegistry, json: bool) -> Result<()> {
    let fetcher = app.fetcher(metrics);
    let state = fetcher.fetch().await;
    report_fetch_error(&state);

    if json {
        let payload = state.data.clone().unwrap_or_default();
        let rendered =
            serde_json::to_string_pretty(&*payload).context("Failed to encode dashboard")?;
        println!("{rendered}");
    } else {
        print!("{}", render_dashboard(&state));
    }
    Ok(())
}

/// Headline numbers for one counter line: customers, challans and items dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Headline {
    customers: u64,
    challans: u64,
    items: u64,
}

impl Headline {
    const fn of(payload: &AggregatePayload) -> Self {
        Self {
            customers: payload.customer.number_of_customers,
            challans: payload.challan.number_of_challans,
            items: payload.challan.number_of_items,
        }
    }
}

impl std::fmt::Display for Headline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Customers: {:>7}   Challans: {:>7}   Items: {:>7}",
            self.customers, self.challans, self.items
        )
    }
}

struct Counters {
    customers: CounterAnimation,
    challans: CounterAnimation,
    items: CounterAnimation,
}

impl Counters {
    fn new(config: &DashboardConfig) -> Self {
        Self {
            customers: CounterAnimation::new(config.customer_counter_duration, config.counter_tick),
            challans: CounterAnimation::new(config.challan_counter_duration, config.counter_tick),
            items: CounterAnimation::new(config.challan_counter_duration, config.counter_tick),
        }
    }

    fn retarget(&mut self, target: Headline) {
        self.customers.set_target(target.customers);
        self.challans.set_target(target.challans);
        self.items.set_target(target.items);
    }

    fn shown(&self) -> Headline {
        Headline {
            customers: self.customers.value(),
            challans: self.challans.value(),
            items: self.items.value(),
        }
    }

    /// Counts the headline numbers up on a single terminal line.
    async fn animate(&mut self, payload: &AggregatePayload) -> Result<()> {
        let target = Headline::of(payload);
        self.retarget(target);

        let mut customers = self.customers.subscribe();
        let mut challans = self.challans.subscribe();
        let mut items = self.items.subscribe();
        let mut stdout = std::io::stdout();

        loop {
            customers.mark_unchanged();
            challans.mark_unchanged();
            items.mark_unchanged();

            let shown = self.shown();
            write!(stdout, "\r{shown}")?;
            stdout.flush()?;

            if shown == target {
                break;
            }
            tokio::select! {
                changed = customers.changed() => changed?,
                changed = challans.changed() => changed?,
                changed = items.changed() => changed?,
            }
        }
        writeln!(stdout)?;
        Ok(())
    }
}

async fn show_updates(
    fetcher: &DashboardFetcher,
    config: &DashboardConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut updates = fetcher.subscribe();
    let mut counters = Counters::new(config);

    loop {
        let state = updates.borrow_and_update().clone();
        if !state.loading && state.generation > 0 {
            report_fetch_error(&state);
            if let Some(payload) = state.data.as_deref() {
                counters.animate(payload).await?;
            }
            print!("{}", render_dashboard(&state));
            println!();
        }

        tokio::select! {
            () = shutdown.cancelled() => return Ok(()),
            changed = updates.changed() => changed?,
        }
    }
}

async fn watch(app: &App, metrics: &MetricsRegistry, interval_secs: u64) -> Result<()> {
    let config = DashboardConfig {
        refresh_interval: Duration::from_secs(interval_secs),
        ..app.config.clone()
    };
    config.validate().context("Invalid watch settings")?;

    let fetcher = Arc::new(app.fetcher(metrics));
    let shutdown = CancellationToken::new();

    let refresh = {
        let fetcher = Arc::clone(&fetcher);
        let shutdown = shutdown.clone();
        let interval = config.refresh_interval;
        tokio::spawn(async move { fetcher.run_forever(interval, shutdown).await })
    };

    info!(interval_secs, "Watching dashboard, press Ctrl-C to stop");
    let result = tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.context("Failed to listen for Ctrl-C"),
        shown = show_updates(&fetcher, &config, shutdown.clone()) => shown,
    };

    shutdown.cancel();
    refresh.await.context("Refresh loop panicked")?;
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_logger();

    let cli = Cli::parse();
    let app = App::new(&cli)?;
    let metrics = MetricsRegistry::new();

    match cli.command {
        Command::Login { username, password } => login(&app, &username, password).await,
        Command::Logout => {
            app.session.logout().await.context("Logout failed")?;
            println!("Signed out");
            Ok(())
        }
        Command::Whoami => whoami(&app).await,
        Command::Dashboard { json } => dashboard(&app, &metrics, json).await,
        Command::Watch { interval_secs } => watch(&app, &metrics, interval_secs).await,
    }
}
