use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use book_service::lifecycle::{shutdown_signal, Shutdown};
use book_service::simulator::{run_plan, PlanOverrides, ScenarioKind, ServiceClient};

#[derive(Parser)]
#[command(name = "error-sim")]
#[command(about = "Drive error and latency traffic against the book service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "BOOK_SERVICE_URL", default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the service answers on `/`
    Check,
    /// Run one scenario, or all of them in turn
    Run {
        #[arg(value_enum)]
        scenario: ScenarioKind,

        #[command(flatten)]
        overrides: PlanOverrides,

        /// Pause between scenarios when running several, in seconds
        #[arg(long, default_value_t = 10)]
        pause_secs: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "error_sim=info,book_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let client = match ServiceClient::new(&cli.url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !client.check_connection().await {
        eprintln!("Error: book service is not reachable at {}", client.base_url());
        return ExitCode::FAILURE;
    }

    match cli.command {
        Commands::Check => {
            println!("Book service is running at {}", client.base_url());
            ExitCode::SUCCESS
        }
        Commands::Run {
            scenario,
            overrides,
            pause_secs,
        } => {
            let shutdown = Shutdown::new();
            shutdown.trigger_on_signal();
            force_exit_on_second_signal(shutdown.clone());

            let plans = scenario.plans();
            let count = plans.len();
            for (i, plan) in plans.into_iter().enumerate() {
                if shutdown.is_triggered() {
                    break;
                }
                let plan = overrides.apply(plan);
                let report = run_plan(&client, &plan, &shutdown).await;
                println!("{}\n", report);
                if report.cancelled {
                    break;
                }

                if i + 1 < count {
                    tracing::info!(seconds = pause_secs, "Pausing before next scenario");
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(pause_secs)) => {}
                    }
                }
            }
            ExitCode::SUCCESS
        }
    }
}

/// The first signal cancels the running scenario; a second one exits at once.
fn force_exit_on_second_signal(shutdown: Shutdown) {
    tokio::spawn(async move {
        shutdown.cancelled().await;
        shutdown_signal().await;
        eprintln!("Second interrupt, exiting without a report");
        std::process::exit(130);
    });
}
