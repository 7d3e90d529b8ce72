//! fecom-reports - charts, checks and a spreadsheet export for the e-commerce database.

use fecom_reports::catalog::{builtin, QueryCatalog};
use fecom_reports::cli::{Cli, Command};
use fecom_reports::config::{Config, ConnectionSettings, OutputConfig};
use fecom_reports::db::{self, DatabaseClient};
use fecom_reports::error::{ReportError, Result, FAILURE_HINT};
use fecom_reports::logging::init_logging;
use fecom_reports::pipeline::{default_chart_steps, run_checks, ReportPipeline};
use fecom_reports::query::QueryExecutor;
use tracing::{debug, info};

/// Conventional exit status after SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    tokio::select! {
        result = run(cli) => {
            if let Err(e) = result {
                eprintln!("{}: {}", e.category(), e);
                eprintln!("{FAILURE_HINT}");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    debug!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;
    let output = cli.output_config(&config.output);

    // Precedence: CLI (and its env vars) > config file > DATABASE_URL > defaults.
    let mut connection = config.connection.clone();
    connection.merge(&cli.to_connection_config());
    connection.apply_env_defaults();
    let settings = prompt_missing_password(connection.resolve()?).await?;

    let catalog = catalog_for(&cli.command, &output)?;

    info!("Connecting to {}", settings.display_string());
    let db = db::connect(&settings).await?;

    let outcome = dispatch(&cli.command, db.as_ref(), &catalog, &output).await;
    db.close().await?;
    outcome
}

/// Reads the password from the terminal when no layer supplied one.
async fn prompt_missing_password(settings: ConnectionSettings) -> Result<ConnectionSettings> {
    tokio::task::spawn_blocking(move || {
        settings.with_password_from(|message| rpassword::prompt_password(message))
    })
    .await
    .map_err(|e| ReportError::internal(format!("Password prompt failed: {e}")))?
}

fn catalog_for(command: &Command, output: &OutputConfig) -> Result<QueryCatalog> {
    match command {
        Command::Checks { .. } => Ok(builtin::checks_catalog()),
        Command::Charts { .. } | Command::Timeslider { .. } => QueryCatalog::load(&output.queries),
    }
}

async fn dispatch(
    command: &Command,
    db: &dyn DatabaseClient,
    catalog: &QueryCatalog,
    output: &OutputConfig,
) -> Result<()> {
    let executor = QueryExecutor::new(db, catalog);
    let mut stdout = std::io::stdout();

    match command {
        Command::Charts {
            export_file,
            time_slider,
            show,
        } => {
            let pipeline = ReportPipeline::new(executor, output);
            pipeline.run(&default_chart_steps(), export_file, &mut stdout).await?;
            if *time_slider {
                pipeline.run_time_slider(*show, &mut stdout).await?;
            }
        }
        Command::Checks { only, plain } => {
            let ran = run_checks(&executor, only, Cli::table_style(*plain), &mut stdout).await?;
            debug!("Ran {ran} checks");
        }
        Command::Timeslider { show } => {
            ReportPipeline::new(executor, output)
                .run_time_slider(*show, &mut stdout)
                .await?;
        }
    }

    Ok(())
}
