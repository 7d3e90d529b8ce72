//! Command-line argument parsing.

use crate::config::{Config, ConnectionConfig, OutputConfig};
use crate::pipeline::EXPORT_FILE_NAME;
use crate::report::TableStyle;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Charts, checks and a spreadsheet export for the e-commerce database.
#[derive(Parser, Debug)]
#[command(name = "fecom-reports")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Query catalog file
    #[arg(long, global = true, value_name = "PATH")]
    pub queries: Option<PathBuf>,

    /// Directory for chart images and pages
    #[arg(long, global = true, value_name = "DIR")]
    pub charts_dir: Option<PathBuf>,

    /// Directory for the exported workbook
    #[arg(long, global = true, value_name = "DIR")]
    pub exports_dir: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection flags, each backed by an environment variable.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// PostgreSQL connection URL (e.g., postgres://user@host:5433/fecomdb)
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Database host
    #[arg(short = 'H', long, global = true, env = "DB_HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// Database port
    #[arg(short = 'p', long, global = true, env = "DB_PORT", value_name = "PORT")]
    pub port: Option<u16>,

    /// Database name
    #[arg(short = 'd', long = "db", global = true, env = "DB_NAME", value_name = "DATABASE")]
    pub database: Option<String>,

    /// Database user
    #[arg(short = 'U', long, global = true, env = "DB_USER", value_name = "USER")]
    pub user: Option<String>,

    /// Database password (prompted for when absent)
    #[arg(long, global = true, env = "DB_PASSWORD", hide_env_values = true, value_name = "PASSWORD")]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Render the static charts and export their data
    Charts {
        /// Workbook file name inside the exports directory
        #[arg(long, value_name = "NAME", default_value = EXPORT_FILE_NAME)]
        export_file: String,

        /// Also render the interactive time slider
        #[arg(long)]
        time_slider: bool,

        /// Open the time slider in a viewer instead of saving it
        #[arg(long, requires = "time_slider")]
        show: bool,
    },
    /// Run the built-in check queries and print their results
    Checks {
        /// Run only these checks (e.g., B1_LIMIT10 Q3_TOP_CATEGORIES_REVENUE)
        #[arg(long, value_name = "NAME", num_args = 0..)]
        only: Vec<String>,

        /// Print plain pipe-separated tables
        #[arg(long)]
        plain: bool,
    },
    /// Render only the interactive time slider
    Timeslider {
        /// Open the page in a viewer instead of saving it
        #[arg(long)]
        show: bool,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Connection settings given on the command line or through their variables.
    pub fn to_connection_config(&self) -> ConnectionConfig {
        let args = &self.connection;
        ConnectionConfig {
            url: args.url.clone(),
            host: args.host.clone(),
            port: args.port,
            database: args.database.clone(),
            user: args.user.clone(),
            password: args.password.clone(),
        }
    }

    /// Output locations with CLI overrides applied on top of `base`.
    pub fn output_config(&self, base: &OutputConfig) -> OutputConfig {
        OutputConfig {
            charts_dir: self.charts_dir.clone().unwrap_or_else(|| base.charts_dir.clone()),
            exports_dir: self.exports_dir.clone().unwrap_or_else(|| base.exports_dir.clone()),
            queries: self.queries.clone().unwrap_or_else(|| base.queries.clone()),
        }
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Table style for the checks command.
    pub fn table_style(plain: bool) -> TableStyle {
        if plain {
            TableStyle::Plain
        } else {
            TableStyle::Boxed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_parse_individual_args() {
        let cli = parse_args(&[
            "fecom-reports",
            "--host",
            "localhost",
            "--port",
            "5432",
            "--db",
            "mydb",
            "--user",
            "postgres",
            "checks",
        ]);

        assert_eq!(cli.connection.host, Some("localhost".to_string()));
        assert_eq!(cli.connection.port, Some(5432));
        assert_eq!(cli.connection.database, Some("mydb".to_string()));
        assert_eq!(cli.connection.user, Some("postgres".to_string()));
    }

    #[test]
    fn test_parse_short_args() {
        let cli = parse_args(&["fecom-reports", "-H", "localhost", "-d", "mydb", "-U", "postgres", "charts"]);

        assert_eq!(cli.connection.host, Some("localhost".to_string()));
        assert_eq!(cli.connection.database, Some("mydb".to_string()));
        assert_eq!(cli.connection.user, Some("postgres".to_string()));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse_args(&["fecom-reports", "checks", "--host", "db", "-v"]);
        assert_eq!(cli.connection.host, Some("db".to_string()));
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_config_path() {
        let cli = parse_args(&["fecom-reports", "--config", "/path/to/config.toml", "charts"]);
        assert_eq!(cli.config_path(), PathBuf::from("/path/to/config.toml"));
    }

    #[test]
    fn test_charts_defaults() {
        let cli = parse_args(&["fecom-reports", "charts"]);
        assert_eq!(
            cli.command,
            Command::Charts {
                export_file: EXPORT_FILE_NAME.to_string(),
                time_slider: false,
                show: false,
            }
        );
    }

    #[test]
    fn test_show_requires_time_slider() {
        assert!(Cli::try_parse_from(["fecom-reports", "charts", "--show"]).is_err());
        let cli = parse_args(&["fecom-reports", "charts", "--time-slider", "--show"]);
        assert!(matches!(cli.command, Command::Charts { show: true, time_slider: true, .. }));
    }

    #[test]
    fn test_only_accepts_several_names() {
        let cli = parse_args(&["fecom-reports", "checks", "--only", "B1_LIMIT10", "Q2_X", "--plain"]);
        assert_eq!(
            cli.command,
            Command::Checks {
                only: vec!["B1_LIMIT10".to_string(), "Q2_X".to_string()],
                plain: true,
            }
        );
    }

    #[test]
    fn test_only_without_names_selects_everything() {
        let cli = parse_args(&["fecom-reports", "checks", "--only"]);
        assert!(matches!(cli.command, Command::Checks { ref only, .. } if only.is_empty()));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["fecom-reports", "--port", "99999", "checks"]).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["fecom-reports"]).is_err());
    }

    #[test]
    fn test_to_connection_config_from_args() {
        let cli = parse_args(&[
            "fecom-reports",
            "--url",
            "postgres://u@h:1/x",
            "--db",
            "mydb",
            "--password",
            "secret",
            "checks",
        ]);
        let config = cli.to_connection_config();

        assert_eq!(config.url, Some("postgres://u@h:1/x".to_string()));
        assert_eq!(config.database, Some("mydb".to_string()));
        assert_eq!(config.password, Some("secret".to_string()));
    }

    #[test]
    fn test_output_overrides() {
        let cli = parse_args(&["fecom-reports", "--charts-dir", "out", "charts"]);
        let output = cli.output_config(&OutputConfig::default());
        assert_eq!(output.charts_dir, PathBuf::from("out"));
        assert_eq!(output.exports_dir, PathBuf::from("exports"));
        assert_eq!(output.queries, PathBuf::from("queries.sql"));
    }

    #[test]
    fn test_table_style() {
        assert_eq!(Cli::table_style(true), TableStyle::Plain);
        assert_eq!(Cli::table_style(false), TableStyle::Boxed);
    }
}
