use crate::config::{Environment, ResolvedConfig, ResolvedConfigFile};
use crate::constants::API_KEY_ENV_VAR;
use crate::errors::{AppError, AppResult};
use crate::export::ExportDriver;
use crate::models::{DateRange, ExportFlags, ExportRequest, RecordType};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Builds the command-line definition.
///
/// Two subcommands share the same workflow:
/// - `export`: everything from flags, default pipeline settings
/// - `toml`: job and settings from a TOML file
pub fn command() -> Command<'static> {
    Command::new("u21-export")
        .version(APP_VERSION)
        .about(APP_ABOUT)
        .arg(
            Arg::new("api_key")
                .long("api-key")
                .global(true)
                .help("API key (defaults to the U21_API_KEY environment variable)")
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("export")
                .about("Request an export, wait for it and download the archive")
                .after_help("Example:\n  u21-export export -t alert -s 2024-01-01 -e 2024-01-31 --summary")
                .arg(
                    Arg::new("type")
                        .short('t')
                        .long("type")
                        .help("Record type: 'alert', 'case' or 'sar'")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("start")
                        .short('s')
                        .long("start")
                        .help("First day to export (YYYY-MM-DD)")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("end")
                        .short('e')
                        .long("end")
                        .help("Last day to export (YYYY-MM-DD)")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Where to save the archive")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("summary")
                        .long("summary")
                        .help("Summary instead of detailed export (alerts only)")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("env")
                        .long("env")
                        .help("Environment: prod, prod2, eu, sandbox1, sandbox2, sandbox-eu")
                        .default_value("prod")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("base_url")
                        .long("base-url")
                        .help("Explicit API base URL, overrides --env")
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("toml")
                .about("Run an export described by a TOML configuration file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

/// Parses command-line arguments and runs the requested export.
///
/// Returns the path of the saved archive, or `None` when only help was printed.
pub async fn cli() -> AppResult<Option<PathBuf>> {
    let cmd = command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();
    run_matches(&matches, &mut cmd_for_help).await
}

async fn run_matches(
    matches: &ArgMatches,
    cmd_for_help: &mut Command<'_>,
) -> AppResult<Option<PathBuf>> {
    match matches.subcommand() {
        Some(("export", sub)) => {
            let (request, config) = export_from_matches(sub)?;
            let api_key = resolve_api_key(sub.get_one::<String>("api_key").map(|s| s.as_str()))?;
            run_export(request, &config, &api_key).await.map(Some)
        }
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .ok_or_else(|| AppError::InvalidInput("config path is required".into()))?;

            let file_config = ResolvedConfigFile::from_toml_file(config_path)?;
            let request = request_from_file(&file_config)?;
            let api_key = resolve_api_key(sub.get_one::<String>("api_key").map(|s| s.as_str()))?;
            run_export(request, &file_config.resolved, &api_key)
                .await
                .map(Some)
        }
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
            Ok(None)
        }
    }
}

/// Turns `export` subcommand matches into a request and its configuration.
pub fn export_from_matches(sub: &ArgMatches) -> AppResult<(ExportRequest, ResolvedConfig)> {
    let required = |name: &str| {
        sub.get_one::<String>(name)
            .map(|s| s.as_str())
            .ok_or_else(|| AppError::InvalidInput(format!("--{name} is required")))
    };

    let record_type: RecordType = required("type")?.parse()?;
    let date_range = DateRange::parse(required("start")?, required("end")?)?;
    let flags = ExportFlags {
        is_summary: sub.get_one::<bool>("summary").copied().unwrap_or(false),
    };
    let destination = sub
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| record_type.default_output_path(&date_range));

    let mut config = ResolvedConfig::default();
    if let Some(env) = sub.get_one::<String>("env") {
        config.environment = env.parse::<Environment>()?;
    }
    if let Some(base_url) = sub.get_one::<String>("base_url") {
        config.base_url = Some(base_url.clone());
    }

    let request = ExportRequest::new(record_type, date_range, flags, destination);
    Ok((request, config))
}

/// Turns a loaded TOML job description into a request.
pub fn request_from_file(file_config: &ResolvedConfigFile) -> AppResult<ExportRequest> {
    let record_type: RecordType = file_config.record_type.parse()?;
    let date_range = DateRange::parse(&file_config.start, &file_config.end)?;
    let destination = file_config
        .output
        .clone()
        .unwrap_or_else(|| record_type.default_output_path(&date_range));
    Ok(ExportRequest::new(
        record_type,
        date_range,
        ExportFlags {
            is_summary: file_config.summary,
        },
        destination,
    ))
}

/// Picks the API key from the flag, falling back to the environment.
pub fn resolve_api_key(flag: Option<&str>) -> AppResult<String> {
    let key = match flag {
        Some(key) => key.to_string(),
        None => std::env::var(API_KEY_ENV_VAR).map_err(|_| {
            AppError::InvalidInput(format!(
                "No API key given: pass --api-key or set {API_KEY_ENV_VAR}"
            ))
        })?,
    };
    if key.trim().is_empty() {
        return Err(AppError::InvalidInput("API key must not be empty".into()));
    }
    Ok(key)
}

async fn run_export(
    request: ExportRequest,
    config: &ResolvedConfig,
    api_key: &str,
) -> AppResult<PathBuf> {
    print_export_info(&request, config);
    let driver = ExportDriver::from_config(config, api_key)?;
    driver.run(request).await
}

fn print_export_info(request: &ExportRequest, config: &ResolvedConfig) {
    let target = match &config.base_url {
        Some(url) => url.as_str(),
        None => config.environment.host(),
    };
    info!(
        record_type = request.record_type.display_name(),
        start = %request.date_range.start(),
        end = %request.date_range.end(),
        summary = request.flags.is_summary,
        target = target,
        "Export requested"
    );
}
