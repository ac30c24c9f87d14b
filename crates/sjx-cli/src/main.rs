//! `sjx` - export and import appeal graphs over JSON snapshot files

mod commands;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sjx_core::ExchangeConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("sjx")
        .version(sjx_core::VERSION)
        .about("Sanitized export and re-associating import of appeal record graphs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with exchange settings"),
        )
        .subcommand(
            Command::new("export")
                .about("Export the graph of one appeal")
                .arg(
                    Arg::new("db")
                        .long("db")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Source store snapshot"),
                )
                .arg(
                    Arg::new("appeal")
                        .long("appeal")
                        .required(true)
                        .help("Uuid of the appeal to export"),
                )
                .arg(
                    Arg::new("show-pii")
                        .long("show-pii")
                        .action(ArgAction::SetTrue)
                        .help("Keep sensitive values (fields marked for stripping are still removed)"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducible redaction"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the document here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import a document into a target store")
                .arg(
                    Arg::new("db")
                        .long("db")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Target store snapshot; created if absent"),
                )
                .arg(
                    Arg::new("document")
                        .long("document")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Exported document"),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Fail on references the import could not reassociate"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the updated store here instead of over --db"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Compare two documents, ignoring ids")
                .arg(
                    Arg::new("left")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("right")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(Command::new("check").about("Validate the registry and print the export order"))
}

fn path(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing --{name}"))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<ExchangeConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => ExchangeConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ExchangeConfig::default()),
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let mut config = load_config(matches)?;

    match matches.subcommand() {
        Some(("export", args)) => {
            if args.get_flag("show-pii") {
                config = config.with_sanitize(false);
            }
            if let Some(seed) = args.get_one::<u64>("seed") {
                config = config.with_seed(*seed);
            }
            let appeal = args
                .get_one::<String>("appeal")
                .context("missing --appeal")?;
            let json = commands::export(config, &path(args, "db")?, appeal)?;
            match args.get_one::<PathBuf>("out") {
                Some(out) => std::fs::write(out, json)
                    .with_context(|| format!("writing {}", out.display()))?,
                None => println!("{json}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(("import", args)) => {
            if args.get_flag("strict") {
                config = config.with_strict_references(true);
            }
            let db = path(args, "db")?;
            let out = args.get_one::<PathBuf>("out").cloned().unwrap_or_else(|| db.clone());
            let report = commands::import(config, &db, &path(args, "document")?, &out)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(("diff", args)) => {
            let differences = commands::diff(config, &path(args, "left")?, &path(args, "right")?)?;
            for difference in &differences {
                println!("{difference}");
            }
            if differences.is_empty() {
                println!("documents match");
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Some(("check", _)) => {
            for (position, entity_type) in commands::check(config)?.iter().enumerate() {
                println!("{:>3}. {entity_type}", position + 1);
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    match run(&matches) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_export() {
        let matches = cli()
            .try_get_matches_from([
                "sjx", "--config", "sjx.toml", "export", "--db", "prod.json", "--appeal",
                "3f2c7e3a-9d41-4c5b-8e6f-0a1b2c3d4e5f", "--show-pii",
            ])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("sjx.toml"))
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "export");
        assert!(args.get_flag("show-pii"));
        assert_eq!(path(args, "db").unwrap(), PathBuf::from("prod.json"));
    }

    #[test]
    fn import_requires_document() {
        let err = cli()
            .try_get_matches_from(["sjx", "import", "--db", "dev.json"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
