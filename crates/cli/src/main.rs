// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use earmark_config::{Config, ConfigManager};
use earmark_database::{DatabaseConfig, LibraryStore, SqliteKvStore};
use std::path::PathBuf;
use std::sync::Arc;

mod commands;

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_name("BOOK_ID")
        .help("Book ID (UUID, or a unique prefix of one)")
}

fn build_cli() -> Command {
    Command::new("earmark")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Audiobook library manager")
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .help("Path to the library database (defaults to the configured one)")
                .global(true),
        )
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .global(true),
        )
        .subcommand(
            Command::new("import")
                .about("Import audio files, or a directory of them, as one audiobook")
                .arg(
                    Arg::new("paths")
                        .required(true)
                        .num_args(1..)
                        .value_name("PATH")
                        .help("Audio files, or a single directory to scan"),
                )
                .arg(Arg::new("title").short('t').long("title").value_name("TITLE").help("Override the detected title"))
                .arg(Arg::new("author").short('a').long("author").value_name("AUTHOR").help("Book author"))
                .arg(Arg::new("artwork").long("artwork").value_name("URI").help("Cover artwork location")),
        )
        .subcommand(
            Command::new("list")
                .about("List all audiobooks in the library")
                .arg(
                    Arg::new("unfinished")
                        .short('u')
                        .long("unfinished")
                        .help("Hide finished books")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the records as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("info")
                .about("Show details, parts and notes of an audiobook")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove an audiobook and its notes from the library")
                .arg(id_arg())
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .help("Skip confirmation prompt")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("finish")
                .about("Mark an audiobook as finished")
                .arg(id_arg())
                .arg(
                    Arg::new("undo")
                        .long("undo")
                        .help("Mark it unfinished instead")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("order")
                .about("Show how files would be ordered and titled, without importing")
                .arg(
                    Arg::new("names")
                        .required(true)
                        .num_args(1..)
                        .value_name("NAME")
                        .help("File names, or a single directory to scan"),
                ),
        )
        .subcommand(
            Command::new("note")
                .about("Manage notes and bookmarks")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a note at a position")
                        .arg(id_arg())
                        .arg(
                            Arg::new("position")
                                .required(true)
                                .value_name("POSITION")
                                .help("Seconds, or [h:]mm:ss"),
                        )
                        .arg(Arg::new("text").value_name("TEXT").help("Note text or bookmark label"))
                        .arg(
                            Arg::new("bookmark")
                                .short('b')
                                .long("bookmark")
                                .help("Store as a bookmark")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(Command::new("list").about("List notes of an audiobook").arg(id_arg()))
                .subcommand(
                    Command::new("delete")
                        .about("Delete a note")
                        .arg(Arg::new("note").required(true).value_name("NOTE_ID").help("Note ID")),
                ),
        )
        .subcommand(
            Command::new("settings")
                .about("Show or change listener settings")
                .arg(u32_arg("skip-forward", "Seconds jumped by skip forward"))
                .arg(u32_arg("skip-backward", "Seconds jumped by skip backward"))
                .arg(u32_arg("auto-rewind", "Seconds rewound when resuming"))
                .arg(u32_arg("sleep-minutes", "Default sleep timer duration (0 clears it)"))
                .arg(
                    Arg::new("rate")
                        .long("rate")
                        .value_name("RATE")
                        .value_parser(clap::value_parser!(f32))
                        .help("Preferred playback rate (0.5 - 3.0)"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show the active configuration")
                .arg(
                    Arg::new("init")
                        .long("init")
                        .help("Write a default config file if none exists")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("reset")
                        .long("reset")
                        .help("Overwrite the config file with defaults")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn u32_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("N")
        .value_parser(clap::value_parser!(u32))
        .help(help)
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    match matches.get_one::<String>("config-dir") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    }
    .context("Failed to set up configuration directory")
}

async fn open_store(
    matches: &ArgMatches,
    manager: &ConfigManager,
    config: &Config,
) -> Result<Arc<LibraryStore>> {
    let path = match matches.get_one::<String>("database") {
        Some(path) => PathBuf::from(path),
        None => manager.database_path(config),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let db_config = DatabaseConfig::new(path.clone())
        .with_wal(config.storage.enable_wal)
        .with_max_connections(config.storage.max_connections);
    let kv = SqliteKvStore::open(db_config)
        .await
        .with_context(|| format!("Failed to open library at {}", path.display()))?;

    log::debug!("Using library database {}", path.display());
    Ok(Arc::new(LibraryStore::new(Arc::new(kv))))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();

    let manager = config_manager(&matches)?;
    let config = manager
        .load_with_env_overrides()
        .unwrap_or_else(|e| {
            log::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        });

    match matches.subcommand() {
        Some(("config", sub_matches)) => commands::show_config(&manager, sub_matches),
        Some(("order", sub_matches)) => commands::order_dry_run(sub_matches),
        Some((name, sub_matches)) => {
            let store = open_store(&matches, &manager, &config).await?;
            match name {
                "import" => commands::import_book(&store, sub_matches).await,
                "list" => commands::list_books(&store, sub_matches).await,
                "info" => commands::show_book_info(&store, sub_matches).await,
                "remove" => commands::remove_book(&store, sub_matches).await,
                "finish" => commands::mark_finished(&store, sub_matches).await,
                "note" => commands::note(&store, sub_matches).await,
                "settings" => commands::settings(&store, sub_matches).await,
                _ => {
                    build_cli().print_help()?;
                    Ok(())
                }
            }
        }
        None => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
