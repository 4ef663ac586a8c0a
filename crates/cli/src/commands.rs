// FILE: crates/cli/src/commands.rs

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use console::style;
use earmark_config::ConfigManager;
use earmark_core::{
    Audiobook, AudiobookPatch, BookId, ListeningTime, NewNote, NoteId, NoteKind, SettingsPatch,
    Timestamp, Validator,
};
use earmark_database::LibraryStore;
use earmark_library::{
    order_files, source_file, BookImporter, ImportOptions, LibraryScanner, SourceFile,
};
use std::path::Path;
use std::sync::Arc;


/// Import files, or one directory, as a single audiobook
pub async fn import_book(store: &Arc<LibraryStore>, matches: &ArgMatches) -> Result<()> {
    let paths: Vec<&String> = matches
        .get_many::<String>("paths")
        .ok_or_else(|| anyhow!("At least one path is required"))?
        .collect();

    let files = gather_sources(&paths)?;
    if files.is_empty() {
        bail!("No audio files found");
    }

    let mut options = ImportOptions::default();
    if let Some(title) = matches.get_one::<String>("title") {
        options = options.with_title(title);
    }
    if let Some(author) = matches.get_one::<String>("author") {
        options = options.with_author(author);
    }
    if let Some(artwork) = matches.get_one::<String>("artwork") {
        options = options.with_artwork(artwork);
    }

    let book = BookImporter::new(store.clone())
        .import_files(&files, options)
        .await
        .context("Failed to import audiobook")?;

    println!("{} Audiobook imported!", style("✓").green().bold());
    println!("  ID: {}", book.id);
    println!("  Title: {}", book.title);
    if let Some(author) = &book.author {
        println!("  Author: {}", author);
    }
    println!("  Parts: {}", book.part_count());

    Ok(())
}

/// Print how a set of files would be ordered and titled
pub fn order_dry_run(matches: &ArgMatches) -> Result<()> {
    let names: Vec<&String> = matches
        .get_many::<String>("names")
        .ok_or_else(|| anyhow!("At least one name is required"))?
        .collect();

    let files = match names.as_slice() {
        [single] if Path::new(single.as_str()).is_dir() => LibraryScanner::new()
            .scan(Path::new(single.as_str()))
            .context("Failed to scan directory")?,
        _ => names
            .iter()
            .map(|name| SourceFile::new(name.as_str(), name.as_str()))
            .collect(),
    };

    let ordered = order_files(&files);
    println!("\nTitle: {}", style(&ordered.title).bold());
    println!("{}", "=".repeat(80));

    for (index, part) in ordered.parts.iter().enumerate() {
        let number = part
            .part_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:>4}. [{:>4}] {}", index + 1, number, part.filename);
    }

    Ok(())
}

/// List all audiobooks in the library
pub async fn list_books(store: &LibraryStore, matches: &ArgMatches) -> Result<()> {
    let mut books = store.get_audiobooks().await;
    if matches.get_flag("unfinished") {
        books.retain(|b| !b.finished());
    }

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&books).context("Failed to serialize to JSON")?;
        println!("{}", json);
        return Ok(());
    }

    if books.is_empty() {
        println!("No audiobooks in library. Use 'import' to add some.");
        return Ok(());
    }

    books.sort_by(|a, b| b.last_played_at.cmp(&a.last_played_at).then(a.title.cmp(&b.title)));

    println!("\n{} Audiobooks in Library", style(books.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for book in &books {
        print_book_summary(book);
    }

    Ok(())
}

/// Show details, parts and notes of one audiobook
pub async fn show_book_info(store: &LibraryStore, matches: &ArgMatches) -> Result<()> {
    let book = resolve_book(store, required(matches, "id")?).await?;

    println!("\n{}", style("Audiobook Information").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("ID: {}", book.id);
    println!("Title: {}", style(&book.title).bold());
    if let Some(author) = &book.author {
        println!("Author: {}", author);
    }
    if let Some(artwork) = &book.artwork_uri {
        println!("Artwork: {}", artwork);
    }
    if let Some(total) = book.total_duration_seconds {
        println!("Duration: {}", format_position(total));
    }

    println!("\nProgress:");
    if book.is_multi_part() {
        println!(
            "  Part {} of {}",
            book.resolved_part_index() + 1,
            book.part_count()
        );
    }
    println!("  Position: {}", format_position(book.current_position_seconds));
    println!("  Finished: {}", if book.finished() { "Yes" } else { "No" });
    if let Some(last_played) = book.last_played_at {
        println!("  Last Played: {}", played_ago(last_played.until(Timestamp::now())));
    }

    match &book.parts {
        Some(parts) if book.is_multi_part() => {
            println!("\nParts:");
            for (index, part) in parts.iter().enumerate() {
                let marker = if index == book.resolved_part_index() { "▶" } else { " " };
                let duration = part
                    .duration_seconds
                    .map(format_position)
                    .unwrap_or_else(|| "?".to_string());
                println!("  {} {:>3}. {} ({})", marker, index + 1, part.filename, duration);
            }
        }
        _ => println!("\nFile: {}", book.uri),
    }

    let notes = store.get_notes(book.id).await;
    if !notes.is_empty() {
        println!("\nNotes:");
        for note in notes {
            print_note(&note);
        }
    }

    Ok(())
}

/// Remove an audiobook and its notes
pub async fn remove_book(store: &LibraryStore, matches: &ArgMatches) -> Result<()> {
    let book = resolve_book(store, required(matches, "id")?).await?;

    if !matches.get_flag("force") {
        println!("Are you sure you want to remove '{}'? (y/N)", book.title);
        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Removal cancelled.");
            return Ok(());
        }
    }

    store.delete_audiobook(book.id).await;
    println!("{} Audiobook removed: {}", style("✓").green().bold(), book.title);

    Ok(())
}

pub async fn mark_finished(store: &LibraryStore, matches: &ArgMatches) -> Result<()> {
    let book = resolve_book(store, required(matches, "id")?).await?;
    let finished = !matches.get_flag("undo");

    store
        .update_audiobook(book.id, &AudiobookPatch::new().finished(finished))
        .await;

    let label = if finished { "finished" } else { "unfinished" };
    println!("{} Marked '{}' {}", style("✓").green().bold(), book.title, label);
    Ok(())
}

pub async fn note(store: &LibraryStore, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("add", sub)) => add_note(store, sub).await,
        Some(("list", sub)) => list_notes(store, sub).await,
        Some(("delete", sub)) => delete_note(store, sub).await,
        _ => bail!("Unknown note command"),
    }
}

async fn add_note(store: &LibraryStore, matches: &ArgMatches) -> Result<()> {
    let book = resolve_book(store, required(matches, "id")?).await?;
    let position = parse_position(required(matches, "position")?)?;
    let text = matches
        .get_one::<String>("text")
        .cloned()
        .unwrap_or_default();

    let new_note = if matches.get_flag("bookmark") {
        NewNote::bookmark(book.id, position, text)
    } else {
        NewNote::note(book.id, position, text)
    };

    let note = store
        .add_note(new_note)
        .await
        .context("Failed to add note")?;

    println!(
        "{} Added {} at {} to '{}'",
        style("✓").green().bold(),
        kind_label(note.kind),
        format_position(note.position_seconds),
        book.title
    );
    println!("  ID: {}", note.id);
    Ok(())
}

async fn list_notes(store: &LibraryStore, matches: &ArgMatches) -> Result<()> {
    let book = resolve_book(store, required(matches, "id")?).await?;
    let notes = store.get_notes(book.id).await;

    if notes.is_empty() {
        println!("No notes for '{}'.", book.title);
        return Ok(());
    }

    println!("\n{} Notes for '{}'", style(notes.len()).bold().cyan(), book.title);
    println!("{}", "=".repeat(80));
    for note in &notes {
        print_note(note);
    }
    Ok(())
}

async fn delete_note(store: &LibraryStore, matches: &ArgMatches) -> Result<()> {
    let id = NoteId::from_string(required(matches, "note")?).context("Invalid note ID format")?;
    store.delete_note(id).await;
    println!("{} Note deleted", style("✓").green().bold());
    Ok(())
}

/// Show settings, applying any given changes first
pub async fn settings(store: &LibraryStore, matches: &ArgMatches) -> Result<()> {
    let patch = SettingsPatch {
        skip_forward_seconds: matches.get_one::<u32>("skip-forward").copied(),
        skip_backward_seconds: matches.get_one::<u32>("skip-backward").copied(),
        playback_rate: matches.get_one::<f32>("rate").copied(),
        sleep_timer_minutes: matches
            .get_one::<u32>("sleep-minutes")
            .map(|m| Some(*m).filter(|m| *m > 0)),
        auto_rewind_seconds: matches.get_one::<u32>("auto-rewind").copied(),
    };

    let settings = if patch == SettingsPatch::default() {
        store.get_settings().await
    } else {
        let mut candidate = store.get_settings().await;
        candidate.merge(&patch);
        if let Err(errors) = candidate.validate() {
            bail!("Invalid settings: {}", errors.join("; "));
        }
        let saved = store.save_settings(&patch).await;
        println!("{} Settings saved", style("✓").green().bold());
        saved
    };

    println!("\n{}", style("Settings").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Skip forward:  {}s", settings.skip_forward_seconds);
    println!("Skip backward: {}s", settings.skip_backward_seconds);
    println!("Playback rate: {:.2}x", settings.playback_rate);
    println!("Auto-rewind:   {}s", settings.auto_rewind_seconds);
    match settings.sleep_timer_minutes {
        Some(minutes) => println!("Sleep timer:   {} min", minutes),
        None => println!("Sleep timer:   off"),
    }

    Ok(())
}

/// Show the active configuration, optionally creating or resetting it
pub fn show_config(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("reset") {
        manager.reset().context("Failed to reset config")?;
        println!("{} Config reset to defaults", style("✓").green().bold());
    } else if matches.get_flag("init") {
        if manager.initialize().context("Failed to write config")? {
            println!("{} Config created", style("✓").green().bold());
        }
    }

    let config = manager.load().context("Failed to load config")?;

    println!("\n{}", style("Configuration").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Config file: {}", manager.config_path().display());
    println!("Database:    {}", manager.database_path(&config).display());
    println!("WAL:         {}", config.storage.enable_wal);
    println!("Poll:        {:?}", config.session.poll_interval());
    println!("Auto-save:   {:?}", config.session.autosave_interval());
    println!("Sleep tick:  {:?}", config.session.sleep_timer_tick());
    println!("Load tries:  {}", config.session.load_attempts);

    for problem in manager.validate().context("Failed to validate config")? {
        println!("{} {}", style("!").yellow().bold(), problem);
    }

    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("Argument '{}' is required", name))
}

/// Turns command-line paths into import candidates
///
/// A single directory is scanned; anything else must be a list of files.
fn gather_sources(paths: &[&String]) -> Result<Vec<SourceFile>> {
    if let [single] = paths {
        let dir = Path::new(single.as_str());
        if dir.is_dir() {
            return LibraryScanner::new()
                .scan(dir)
                .with_context(|| format!("Failed to scan {}", dir.display()));
        }
    }

    paths
        .iter()
        .map(|path| {
            let path = Path::new(path.as_str());
            if !path.is_file() {
                bail!("File not found: {}", path.display());
            }
            source_file(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect()
}

/// Finds a book by full id or by a unique id prefix
async fn resolve_book(store: &LibraryStore, id: &str) -> Result<Audiobook> {
    if let Ok(book_id) = BookId::from_string(id) {
        return store
            .get_audiobook(book_id)
            .await
            .ok_or_else(|| anyhow!("No audiobook with ID {}", id));
    }

    let prefix = id.trim().to_lowercase();
    if prefix.is_empty() {
        bail!("Book ID is required");
    }

    let mut matches: Vec<Audiobook> = store
        .get_audiobooks()
        .await
        .into_iter()
        .filter(|b| b.id.as_string().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => bail!("No audiobook with ID starting with '{}'", id),
        1 => Ok(matches.remove(0)),
        n => bail!("ID prefix '{}' is ambiguous ({} matches)", id, n),
    }
}

/// Parses seconds (`75.5`) or clock notation (`1:15`, `1:02:03`)
fn parse_position(input: &str) -> Result<f64> {
    let input = input.trim();
    let mut seconds = 0.0;

    for (index, field) in input.split(':').enumerate() {
        if index > 2 {
            bail!("Invalid position '{}'", input);
        }
        let value: f64 = field
            .parse()
            .with_context(|| format!("Invalid position '{}'", input))?;
        if !value.is_finite() || value < 0.0 {
            bail!("Invalid position '{}'", input);
        }
        seconds = seconds * 60.0 + value;
    }

    Ok(seconds)
}

fn format_position(seconds: f64) -> String {
    ListeningTime::from_seconds(seconds).to_string()
}

fn played_ago(elapsed: std::time::Duration) -> String {
    let minutes = elapsed.as_secs() / 60;
    match minutes {
        0 => "just now".to_string(),
        1..=59 => format!("{} min ago", minutes),
        60..=1439 => format!("{} h ago", minutes / 60),
        _ => format!("{} days ago", minutes / 1440),
    }
}

fn kind_label(kind: NoteKind) -> &'static str {
    match kind {
        NoteKind::Note => "note",
        NoteKind::Bookmark => "bookmark",
    }
}

fn print_note(note: &earmark_core::Note) {
    let marker = match note.kind {
        NoteKind::Note => style("✎").cyan(),
        NoteKind::Bookmark => style("★").yellow(),
    };
    println!(
        "  {} {} {}  {}",
        marker,
        format_position(note.position_seconds),
        note.text,
        style(truncate(&note.id.to_string(), 8)).dim()
    );
}

fn print_book_summary(book: &Audiobook) {
    println!("\n{}", style(&book.title).bold());
    if let Some(author) = &book.author {
        println!("  by {}", author);
    }

    let duration = book
        .total_duration_seconds
        .map(|s| ListeningTime::from_seconds(s).compact())
        .unwrap_or_else(|| "?".to_string());
    println!(
        "  ID: {} | Duration: {} | Parts: {}",
        truncate(&book.id.to_string(), 8),
        duration,
        book.part_count()
    );

    if book.finished() {
        print!("  {}", style("✓ Finished").green());
    } else if book.current_position_seconds > 0.0 {
        print!("  At {}", format_position(book.current_position_seconds));
        if book.is_multi_part() {
            print!(" in part {}", book.resolved_part_index() + 1);
        }
    }
    println!();
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}
