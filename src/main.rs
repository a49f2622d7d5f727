use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagenotes::bundle::{backup_file_name, inspect_bundle};
use pagenotes::config::Config;
use pagenotes::db::Database;
use pagenotes::keys::derive_key;
use pagenotes::models::{is_blank, Scope};
use pagenotes::session::Session;
use pagenotes::store::NoteStore;

#[derive(Parser)]
#[command(name = "pnote")]
#[command(about = "Notes attached to web pages by exact URL, path or origin")]
struct Cli {
    /// Database path (overrides PAGENOTES_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the storage key derived for a URL
    Key {
        url: String,
        /// exact, path or origin (defaults to the saved default scope)
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },
    /// Print the note stored for a URL
    Show {
        url: String,
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },
    /// Save a note for a URL; blank content deletes it
    Save {
        url: String,
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
        /// Page title to record with the note
        #[arg(short, long)]
        title: Option<String>,
        /// Note content (read from stdin when omitted)
        content: Option<String>,
    },
    /// Stream a note body from stdin, autosaving as lines arrive
    Edit {
        url: String,
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Delete the note for a URL
    Delete {
        url: String,
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },
    /// List notes, newest first, optionally filtered
    List { query: Option<String> },
    /// Print or change the default scope
    Scope {
        #[arg(value_parser = parse_scope)]
        scope: Option<Scope>,
    },
    /// Export every note to a JSON bundle
    Export {
        /// Output file, or "-" for stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Import notes from a JSON bundle, overwriting on key conflicts
    Import {
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn parse_scope(s: &str) -> Result<Scope, String> {
    Scope::from_str(s)
        .ok_or_else(|| format!("invalid scope '{}': expected exact, path or origin", s))
}

/// Log to stderr so stdout carries only command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "pagenotes=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env()?;
    let db_path = cli.db.unwrap_or(config.db_path);
    let db = Database::open(db_path.clone())
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    db.migrate()?;

    let mut session = Session::start(NoteStore::new(db), config.autosave_delay).await?;

    match cli.command {
        Commands::Key { url, scope } => {
            let derived = derive_key(&url, scope.unwrap_or(session.scope()));
            println!("{}", derived.key);
        }
        Commands::Show { url, scope } => {
            let scope = scope.unwrap_or(session.scope());
            let derived = derive_key(&url, scope);
            match session.store().get_note(scope, &derived.key).await? {
                Some(note) => println!("{}", note.content),
                None => eprintln!("No note for {} ({})", derived.key, scope),
            }
        }
        Commands::Save {
            url,
            scope,
            title,
            content,
        } => {
            let content = match content {
                Some(content) => content,
                None => {
                    let mut buf = String::new();
                    tokio::io::stdin().read_to_string(&mut buf).await?;
                    buf
                }
            };

            if let Some(scope) = scope {
                session.use_scope(scope).await?;
            }
            session.open_page(&url, title).await?;
            if session.edit(content.clone()) {
                if let Some(status) = session.flush().await? {
                    println!("{}", status);
                }
            } else if is_blank(&content) {
                println!("Empty");
            } else {
                println!("Unchanged");
            }
        }
        Commands::Edit { url, scope, title } => {
            if let Some(scope) = scope {
                session.use_scope(scope).await?;
            }
            let status = session.open_page(&url, title).await?;
            eprintln!("{}", status);

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut buffer = String::new();
            loop {
                tokio::select! {
                    line = lines.next_line() => match line? {
                        Some(line) => {
                            if !buffer.is_empty() {
                                buffer.push('\n');
                            }
                            buffer.push_str(&line);
                            session.edit(buffer.clone());
                        }
                        None => break,
                    },
                    _ = session.autosave_wait() => match session.fire_autosave().await {
                        Ok(Some(status)) => eprintln!("{}", status),
                        Ok(None) => {}
                        // The edit stays pending and is retried on the next deadline
                        Err(e) => eprintln!("Save failed: {}", e),
                    },
                }
            }

            if let Some(status) = session.flush().await? {
                println!("{}", status);
            }
        }
        Commands::Delete { url, scope } => {
            let scope = scope.unwrap_or(session.scope());
            let derived = derive_key(&url, scope);
            session.delete_note(scope, &derived.key).await?;
            println!("Deleted {} ({})", derived.key, scope);
        }
        Commands::List { query } => {
            let summaries = session.summaries(query.as_deref().unwrap_or("")).await?;
            if summaries.is_empty() {
                println!("No notes");
            }
            for s in summaries {
                println!(
                    "{}  [{}]  {}  {}",
                    s.updated_at_label, s.scope, s.display_title, s.url_sample
                );
                if !s.excerpt.is_empty() {
                    println!("    {}", s.excerpt);
                }
            }
        }
        Commands::Scope { scope } => match scope {
            Some(scope) => {
                session.change_scope(scope).await?;
                println!("Default scope set to {}", scope);
            }
            None => println!("{}", session.scope()),
        },
        Commands::Export { out } => {
            let bundle = session.export_bundle().await?;
            let json = bundle.to_json()?;
            let out = out.unwrap_or_else(|| PathBuf::from(backup_file_name(chrono::Utc::now())));
            if out.as_os_str() == "-" {
                println!("{}", json);
            } else {
                tokio::fs::write(&out, json)
                    .await
                    .with_context(|| format!("Failed to write {}", out.display()))?;
                println!("Exported {} notes to {}", bundle.notes.len(), out.display());
            }
        }
        Commands::Import { file, yes } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let candidates = inspect_bundle(&raw)?.len();

            if !yes {
                eprint!(
                    "Import {} notes? Existing notes with the same key are overwritten. [y/N] ",
                    candidates
                );
                let mut answer = String::new();
                BufReader::new(tokio::io::stdin())
                    .read_line(&mut answer)
                    .await?;
                if !matches!(answer.trim(), "y" | "Y" | "yes") {
                    println!("Import cancelled");
                    return Ok(());
                }
            }

            let report = session.import_bundle(&raw).await?;
            println!(
                "Imported {} of {} notes ({} skipped)",
                report.imported, report.candidates, report.skipped
            );
        }
    }

    Ok(())
}
