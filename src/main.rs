mod config;
mod models;
mod scanner;
mod storage;
mod upload;
mod viewer;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use config::GalleryConfig;
use models::{format_file_size, MediaFilter, MediaRecord, MediaStore, StoreError};
use scanner::FsProbe;
use storage::{MemoryBackend, PersistenceBackend, SqliteBackend};
use upload::{FileDescriptor, LocalFile};
use viewer::{handle_key, KeyAction, Lightbox};

#[derive(Parser, Debug)]
#[command(name = "pgal")]
#[command(about = "Personal media gallery", long_about = None)]
struct Cli {
    /// SQLite database holding the gallery (overrides PGAL_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Directory seeded asset paths are resolved against (overrides PGAL_ASSET_ROOT)
    #[arg(long, global = true)]
    asset_root: Option<PathBuf>,
    /// Keep everything in memory for this run
    #[arg(long, global = true, default_value_t = false)]
    ephemeral: bool,
    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List gallery items
    List {
        #[arg(long, value_enum, default_value = "all")]
        filter: MediaFilter,
    },
    /// Upload image or video files
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete an item by id
    Remove {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Look for media under the asset folders
    Scan {
        /// List the asset folders instead of probing the fixed filename guesses
        #[arg(long, default_value_t = false)]
        from_dir: bool,
    },
    /// Write a gallery-backup-<date>.json file
    Export {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Merge items from a backup file
    Import { file: PathBuf },
    /// Show total size of stored media
    Usage,
    /// Delete all items and the stored slot
    Clear {
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Replay viewer keys (Escape, ArrowLeft, ArrowRight, Delete) and print what is shown
    View {
        #[arg(long, value_enum, default_value = "all")]
        filter: MediaFilter,
        /// Index in the filtered list to open first
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// Delete without asking when the Delete key is replayed
        #[arg(short, long, default_value_t = false)]
        yes: bool,
        keys: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "pgal=debug" } else { "pgal=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = GalleryConfig::load()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(root) = cli.asset_root {
        config.asset_root = root;
    }
    debug!(?config, "Loaded configuration");

    let backend: Box<dyn PersistenceBackend> = if cli.ephemeral {
        Box::new(MemoryBackend::with_quota(config.quota_bytes))
    } else {
        Box::new(SqliteBackend::open(&config.db_path, Some(config.quota_bytes))?)
    };
    let probe = FsProbe::new(&config.asset_root);
    let mut store = MediaStore::with_key(backend, Box::new(probe.clone()), &config.storage_key);
    store.initialize();

    match cli.command {
        Commands::List { filter } => print_list(&store, filter),
        Commands::Add { files } => add_files(&mut store, &files).await?,
        Commands::Remove { id, yes } => {
            let Some(record) = store.get(&id) else {
                println!("No item with id {id}");
                return Ok(());
            };
            if !yes && !confirm(&format!("Delete '{}'?", record.name))? {
                return Ok(());
            }
            store.remove(&id).map_err(surface)?;
            println!("Deleted {id}");
        }
        Commands::Scan { from_dir } => {
            let candidates = if from_dir {
                scanner::directory_candidates(probe.root())
            } else {
                scanner::guess_candidates()
            };
            let report = store.seed_from_candidates(&candidates).await;
            println!(
                "Probed {} paths, found {}, added {}",
                report.probed, report.found, report.added
            );
            if let Some(err) = report.persist_error {
                return Err(surface(err));
            }
        }
        Commands::Export { out } => {
            let path = store.write_export(&out)?;
            println!("Exported {} items to {}", store.len(), path.display());
        }
        Commands::Import { file } => {
            let count = store.import_file(&file).await.map_err(surface)?;
            println!("Imported {count} items");
        }
        Commands::Usage => {
            if store.is_empty() {
                println!("{}", MediaFilter::All.empty_message());
                return Ok(());
            }
            println!("{} items, {}", store.len(), store.storage_usage());
            let dups = store.duplicate_ids();
            if !dups.is_empty() {
                println!("{} ids appear more than once (from imports)", dups.len());
            }
        }
        Commands::Clear { yes } => {
            if !yes && !confirm("Delete all data?")? {
                return Ok(());
            }
            store.clear_all().map_err(surface)?;
            println!("Cleared gallery");
        }
        Commands::View {
            filter,
            start,
            yes,
            keys,
        } => {
            let mut lightbox = Lightbox::new(&store, filter);
            if lightbox.open(start).is_none() {
                match lightbox.items().len() {
                    0 => println!("{}", filter.empty_message()),
                    n => println!("No item at index {start}; the view holds {n} items"),
                }
                return Ok(());
            }
            print_shown(&lightbox);
            for key in keys {
                let Some(action) = KeyAction::from_key(&key) else {
                    warn!(%key, "Unbound key");
                    continue;
                };
                let confirm_delete = |record: &MediaRecord| {
                    yes || confirm(&format!("Delete '{}'?", record.name)).unwrap_or_else(|e| {
                        warn!(error = %e, "Delete not confirmed");
                        false
                    })
                };
                if !handle_key(&mut lightbox, &mut store, action, confirm_delete).map_err(surface)? {
                    debug!(%key, "Viewer closed, key ignored");
                    continue;
                }
                print_shown(&lightbox);
            }
        }
    }

    Ok(())
}

fn print_list(store: &MediaStore, filter: MediaFilter) {
    let items = store.list(filter);
    if items.is_empty() {
        println!("{}", filter.empty_message());
        return;
    }
    for record in &items {
        println!("{}", describe(record));
    }
}

fn describe(record: &MediaRecord) -> String {
    let origin = match (record.source_path(), record.payload()) {
        (Some(path), _) => format!("folder:{path}"),
        (None, Some(payload)) => format!("upload:{}", format_file_size(payload.len() as u64)),
        (None, None) => "upload".to_string(),
    };
    format!(
        "{}\t{}\t{}\t{}\t{}",
        record.id,
        record.kind.as_str(),
        format_file_size(record.size_bytes),
        origin,
        record.name
    )
}

fn print_shown(lightbox: &Lightbox) {
    match lightbox.current() {
        Some(record) => println!(
            "[{}/{}] {}",
            lightbox.index() + 1,
            lightbox.items().len(),
            describe(record)
        ),
        None => println!("(viewer closed)"),
    }
}

async fn add_files(store: &mut MediaStore, paths: &[PathBuf]) -> Result<()> {
    let mut opened = Vec::with_capacity(paths.len());
    for path in paths {
        match LocalFile::open(path).await {
            Ok(file) => opened.push(file),
            Err(source) => {
                let err = StoreError::Read {
                    name: path.display().to_string(),
                    source,
                };
                eprintln!("Skipped: {err}");
            }
        }
    }

    for file in &opened {
        debug!(path = ?file.path(), declared = file.declared_type(), "Uploading");
    }
    let files: Vec<&dyn FileDescriptor> = opened.iter().map(|f| f as &dyn FileDescriptor).collect();
    let report = store.add_uploaded_batch(&files).await;

    for (name, err) in &report.failed {
        eprintln!("Skipped {name}: {err}");
    }
    println!("Added {} of {} files", report.added.len(), paths.len());

    if let Some(err) = report.persist_error {
        return Err(surface(err));
    }
    Ok(())
}

/// Turns store errors into a user-facing message.
fn surface(err: StoreError) -> anyhow::Error {
    if err.is_quota_exceeded() {
        anyhow::Error::new(err).context("Storage is full. Delete some items and try again")
    } else {
        anyhow::Error::new(err)
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read confirmation")?;
    if read == 0 {
        bail!("No confirmation given");
    }
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
