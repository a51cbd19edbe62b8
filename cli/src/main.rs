mod config;

use std::path::PathBuf;
use std::process;

use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use blockdoc::document::Document;
use blockdoc::parser::ParseDiagnostic;
use blockdoc::render::render_document;
use drafts::{DirStore, PostKey, SnapshotStore};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "blockdoc", version, about = "Blog post content pipeline")]
struct Cli {
    /// Disable colored diagnostic output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (defaults to ./blockdoc.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import editor HTML into Document JSON
    Import(ImportArgs),

    /// Render Document JSON back to HTML
    Render(RenderArgs),

    /// Parse HTML and report import diagnostics
    Check(CheckArgs),

    /// List the blocks an HTML file imports as
    Blocks(FileArg),

    /// Verify that rendering and re-importing a file is stable
    Roundtrip(FileArg),

    /// Inspect or clean the local draft store
    Drafts(DraftsArgs),
}

#[derive(clap::Args)]
struct ImportArgs {
    /// HTML source file
    file: String,

    /// Write the JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Document JSON file
    file: String,

    /// Write the HTML here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// HTML source file
    file: String,

    /// Exit non-zero if any diagnostic is emitted
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args)]
struct FileArg {
    /// HTML source file
    file: String,
}

#[derive(clap::Args)]
struct DraftsArgs {
    /// Draft store directory (defaults to the configured one)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    action: DraftsAction,
}

#[derive(Subcommand)]
enum DraftsAction {
    /// List stored snapshots with their age
    List,

    /// Print one snapshot's document as pretty JSON
    Show {
        /// Storage key, e.g. autosave_post_42
        key: String,
    },

    /// Remove snapshots
    Purge {
        /// Only remove entries past the restore window (and corrupt ones)
        #[arg(long)]
        stale_only: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let code = match &cli.command {
        Command::Import(args) => do_import(args, &config, cli.no_color),
        Command::Render(args) => do_render(args),
        Command::Check(args) => do_check(args, &config, cli.no_color),
        Command::Blocks(args) => do_blocks(args, &config, cli.no_color),
        Command::Roundtrip(args) => do_roundtrip(args, &config, cli.no_color),
        Command::Drafts(args) => do_drafts(args, &config),
    };
    process::exit(code);
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

/// Read and parse an HTML file, emitting any diagnostics. Exits on I/O
/// failure since nothing can proceed without the source.
fn parse_file(file: &str, config: &Config, no_color: bool) -> blockdoc::parser::Import {
    let source = match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());

    let parser =
        blockdoc::parser::Parser::with_options(source, file_id, config.parser_options());
    let import = parser.parse();
    emit_diagnostics(&files, &import.diagnostics, no_color);
    import
}

fn do_import(args: &ImportArgs, config: &Config, no_color: bool) -> i32 {
    let import = parse_file(&args.file, config, no_color);
    let document = Document::new(import.blocks, Utc::now().timestamp_millis());

    let json = if args.pretty {
        document.to_json_pretty()
    } else {
        document.to_json()
    };
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            eprintln!("error: cannot serialize document: {e}");
            return 1;
        }
    };

    write_output(args.output.as_deref(), &json)
}

fn do_render(args: &RenderArgs) -> i32 {
    let raw = match std::fs::read_to_string(&args.file) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            return 1;
        }
    };
    let document = match Document::from_json(&raw) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("error: '{}' is not a valid document: {}", args.file, e);
            return 1;
        }
    };

    write_output(args.output.as_deref(), &render_document(&document))
}

fn do_check(args: &CheckArgs, config: &Config, no_color: bool) -> i32 {
    let import = parse_file(&args.file, config, no_color);
    let warnings = import.diagnostics.len();
    eprintln!(
        "ok: {} imported as {} block(s), {} warning(s)",
        args.file,
        import.blocks.len(),
        warnings
    );
    if args.strict && warnings > 0 { 1 } else { 0 }
}

fn do_blocks(args: &FileArg, config: &Config, no_color: bool) -> i32 {
    let import = parse_file(&args.file, config, no_color);
    for block in &import.blocks {
        println!("{:<10} {}", block.type_name(), block_summary(block));
    }
    0
}

fn do_roundtrip(args: &FileArg, config: &Config, no_color: bool) -> i32 {
    let first = parse_file(&args.file, config, no_color);
    let html = blockdoc::render::render_blocks(&first.blocks);
    let second =
        blockdoc::parser::Parser::with_options(html, 0, config.parser_options()).parse();

    if first.blocks == second.blocks {
        eprintln!("ok: {} block(s) stable through render", first.blocks.len());
        0
    } else {
        eprintln!(
            "roundtrip mismatch: {} block(s) in, {} block(s) after re-import",
            first.blocks.len(),
            second.blocks.len()
        );
        for (index, (a, b)) in first.blocks.iter().zip(&second.blocks).enumerate() {
            if a != b {
                eprintln!("  first difference at block {index}: {a:?} != {b:?}");
                break;
            }
        }
        2
    }
}

fn do_drafts(args: &DraftsArgs, config: &Config) -> i32 {
    let dir = args.dir.clone().unwrap_or_else(|| config.drafts_dir());
    let mut store = match DirStore::open(&dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };
    let now_ms = Utc::now().timestamp_millis();

    match &args.action {
        DraftsAction::List => {
            let keys = match store.keys() {
                Ok(keys) => keys,
                Err(e) => {
                    eprintln!("error: {e}");
                    return 1;
                }
            };
            for key in keys {
                if PostKey::from_storage_key(&key).is_none() {
                    continue;
                }
                match store.get(&key) {
                    Ok(Some(snapshot)) => {
                        let marker = if snapshot.is_stale(now_ms) {
                            " (stale)"
                        } else {
                            ""
                        };
                        println!(
                            "{:<24} {:<10} '{}'{}",
                            key,
                            age_of(snapshot.timestamp, now_ms),
                            snapshot.title,
                            marker
                        );
                    }
                    Ok(None) => {}
                    Err(e) => println!("{:<24} (unreadable: {})", key, e),
                }
            }
            0
        }
        DraftsAction::Show { key } => match store.get(key) {
            Ok(Some(snapshot)) => match snapshot.document() {
                Ok(document) => match document.to_json_pretty() {
                    Ok(json) => {
                        println!("{json}");
                        0
                    }
                    Err(e) => {
                        eprintln!("error: {e}");
                        1
                    }
                },
                Err(e) => {
                    eprintln!("error: snapshot '{key}' holds an invalid document: {e}");
                    1
                }
            },
            Ok(None) => {
                eprintln!("error: no snapshot under '{key}'");
                1
            }
            Err(e) => {
                eprintln!("error: {e}");
                1
            }
        },
        DraftsAction::Purge { stale_only } => {
            let removed = if *stale_only {
                drafts::purge_stale(&mut store, now_ms)
            } else {
                remove_all(&mut store)
            };
            match removed {
                Ok(removed) => {
                    eprintln!("removed {} snapshot(s)", removed.len());
                    0
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    1
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn remove_all(store: &mut DirStore) -> Result<Vec<String>, drafts::StoreError> {
    let mut removed = Vec::new();
    for key in store.keys()? {
        if PostKey::from_storage_key(&key).is_some() {
            store.remove(&key)?;
            removed.push(key);
        }
    }
    Ok(removed)
}

fn write_output(output: Option<&std::path::Path>, content: &str) -> i32 {
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, content) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                return 1;
            }
            0
        }
        None => {
            println!("{content}");
            0
        }
    }
}

fn emit_diagnostics(
    files: &SimpleFiles<String, String>,
    diagnostics: &[ParseDiagnostic],
    no_color: bool,
) {
    if diagnostics.is_empty() {
        return;
    }
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for diagnostic in diagnostics {
        let _ = term::emit_to_write_style(
            &mut writer.lock(),
            &config,
            files,
            &diagnostic.to_diagnostic(),
        );
    }
}

/// One-line description of a block for the outline listing.
fn block_summary(block: &blockdoc::Block) -> String {
    use blockdoc::Block;
    match block {
        Block::Paragraph { content } => excerpt(content),
        Block::Header { level, content } => format!("h{level} {}", excerpt(content)),
        Block::Quote { content } => excerpt(content),
        Block::Code { language, content } => {
            format!("[{language}] {} line(s)", content.lines().count())
        }
        Block::List { items, .. } => format!("{} item(s)", items.len()),
        Block::Image { url, .. } => url.clone(),
        Block::Table { rows } => format!("{} row(s)", rows.len()),
        Block::Delimiter => String::new(),
        Block::Embed {
            service, source, ..
        } => format!("{} {}", service.as_str(), source),
        Block::File { data } => data.name.clone(),
        Block::Unknown => String::new(),
    }
}

fn excerpt(content: &str) -> String {
    let mut text: String = content.chars().take(48).collect();
    if content.chars().count() > 48 {
        text.push('\u{2026}');
    }
    text
}

fn age_of(timestamp_ms: i64, now_ms: i64) -> String {
    let Some(then) = Utc.timestamp_millis_opt(timestamp_ms).single() else {
        return "?".to_string();
    };
    let Some(now) = Utc.timestamp_millis_opt(now_ms).single() else {
        return "?".to_string();
    };
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 48 * 60 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (24 * 60))
    }
}
