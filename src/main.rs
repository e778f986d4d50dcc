//! nbview - command line front end
//!
//! Exports notebooks (single files or whole directories) to standalone
//! HTML, renders markdown documents with their notebook embeds expanded,
//! and can replace the source of one cell without opening an editor.

use anyhow::{bail, Context};
use nbview::config::Config;
use nbview::export::{self, HtmlExportOptions};
use nbview::file_handler::{find_notebooks, ScanConfig};
use nbview::host::{Host, LocalHost};
use nbview::plugin::NotebookPlugin;
use nbview::utils::path::{file_stem, is_markdown, is_notebook};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application name for logging
const APP_NAME: &str = "nbview";

/// Parsed command line
#[derive(Debug, Default)]
struct Flags {
    paths: Vec<PathBuf>,
    output: Option<PathBuf>,
    edit_cell: Option<usize>,
    source: Option<PathBuf>,
    no_embed_outputs: bool,
    max_output_height: Option<u32>,
    config: Option<PathBuf>,
    max_depth: Option<usize>,
    hidden: bool,
    write_config: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let flags = parse_args();
    log::debug!("Starting {} with {:?}", APP_NAME, flags);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(run(flags))
}

/// Initialize the logging system
fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,nbview=debug");
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();
}

async fn run(flags: Flags) -> anyhow::Result<()> {
    let config = load_config(&flags)?;
    if flags.write_config {
        let path = match &flags.config {
            Some(path) => config.save_to(path).map(|_| path.clone()),
            None => config.save(),
        }
        .context("Failed to write configuration")?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let host = Arc::new(LocalHost::with_max_file_size(config.files.max_file_size));
    let plugin = NotebookPlugin::new(host, config);

    if let Some(index) = flags.edit_cell {
        return edit_cell(&plugin, &flags, index).await;
    }

    if flags.output.is_some() && flags.paths.len() > 1 {
        bail!("--output can only be used with a single input");
    }

    let mut failures = 0;
    for path in &flags.paths {
        if let Err(e) = process_path(&plugin, path, &flags).await {
            log::error!("{}: {:#}", path.display(), e);
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} of {} inputs failed", failures, flags.paths.len());
    }
    Ok(())
}

fn load_config(flags: &Flags) -> anyhow::Result<Config> {
    let mut config = match &flags.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            log::warn!("Using default configuration: {}", e);
            Config::default()
        }),
    };

    if flags.no_embed_outputs {
        config.embed.render_outputs = false;
    }
    if let Some(height) = flags.max_output_height {
        config.view.max_output_height = height;
    }
    config.validate()?;
    Ok(config)
}

async fn process_path(
    plugin: &NotebookPlugin<LocalHost>,
    path: &Path,
    flags: &Flags,
) -> anyhow::Result<()> {
    let output = flags.output.as_deref();
    if path.is_dir() {
        let mut scan = ScanConfig::from_ignored(&plugin.config().files.ignored_directories)
            .with_hidden(flags.hidden);
        if let Some(depth) = flags.max_depth {
            scan = scan.with_max_depth(depth);
        }
        let result = find_notebooks(path, &scan)?;
        if result.truncated {
            log::warn!("Stopped scanning {} early, too many entries", path.display());
        }
        log::info!(
            "Found {} notebooks in {} directories",
            result.notebooks.len(),
            result.dirs_scanned
        );
        for notebook in &result.notebooks {
            if let Err(e) = export_notebook(plugin, notebook, None).await {
                log::error!("{}: {:#}", notebook.display(), e);
            }
        }
        Ok(())
    } else if is_notebook(path) {
        export_notebook(plugin, path, output).await
    } else if is_markdown(path) {
        export_markdown(plugin, path, output).await
    } else {
        bail!("Not a notebook, markdown file or directory")
    }
}

async fn export_notebook(
    plugin: &NotebookPlugin<LocalHost>,
    path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut view = plugin.create_view(path);
    view.open().await?;
    let loaded = view.load_images().await;
    log::debug!("Loaded {} images for {}", loaded, path.display());

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| export::suggest_output_path(path));
    let options = HtmlExportOptions {
        title: file_stem(path),
        ..Default::default()
    };
    export::export_to_file(view.root(), &output, &options).await?;
    println!("{} -> {}", path.display(), output.display());
    Ok(())
}

async fn export_markdown(
    plugin: &NotebookPlugin<LocalHost>,
    path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let host = plugin.host();
    let markdown = host.read_text(path).await?;
    let nodes = host.render_markdown(&markdown, path).await;
    let mut root = export::markdown_root(nodes, path, plugin.config());

    let summary = plugin.post_process(&mut root, path).await;
    if summary.failed > 0 {
        log::warn!("{} notebook embeds could not be rendered", summary.failed);
    }

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| export::suggest_output_path(path));
    let options = HtmlExportOptions {
        title: file_stem(path),
        ..Default::default()
    };
    export::export_to_file(&root, &output, &options).await?;
    println!("{} -> {}", path.display(), output.display());
    Ok(())
}

async fn edit_cell(
    plugin: &NotebookPlugin<LocalHost>,
    flags: &Flags,
    index: usize,
) -> anyhow::Result<()> {
    let [path] = flags.paths.as_slice() else {
        bail!("--edit-cell needs exactly one notebook");
    };
    let source_file = flags
        .source
        .as_ref()
        .context("--edit-cell needs --source FILE")?;
    let source = tokio::fs::read_to_string(source_file)
        .await
        .with_context(|| format!("Failed to read {}", source_file.display()))?;

    let mut view = plugin.create_view(path);
    view.open().await?;
    let id = view
        .notebook()
        .and_then(|nb| nb.cells.get(index))
        .map(|cell| cell.handle)
        .with_context(|| format!("Notebook has no cell {}", index))?;

    if !view.begin_edit(id) {
        bail!("Cell {} cannot be edited", index);
    }
    view.set_editor_text(id, &source);
    view.save_edit(id).await?;
    println!("Updated cell {} of {}", index, path.display());
    Ok(())
}

/// Parse command line arguments
fn parse_args() -> Flags {
    let args: Vec<String> = std::env::args().collect();
    let mut flags = Flags::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-o" | "--output" => {
                flags.output = Some(PathBuf::from(value_of(&args, i, "--output")));
                i += 1;
            }
            "-c" | "--config" => {
                flags.config = Some(PathBuf::from(value_of(&args, i, "--config")));
                i += 1;
            }
            "--source" => {
                flags.source = Some(PathBuf::from(value_of(&args, i, "--source")));
                i += 1;
            }
            "--edit-cell" => {
                flags.edit_cell = Some(parse_number(value_of(&args, i, "--edit-cell"), "--edit-cell"));
                i += 1;
            }
            "--max-output-height" => {
                flags.max_output_height = Some(parse_number(
                    value_of(&args, i, "--max-output-height"),
                    "--max-output-height",
                ));
                i += 1;
            }
            "--max-depth" => {
                flags.max_depth = Some(parse_number(value_of(&args, i, "--max-depth"), "--max-depth"));
                i += 1;
            }
            "--hidden" => flags.hidden = true,
            "--write-config" => flags.write_config = true,
            "--no-embed-outputs" => flags.no_embed_outputs = true,
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                eprintln!("Use --help for usage information");
                std::process::exit(1);
            }
            _ => flags.paths.push(PathBuf::from(&args[i])),
        }
        i += 1;
    }

    if flags.paths.is_empty() && !flags.write_config {
        eprintln!("Error: no input given");
        eprintln!("Use --help for usage information");
        std::process::exit(1);
    }

    flags
}

/// Value following the option at `i`, or exit with an error
fn value_of<'a>(args: &'a [String], i: usize, option: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires an argument", option);
            std::process::exit(1);
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, option: &str) -> T {
    match value.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Error: {} expects a number, got {:?}", option, value);
            std::process::exit(1);
        }
    }
}

/// Print help message
fn print_help() {
    println!(
        r#"nbview - Jupyter notebook viewer

USAGE:
    nbview [OPTIONS] PATH...

PATH may be a notebook (.ipynb), a markdown document with notebook embeds
(.md), or a directory searched for notebooks. Each input is exported to an
HTML file next to it.

OPTIONS:
    -h, --help                  Show this help message
    -v, --version               Show version information
    -o, --output FILE           Output file (single input only)
    -c, --config FILE           Use this configuration file
    --edit-cell INDEX           Replace the source of cell INDEX (0-based)
    --source FILE               New cell source for --edit-cell
    --max-depth N               Directory depth searched for notebooks
    --hidden                    Include hidden files and directories
    --no-embed-outputs          Leave outputs out of embedded notebooks
    --max-output-height PX      Height limit of output regions
    --write-config              Save the effective configuration and exit

EXAMPLES:
    nbview analysis.ipynb                   Export to analysis.html
    nbview -o out.html analysis.ipynb       Export to out.html
    nbview ~/notebooks                      Export every notebook below a directory
    nbview report.md                        Render report.md with its embeds
    nbview --edit-cell 2 --source fix.py analysis.ipynb
"#
    );
}

/// Print version information
fn print_version() {
    println!("{} {}", APP_NAME, env!("CARGO_PKG_VERSION"));
}
