//! Quire CLI
//!
//! Loads a markup file and its stylesheets, then prints what the engine
//! made of them or renders a screenshot.
//!
//! - quire page.qml --style page.qss            # Tree and stylesheet summary
//! - quire page.qml --style page.qss --styles   # Resolved declarations per element
//! - quire page.qml --style page.qss --json     # Everything as JSON
//! - quire -S out.png page.qml --style page.qss # Screenshot

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use serde::Serialize;

use quire_common::warning::warning_count;
use quire_css::{DEFAULT_FONT_SIZE, FontDescriptor, Size, StyleDump};
use quire_markup::{TreeDump, print_tree};
use quire_render::{
    DisplayCommand, LoadedDocument, RasterBackend, RecordingBackend, RenderOptions, RenderSummary,
    load_document,
};

/// Quire: indentation-aware markup styled by class stylesheets
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the element tree and a stylesheet summary
    quire page.qml --style page.qss

    # Print the resolved declarations of every element
    quire page.qml --style base.qss --style page.qss --styles

    # Dump tree, styles and display list as JSON
    quire page.qml --style page.qss --json

    # Take a screenshot
    quire -S out.png --width 1024 --height 768 page.qml --style page.qss
"#)]
struct Cli {
    /// Markup file to load
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Stylesheet to apply; repeat to merge several in order
    #[arg(short = 's', long = "style", value_name = "FILE")]
    style: Vec<PathBuf>,

    /// Print only the element tree
    #[arg(long)]
    tree: bool,

    /// Print the resolved declarations of every element
    #[arg(long)]
    styles: bool,

    /// Print tree, styles and display list as JSON
    #[arg(long)]
    json: bool,

    /// Render to the specified file (PNG format)
    #[arg(short = 'S', long, value_name = "FILE")]
    screenshot: Option<PathBuf>,

    /// Page width in pixels
    #[arg(long, default_value = "800")]
    width: u32,

    /// Page height in pixels
    #[arg(long, default_value = "600")]
    height: u32,

    /// Font size of top-level elements in pixels
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    font_size: f64,

    /// Directory for fetched images
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,
}

impl Cli {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            viewport: Size::new(f64::from(self.width), f64::from(self.height)),
            font: FontDescriptor {
                size: self.font_size,
                ..FontDescriptor::default()
            },
            cache_dir: self.cache_dir.clone(),
        }
    }
}

/// Everything `--json` prints.
#[derive(Serialize)]
struct JsonDump {
    tree: Vec<TreeDump>,
    styles: Vec<StyleDump>,
    display_list: Vec<DisplayCommand>,
    summary: RenderSummary,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let doc = load_document(&cli.path, &cli.style)
        .with_context(|| format!("failed to load '{}'", cli.path.display()))?;
    let options = cli.render_options();

    if let Some(ref output_path) = cli.screenshot {
        take_screenshot(&doc, output_path, &options)?;
        println!("{} {}", "Screenshot saved to:".green(), output_path.display());
        return Ok(());
    }

    if cli.json {
        let mut backend = RecordingBackend::with_options(&options);
        let summary = doc.render(&mut backend, &options)?;
        let dump = JsonDump {
            tree: doc.document.dump(),
            styles: style_dumps(&doc),
            display_list: backend.into_commands(),
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    print_document(&doc, &cli);
    Ok(())
}

/// Render `doc` into a PNG at `output_path`.
fn take_screenshot(doc: &LoadedDocument, output_path: &Path, options: &RenderOptions) -> anyhow::Result<()> {
    let mut backend = RasterBackend::with_options(options);
    let summary = doc.render(&mut backend, options)?;
    backend.save(output_path)?;
    println!(
        "{} elements, {} text lines, {} images",
        summary.elements, summary.text_lines, summary.images
    );
    Ok(())
}

fn style_dumps(doc: &LoadedDocument) -> Vec<StyleDump> {
    doc.styles
        .iter()
        .map(|styled| StyleDump::new(styled, &doc.stylesheet))
        .collect()
}

/// Print document information to stdout.
fn print_document(doc: &LoadedDocument, cli: &Cli) {
    println!("{}", "=== Element Tree ===".bold());
    print_tree(&doc.document);
    if cli.tree {
        return;
    }

    println!("\n{}", "=== Stylesheet ===".bold());
    println!(
        "{} rules from {} files, {} inheritance links",
        doc.stylesheet.len(),
        doc.stylesheet.sources().len(),
        doc.links
    );

    println!("\n{}", "=== Computed Styles ===".bold());
    let matched = doc.styles.iter().filter(|s| !s.rules.is_empty()).count();
    println!("{matched} of {} elements matched by a rule", doc.styles.len());

    if cli.styles {
        for dump in style_dumps(doc) {
            println!(
                "\n<{}> {} {}",
                dump.tag.cyan(),
                format!("line {}", dump.line).dimmed(),
                dump.selectors.join(", ")
            );
            for (key, value) in &dump.declarations {
                println!("  {key}: {value}");
            }
        }
    }

    let warnings = warning_count();
    if warnings > 0 {
        println!("\n{}", format!("{warnings} warnings").yellow());
    }
}
