//! Trellis CLI
//!
//! Lays out a JSON scene and prints where every widget ended up.

mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use serde::Serialize;
use trellis_layout::{Orientation, Rect, TextDirection, WidgetId, WidgetTree};
use tracing_subscriber::EnvFilter;

/// Trellis - run the container layout engine over a scene file
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Lay out at the scene's natural size
    trellis demos/toolbar.json

    # Force a width; the height follows from height-for-width
    trellis demos/toolbar.json --width 320

    # Right-to-left, as JSON
    trellis demos/toolbar.json --rtl --json

LOGGING:
    RUST_LOG=trellis=debug trellis demos/toolbar.json
"#)]
struct Cli {
    /// Scene description (JSON)
    #[arg(value_name = "SCENE")]
    scene: PathBuf,

    /// Allocated width (default: natural width)
    #[arg(long)]
    width: Option<i32>,

    /// Allocated height (default: natural height for the width)
    #[arg(long)]
    height: Option<i32>,

    /// Print the allocation tree as JSON
    #[arg(long)]
    json: bool,

    /// Lay out right-to-left
    #[arg(long)]
    rtl: bool,
}

/// One widget's allocation, for JSON output.
#[derive(Debug, Serialize)]
struct AllocationNode {
    name: String,
    #[serde(rename = "type")]
    widget_type: String,
    visible: bool,
    allocation: Rect,
    baseline: Option<i32>,
    children: Vec<AllocationNode>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let text = std::fs::read_to_string(&cli.scene)
        .with_context(|| format!("failed to read {}", cli.scene.display()))?;
    let (mut tree, root) = scene::load(&text)?;
    if cli.rtl {
        tree.set_direction(root, TextDirection::Rtl)?;
    }

    let area = layout_area(&tree, root, cli.width, cli.height)?;
    let _ = tree.allocate(root, area, None)?;

    if cli.json {
        let dump = collect(&tree, root)?;
        println!("{}", serde_json::to_string_pretty(&dump)?);
    } else {
        println!(
            "{}",
            format!("=== Allocation ({}x{}) ===", area.width, area.height).bold()
        );
        print_allocation(&tree, root, 0)?;
    }
    Ok(())
}

/// The root rectangle: requested sizes where given, natural sizes
/// otherwise, never below the minimum.
fn layout_area(tree: &WidgetTree, root: WidgetId, width: Option<i32>, height: Option<i32>) -> Result<Rect> {
    let (widths, _) = tree.preferred_size(root)?;
    let width = width.map_or(widths.natural, |width| width.max(widths.minimum));
    let heights = tree.measure(root, Orientation::Vertical, Some(width))?;
    let height = height.map_or(heights.natural, |height| height.max(heights.minimum));
    Ok(Rect::new(0, 0, width, height))
}

fn collect(tree: &WidgetTree, id: WidgetId) -> Result<AllocationNode> {
    let children = tree
        .children(id)?
        .into_iter()
        .map(|child| collect(tree, child))
        .collect::<Result<Vec<_>>>()?;
    Ok(AllocationNode {
        name: tree.name(id),
        widget_type: tree.widget_type(id)?.to_string(),
        visible: tree.is_drawable(id),
        allocation: tree.allocation(id)?,
        baseline: tree.allocated_baseline(id)?,
        children,
    })
}

/// Recursively print a widget with its allocation
fn print_allocation(tree: &WidgetTree, id: WidgetId, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth);
    let rect = tree.allocation(id)?;
    let kind = tree.widget_type(id)?.to_string();
    let geometry = format!("x={} y={} w={} h={}", rect.x, rect.y, rect.width, rect.height);

    if tree.is_drawable(id) {
        match tree.allocated_baseline(id)? {
            Some(baseline) => println!(
                "{indent}{} {} {} {}",
                tree.name(id).bold(),
                kind.cyan(),
                geometry.green(),
                format!("baseline={baseline}").yellow()
            ),
            None => println!("{indent}{} {} {}", tree.name(id).bold(), kind.cyan(), geometry.green()),
        }
    } else {
        println!("{indent}{} {} {}", tree.name(id).dimmed(), kind.dimmed(), "(hidden)".dimmed());
    }

    for child in tree.children(id)? {
        print_allocation(tree, child, depth + 1)?;
    }
    Ok(())
}
