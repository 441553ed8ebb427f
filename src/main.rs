mod app;
mod filter;
mod panels;
mod util;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Panel catalog (JSON). The built-in catalog is used when omitted.
    #[arg(long)]
    panel_data: Option<PathBuf>,

    /// Validate the catalog, print a summary and exit without opening a window.
    #[arg(long)]
    check: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.check {
        return check_catalog(args.panel_data);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "painel-saude",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::DashboardApp::new(
                cc,
                args.panel_data.clone(),
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to run the dashboard window: {error}"))
}

fn check_catalog(path: Option<PathBuf>) -> anyhow::Result<()> {
    let catalog = panels::load_panel_catalog(path.as_deref())?;

    for definition in &catalog.panels {
        let dimensions = definition
            .dimensions()
            .into_iter()
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<12} {:>3} elements  {:>3} model entries  fallback={:?}  dimensions=[{dimensions}]",
            definition.id,
            definition.elements.len(),
            definition.model.entry_count(),
            definition.model.fallback(),
        );
    }
    println!("{} panels ok", catalog.panels.len());

    Ok(())
}
