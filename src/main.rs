use anyhow::anyhow;
use clap::Parser;
use eframe::egui;

use rusty_corr::analysis::pipeline;
use rusty_corr::app::RustyCorrApp;
use rusty_corr::config::Cli;
use rusty_corr::executor::Executor;
use rusty_corr::report;
use rusty_corr::state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    let executor = Executor::new(settings.worker_count());

    let mut state = AppState::new(settings.clone());
    match pipeline::run(&settings, &executor) {
        Ok(run) => {
            report::print(&run, settings.top);
            state.set_run(run);
        }
        // Without a window there is nowhere else to show the error.
        Err(e) if !settings.plot => return Err(e),
        Err(e) => {
            log::error!("{e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }

    if !settings.plot {
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Corr – Pairwise Correlation",
        options,
        Box::new(move |_cc| Ok(Box::new(RustyCorrApp::new(state, executor)))),
    )
    .map_err(|e| anyhow!("plot window failed: {e}"))
}
