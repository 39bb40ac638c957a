use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::analysis::TaskKey;
use crate::executor::Executor;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – ranked pairs
// ---------------------------------------------------------------------------

/// Render the ranked pair list; clicking a row plots that pair.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Pairs");
    ui.separator();

    let Some(run) = &state.run else {
        ui.label("No data loaded.");
        return;
    };

    ui.label(format!(
        "{} series, {} pairs",
        run.series.len(),
        run.results.len()
    ));
    ui.separator();

    let mut clicked: Option<TaskKey> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (rank, (key, r)) in state.ranking.iter().enumerate() {
                let is_selected = state.selected.as_ref() == Some(key);
                let text = RichText::new(format!("{:>3}. {key}  {r:.4}", rank + 1)).monospace();
                if ui.selectable_label(is_selected, text).clicked() {
                    clicked = Some(key.clone());
                }
            }
        });

    if let Some(key) = clicked {
        state.select_pair(&key);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, executor: &Executor) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open folder…").clicked() {
                open_folder_dialog(state, executor);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(run) = &state.run {
            ui.label(format!(
                "{}  ({:.2?}, {} workers)",
                run.data_dir.display(),
                run.elapsed,
                executor.max_workers()
            ));
        }

        ui.separator();

        if ui
            .selectable_label(state.minmax_scaling, "Min-Max Scaling")
            .clicked()
        {
            state.minmax_scaling = !state.minmax_scaling;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState, executor: &Executor) {
    let folder = rfd::FileDialog::new()
        .set_title("Open a folder of time series")
        .set_directory(&state.settings.data_dir)
        .pick_folder();

    if let Some(dir) = folder {
        state.reload(&dir, executor);
    }
}
