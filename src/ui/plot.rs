use eframe::egui::Ui;
use egui_plot::{Line, Plot, PlotPoints};

use crate::data::model::Series;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Pair plot (central panel)
// ---------------------------------------------------------------------------

/// Render the selected pair as two lines over their index.
pub fn pair_plot(ui: &mut Ui, state: &AppState) {
    let Some((a, b)) = state.selected_pair() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a folder of time series  (File → Open folder…)");
        });
        return;
    };

    if let (Some(key), Some(r)) = (&state.selected, state.selected_coefficient()) {
        ui.heading(format!("{key}   r = {r:.4}"));
    }

    let y_label = if state.minmax_scaling {
        "Value (min-max scaled)"
    } else {
        "Value"
    };

    Plot::new("pair_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("Index")
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in [a, b] {
                let line = Line::new(series_points(series, state.minmax_scaling))
                    .name(series.name())
                    .color(state.colors.color_for(series.name()))
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}

fn series_points(series: &Series, minmax: bool) -> PlotPoints {
    let ys = if minmax {
        min_max_scale(series.values())
    } else {
        series.values().to_vec()
    };
    series
        .index()
        .iter()
        .zip(ys)
        .filter(|(_, y)| !y.is_nan())
        .map(|(&x, y)| [x as f64, y])
        .collect()
}

/// Scale to [0, 1]; `NaN` stays `NaN`, a constant series maps to 0.
pub fn min_max_scale(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range.abs() < f64::EPSILON {
        return values
            .iter()
            .map(|v| if v.is_nan() { f64::NAN } else { 0.0 })
            .collect();
    }
    values.iter().map(|&v| (v - min) / range).collect()
}
