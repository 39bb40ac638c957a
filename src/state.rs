use std::path::Path;

use crate::analysis::TaskKey;
use crate::analysis::pipeline::{self, CorrelationRun};
use crate::color::SeriesColors;
use crate::config::Settings;
use crate::data::model::Series;
use crate::executor::Executor;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Latest completed run (None until a directory has been analysed).
    pub run: Option<CorrelationRun>,

    /// Pairs ordered by coefficient, highest first (cached from `run`).
    pub ranking: Vec<(TaskKey, f64)>,

    /// Pair currently plotted.
    pub selected: Option<TaskKey>,

    /// Per-series plot colours.
    pub colors: SeriesColors,

    /// Plot both series scaled to [0, 1].
    pub minmax_scaling: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            minmax_scaling: settings.normalize,
            settings,
            run: None,
            ranking: Vec::new(),
            selected: None,
            colors: SeriesColors::default(),
            status_message: None,
        }
    }

    /// Ingest a finished run and select its best pair.
    pub fn set_run(&mut self, run: CorrelationRun) {
        self.ranking = run
            .ranked(run.results.len())
            .into_iter()
            .map(|(k, r)| (k.clone(), r))
            .collect();
        self.selected = run.best().map(|(k, _)| k.clone());
        self.colors = SeriesColors::new(run.series.keys().map(String::as_str));
        self.status_message = if self.selected.is_none() {
            Some("No pair has a defined correlation".to_string())
        } else {
            None
        };
        self.run = Some(run);
    }

    /// Analyse another directory; on failure the previous run stays on screen.
    pub fn reload(&mut self, dir: &Path, executor: &Executor) {
        match pipeline::run_dir(dir, &self.settings, executor) {
            Ok(run) => {
                log::info!(
                    "Analysed {} series in {}",
                    run.series.len(),
                    dir.display()
                );
                self.settings.data_dir = dir.to_path_buf();
                self.set_run(run);
            }
            Err(e) => {
                log::error!("Failed to analyse {}: {e:#}", dir.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Plot another pair. Unknown keys are ignored.
    pub fn select_pair(&mut self, key: &TaskKey) {
        let known = self
            .run
            .as_ref()
            .is_some_and(|run| run.results.contains_key(key));
        if known {
            self.selected = Some(key.clone());
        }
    }

    /// The two series of the selected pair.
    pub fn selected_pair(&self) -> Option<(&Series, &Series)> {
        let run = self.run.as_ref()?;
        run.pair(self.selected.as_ref()?)
    }

    /// Coefficient of the selected pair.
    pub fn selected_coefficient(&self) -> Option<f64> {
        let run = self.run.as_ref()?;
        run.results.get(self.selected.as_ref()?).copied()
    }
}
