use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};

use super::correlation::pearson;
use super::reduce::{best_pair, ranked};
use super::{ResultMap, TaskKey};
use crate::config::Settings;
use crate::data::loader::{LoadMode, discover_files, load_series_with, series_name};
use crate::data::model::Series;
use crate::executor::{Executor, Future, as_completed};

// ---------------------------------------------------------------------------
// CorrelationRun – outcome of one pass over a directory
// ---------------------------------------------------------------------------

/// Everything produced by [`run`]: the loaded series and every pair's coefficient.
#[derive(Debug, Clone)]
pub struct CorrelationRun {
    pub data_dir: PathBuf,
    pub series: BTreeMap<String, Arc<Series>>,
    pub results: ResultMap,
    pub elapsed: Duration,
}

impl CorrelationRun {
    pub fn best(&self) -> Option<(&TaskKey, f64)> {
        best_pair(&self.results)
    }

    pub fn ranked(&self, n: usize) -> Vec<(&TaskKey, f64)> {
        ranked(&self.results, n)
    }

    /// Both series of a pair, if they were loaded.
    pub fn pair(&self, key: &TaskKey) -> Option<(&Series, &Series)> {
        let a = self.series.get(key.a())?;
        let b = self.series.get(key.b())?;
        Some((a.as_ref(), b.as_ref()))
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Discover, load, correlate every ordered pair and collect the results.
///
/// Load futures are resolved here, on the calling thread, before any
/// correlation task is submitted: no worker ever waits on another task.
pub fn run(settings: &Settings, executor: &Executor) -> Result<CorrelationRun> {
    let started = Instant::now();

    let files = discover_files(&settings.data_dir, &settings.extensions)?;
    if files.len() < 2 {
        bail!(
            "need at least two series in {}, found {}",
            settings.data_dir.display(),
            files.len()
        );
    }
    log::info!(
        "found {} files in {} ({} workers)",
        files.len(),
        settings.data_dir.display(),
        executor.max_workers()
    );

    let series = load_all(&files, settings.load_mode, executor)?;
    let results = correlate_all(&series, executor)?;

    let elapsed = started.elapsed();
    log::info!(
        "computed {} correlations over {} series in {:.2?}",
        results.len(),
        series.len(),
        elapsed
    );

    Ok(CorrelationRun {
        data_dir: settings.data_dir.clone(),
        series,
        results,
        elapsed,
    })
}

/// Submit one load task per file and gather the series by name.
pub fn load_all(
    files: &[PathBuf],
    mode: LoadMode,
    executor: &Executor,
) -> Result<BTreeMap<String, Arc<Series>>> {
    check_unique_names(files)?;

    let futures: Vec<(PathBuf, Future<Arc<Series>>)> = files
        .iter()
        .map(|path| {
            let task_path = path.clone();
            let fut = executor.try_submit(move || Ok(Arc::new(load_series_with(&task_path, mode)?)));
            (path.clone(), fut)
        })
        .collect();

    let total = futures.len();
    let mut series = BTreeMap::new();
    for (done, (path, outcome)) in as_completed(futures).enumerate() {
        // The load error already names the file.
        let loaded = outcome?;
        log::debug!("[{}/{total}] {} -> {loaded}", done + 1, path.display());
        series.insert(loaded.name().to_string(), loaded);
    }
    Ok(series)
}

fn check_unique_names(files: &[PathBuf]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for path in files {
        let name = series_name(path)?;
        if !seen.insert(name.clone()) {
            bail!("duplicate series name '{name}' ({})", path.display());
        }
    }
    Ok(())
}

/// Submit one correlation task per ordered pair `(a, b)`, `a != b`, then
/// block on each future in turn.
pub fn correlate_all(
    series: &BTreeMap<String, Arc<Series>>,
    executor: &Executor,
) -> Result<ResultMap> {
    let mut futures: Vec<(TaskKey, Future<f64>)> = Vec::new();
    for (a_name, a) in series {
        for (b_name, b) in series {
            let Some(key) = TaskKey::new(a_name.as_str(), b_name.as_str()) else {
                continue;
            };
            let (a, b) = (a.clone(), b.clone());
            futures.push((key, executor.submit(move || pearson(&a, &b))));
        }
    }
    log::info!("submitted {} correlation tasks", futures.len());
    log::debug!(
        "{} queued, {} running",
        executor.queued_count(),
        executor.active_count()
    );

    let mut results = ResultMap::new();
    for (key, fut) in futures {
        let r = fut.result().with_context(|| format!("correlating {key}"))?;
        if let Some(warning) = undefined_warning(&key, r) {
            log::warn!("{warning}");
        }
        results.insert(key, r);
    }
    Ok(results)
}

fn undefined_warning(key: &TaskKey, r: f64) -> Option<String> {
    r.is_nan()
        .then(|| format!("{key}: coefficient undefined (too few aligned rows or constant series)"))
}

/// Convenience for callers holding only a directory.
pub fn run_dir(dir: &Path, settings: &Settings, executor: &Executor) -> Result<CorrelationRun> {
    let settings = Settings {
        data_dir: dir.to_path_buf(),
        ..settings.clone()
    };
    run(&settings, executor)
}
