use std::fmt::Write as _;

use crate::analysis::pipeline::CorrelationRun;

/// Console summary of a run: counts, timing, the best pair and an optional
/// ranking of the top `top` pairs.
pub fn render(run: &CorrelationRun, top: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Loaded {} series from {}, {} pairs correlated in {:.2?}",
        run.series.len(),
        run.data_dir.display(),
        run.results.len(),
        run.elapsed
    );

    match run.best() {
        Some((key, r)) => {
            let _ = writeln!(
                out,
                "Best correlated pair: {} and {} (r = {r:.4})",
                key.a(),
                key.b()
            );
        }
        None => {
            let _ = writeln!(out, "No pair has a defined correlation");
        }
    }

    let ranking = run.ranked(top);
    if !ranking.is_empty() {
        let width = ranking
            .iter()
            .map(|(k, _)| k.to_string().len())
            .max()
            .unwrap_or(0);
        let _ = writeln!(out, "Top {} pairs:", ranking.len());
        for (i, (key, r)) in ranking.iter().enumerate() {
            let _ = writeln!(out, "{:>4}. {:<width$}  {r:>7.4}", i + 1, key.to_string());
        }
    }

    out
}

pub fn print(run: &CorrelationRun, top: usize) {
    print!("{}", render(run, top));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::analysis::{ResultMap, TaskKey};
    use crate::data::model::Series;

    fn fake_run(results: &[(&str, &str, f64)]) -> CorrelationRun {
        let mut series = BTreeMap::new();
        let mut map = ResultMap::new();
        for &(a, b, r) in results {
            for name in [a, b] {
                series
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(Series::from_values(name, vec![1.0, 2.0])));
            }
            map.insert(TaskKey::new(a, b).unwrap(), r);
        }
        CorrelationRun {
            data_dir: PathBuf::from("stocks"),
            series,
            results: map,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn names_the_best_pair() {
        let run = fake_run(&[("ibm", "msft", 0.81234), ("msft", "ibm", 0.81234), ("ibm", "ge", 0.2)]);
        let text = render(&run, 0);
        assert!(text.contains("Loaded 3 series from stocks, 3 pairs"));
        assert!(text.contains("Best correlated pair: ibm and msft (r = 0.8123)"));
        assert!(!text.contains("Top"));
    }

    #[test]
    fn ranking_lists_requested_rows() {
        let run = fake_run(&[("a", "b", 0.5), ("a", "c", 0.9), ("b", "c", 0.1)]);
        let text = render(&run, 2);
        assert!(text.contains("Top 2 pairs:"));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[lines.len() - 2].contains("1. a ~ c"));
        assert!(lines[lines.len() - 1].contains("2. a ~ b"));
    }

    #[test]
    fn all_undefined() {
        let run = fake_run(&[("a", "b", f64::NAN)]);
        let text = render(&run, 5);
        assert!(text.contains("No pair has a defined correlation"));
        assert!(!text.contains("Top"));
    }
}
