use std::cmp::Ordering;

use crate::data::model::Series;

/// Rows present in both series, matched on index, with no `NaN` on either side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aligned {
    pub index: Vec<i64>,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl Aligned {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Inner join of `a` and `b` on their (sorted) indices.
pub fn align(a: &Series, b: &Series) -> Aligned {
    let (ia, va) = (a.index(), a.values());
    let (ib, vb) = (b.index(), b.values());
    let mut out = Aligned::default();

    let (mut i, mut j) = (0, 0);
    while i < ia.len() && j < ib.len() {
        match ia[i].cmp(&ib[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                if !va[i].is_nan() && !vb[j].is_nan() {
                    out.index.push(ia[i]);
                    out.a.push(va[i]);
                    out.b.push(vb[j]);
                }
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Pearson correlation of two equally long samples.
///
/// `NaN` when there are fewer than two samples or either side is constant.
pub fn pearson_slices(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (x, y) = (&x[..n], &y[..n]);

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let y_mean = y.iter().sum::<f64>() / n as f64;

    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;

    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sum_xy += dx * dy;
        sum_x2 += dx * dx;
        sum_y2 += dy * dy;
    }

    let denom = (sum_x2 * sum_y2).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return f64::NAN;
    }
    (sum_xy / denom).clamp(-1.0, 1.0)
}

/// Pearson correlation of two series over their shared, non-missing rows.
pub fn pearson(a: &Series, b: &Series) -> f64 {
    let aligned = align(a, b);
    pearson_slices(&aligned.a, &aligned.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str, index: Vec<i64>, values: Vec<f64>) -> Series {
        Series::new(name, index, values).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn align_inner_joins_and_drops_nan() {
        let a = s("a", vec![1, 2, 3, 5], vec![1.0, f64::NAN, 3.0, 5.0]);
        let b = s("b", vec![2, 3, 4, 5], vec![20.0, 30.0, 40.0, f64::NAN]);
        let aligned = align(&a, &b);
        assert_eq!(aligned.index, vec![3]);
        assert_eq!(aligned.a, vec![3.0]);
        assert_eq!(aligned.b, vec![30.0]);
    }

    #[test]
    fn perfect_positive_and_negative() {
        let a = Series::from_values("a", vec![1.0, 2.0, 3.0, 4.0]);
        let up = Series::from_values("up", vec![10.0, 20.0, 30.0, 40.0]);
        let down = Series::from_values("down", vec![4.0, 3.0, 2.0, 1.0]);
        assert!(close(pearson(&a, &up), 1.0));
        assert!(close(pearson(&a, &down), -1.0));
    }

    #[test]
    fn known_value() {
        // sum_xy = 6, sum_x2 = 10, sum_y2 = 6 → r = 6 / sqrt(60)
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let r = pearson_slices(&x, &y);
        assert!((r - 0.7745966692414834).abs() < 1e-12, "r = {r}");
    }

    #[test]
    fn symmetric() {
        let a = Series::from_values("a", vec![1.0, 5.0, 2.0, 8.0, 3.0]);
        let b = Series::from_values("b", vec![2.0, 3.0, 1.0, 9.0, 4.0]);
        assert!(close(pearson(&a, &b), pearson(&b, &a)));
    }

    #[test]
    fn too_few_rows_is_nan() {
        let a = s("a", vec![1, 2], vec![1.0, 2.0]);
        let b = s("b", vec![2, 3], vec![5.0, 6.0]);
        assert!(pearson(&a, &b).is_nan());
        assert!(pearson_slices(&[], &[]).is_nan());
    }

    #[test]
    fn constant_side_is_nan() {
        let a = Series::from_values("a", vec![3.0, 3.0, 3.0]);
        let b = Series::from_values("b", vec![1.0, 2.0, 3.0]);
        assert!(pearson(&a, &b).is_nan());
    }

    #[test]
    fn disjoint_indices_is_nan() {
        let a = s("a", vec![1, 2, 3], vec![1.0, 2.0, 3.0]);
        let b = s("b", vec![10, 20, 30], vec![1.0, 2.0, 3.0]);
        assert!(align(&a, &b).is_empty());
        assert!(pearson(&a, &b).is_nan());
    }
}
