use std::fmt;

// ---------------------------------------------------------------------------
// SeriesError – invalid series construction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("series '{name}': index has {index} entries but values has {values}")]
    LengthMismatch {
        name: String,
        index: usize,
        values: usize,
    },
    #[error("series '{name}': duplicate index entry {at}")]
    DuplicateIndex { name: String, at: i64 },
}

// ---------------------------------------------------------------------------
// Series – one time series loaded from one file
// ---------------------------------------------------------------------------

/// A named, ordered numeric sequence. Immutable once built.
///
/// `index` is strictly increasing; `values[i]` is the observation at
/// `index[i]`. Missing observations are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    index: Vec<i64>,
    values: Vec<f64>,
}

impl Series {
    /// Build a series, sorting rows by index.
    pub fn new(
        name: impl Into<String>,
        index: Vec<i64>,
        values: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        let name = name.into();
        if index.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                name,
                index: index.len(),
                values: values.len(),
            });
        }

        let (index, values) = if index.windows(2).all(|w| w[0] < w[1]) {
            (index, values)
        } else {
            let mut rows: Vec<(i64, f64)> = index.into_iter().zip(values).collect();
            rows.sort_by_key(|&(t, _)| t);
            if let Some(w) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
                return Err(SeriesError::DuplicateIndex { name, at: w[0].0 });
            }
            rows.into_iter().unzip()
        };

        Ok(Series {
            name,
            index,
            values,
        })
    }

    /// A series indexed by position `0..n`.
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Self {
        let index = (0..values.len() as i64).collect();
        Series {
            name: name.into(),
            index,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of rows, including `NaN` observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(index, value)` rows in index order.
    pub fn points(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.index.first(), self.index.last()) {
            (Some(first), Some(last)) => {
                write!(f, "{} ({} rows, {first}..={last})", self.name, self.len())
            }
            _ => write!(f, "{} (empty)", self.name),
        }
    }
}
