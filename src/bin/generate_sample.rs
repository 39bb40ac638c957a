use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

const TICKERS: &[&str] = &[
    "AAPL", "AMZN", "GOOG", "IBM", "MSFT", "NFLX", "ORCL", "TSLA", "INTC", "CSCO",
];

/// First minute of the generated data (2024-01-02 09:30 UTC).
const START_EPOCH: i64 = 1_704_187_800;

/// Write a directory of synthetic minute-price series as parquet files.
#[derive(Debug, Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output directory (created if missing)
    #[arg(default_value = "data")]
    out_dir: PathBuf,

    /// Number of series
    #[arg(long, default_value_t = 8)]
    count: usize,

    /// Minutes per series
    #[arg(long, default_value_t = 2000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn ticker(i: usize) -> String {
    TICKERS
        .get(i)
        .map(|t| t.to_string())
        .unwrap_or_else(|| format!("S{i:02}"))
}

/// Log-returns: a weak market factor for everyone, plus a strong shared
/// factor for the first two series so they form the best pair.
fn generate_returns(count: usize, rows: usize, rng: &mut SimpleRng) -> Vec<Vec<f64>> {
    let market: Vec<f64> = (0..rows).map(|_| rng.gauss(0.0, 0.001)).collect();
    let twin: Vec<f64> = (0..rows).map(|_| rng.gauss(0.0, 0.002)).collect();

    (0..count)
        .map(|i| {
            let beta = 0.5 + rng.next_f64();
            (0..rows)
                .map(|t| {
                    let shared = if i < 2 { twin[t] } else { 0.0 };
                    beta * market[t] + shared + rng.gauss(0.0, 0.0015)
                })
                .collect()
        })
        .collect()
}

fn write_series(path: &std::path::Path, timestamps: Vec<i64>, prices: Vec<Option<f64>>) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("timestamp", DataType::Int64, false),
        Field::new("value", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(timestamps)),
            Arc::new(Float64Array::from(prices)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut rng = SimpleRng::new(args.seed);
    let returns = generate_returns(args.count, args.rows, &mut rng);

    for (i, series_returns) in returns.iter().enumerate() {
        let mut price = 50.0 + 150.0 * rng.next_f64();
        let mut timestamps = Vec::with_capacity(args.rows);
        let mut prices = Vec::with_capacity(args.rows);

        for (t, r) in series_returns.iter().enumerate() {
            price *= r.exp();
            // ~2% of minutes have no trade at all, ~0.5% a missing quote.
            let roll = rng.next_f64();
            if roll < 0.02 {
                continue;
            }
            timestamps.push(START_EPOCH + 60 * t as i64);
            prices.push((roll >= 0.025).then_some(price));
        }

        let path = args.out_dir.join(format!("{}.parquet", ticker(i)));
        write_series(&path, timestamps, prices)?;
        log::info!("wrote {}", path.display());
    }

    println!(
        "Wrote {} series ({} minutes each) to {}",
        args.count,
        args.rows,
        args.out_dir.display()
    );
    Ok(())
}
