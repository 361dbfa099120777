//! bindvar - run a parameterized predicate over generated rows

use anyhow::{bail, Context, Result};
use bindvar::access::{DataType, Value};
use bindvar::bind::BindKey;
use bindvar::executor::{ColumnInfo, ExecutorConfig, Row};
use bindvar::session::Session;
use clap::Parser as ClapParser;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

const STATEMENT: &str = "cli";
const CITIES: [&str; 6] = ["oslo", "rome", "lima", "kyiv", "pune", "nuuk"];

/// Evaluate a predicate with bind variables over a table of random rows.
///
/// Columns: id BIGINT, city VARCHAR, score DOUBLE, created TIMESTAMP.
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Predicate to evaluate, e.g. "score > $1 AND city = :city"
    #[arg(short, long)]
    sql: String,

    /// Bind a text value: `1=42` binds $1, `city=oslo` binds :city, `1=` binds NULL
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Number of rows to generate
    #[arg(short, long, default_value = "100000")]
    rows: usize,

    /// Worker threads (defaults to available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Rows per worker chunk
    #[arg(long, default_value_t = ExecutorConfig::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Seed for row generation
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Number of matching rows to print
    #[arg(long, default_value = "10")]
    show: usize,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn executor_config(&self) -> ExecutorConfig {
        let workers = self
            .workers
            .unwrap_or_else(|| ExecutorConfig::default().workers());
        ExecutorConfig::new(workers, self.chunk_size)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let schema = schema();
    let mut session = Session::new(args.executor_config())?;
    session.prepare(STATEMENT, &args.sql, schema.clone())?;

    for param in &args.params {
        let (key, text) = parse_param(param)?;
        let text = if text.is_empty() { None } else { Some(text) };
        session
            .bind_text(STATEMENT, &key, text)
            .with_context(|| format!("Failed to bind {}", key))?;
    }

    let rows = generate_rows(args.rows, args.seed);
    info!("Generated {} rows", rows.len());

    let started = Instant::now();
    let selected = session.execute(STATEMENT, &rows)?;
    info!(
        "{} of {} rows matched in {:?}",
        selected.len(),
        rows.len(),
        started.elapsed()
    );

    let header: Vec<&str> = schema.iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join(" | "));
    for index in selected.iter().take(args.show) {
        let cells: Vec<String> = rows[*index].iter().map(Value::to_string).collect();
        println!("{}", cells.join(" | "));
    }
    println!("({} rows)", selected.len());
    Ok(())
}

fn schema() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo::new("id", DataType::Int64),
        ColumnInfo::new("city", DataType::Varchar),
        ColumnInfo::new("score", DataType::Float64),
        ColumnInfo::new("created", DataType::Timestamp),
    ]
}

/// Split `KEY=VALUE`; a numeric key addresses a positional slot
fn parse_param(param: &str) -> Result<(BindKey, &str)> {
    let Some((key, value)) = param.split_once('=') else {
        bail!("Expected KEY=VALUE, got '{}'", param);
    };
    let key = key.trim().trim_start_matches(['$', ':']);
    if key.is_empty() {
        bail!("Missing parameter name in '{}'", param);
    }
    let key = match key.parse::<usize>() {
        Ok(index) => BindKey::index(index),
        Err(_) => BindKey::name(key),
    };
    Ok((key, value))
}

fn generate_rows(count: usize, seed: u64) -> Vec<Row> {
    // 2024-01-01T00:00:00Z
    const BASE_MICROS: i64 = 1_704_067_200_000_000;
    const YEAR_MICROS: i64 = 365 * 86_400 * 1_000_000;

    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let city = CITIES[rng.gen_range(0..CITIES.len())];
            let score = if rng.gen_bool(0.05) {
                Value::Null
            } else {
                Value::Float64((rng.gen_range(0.0..100.0f64) * 100.0).round() / 100.0)
            };
            vec![
                Value::Int64(i as i64),
                Value::String(city.to_string()),
                score,
                Value::Timestamp(BASE_MICROS + rng.gen_range(0..YEAR_MICROS)),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() -> Result<()> {
        assert_eq!(parse_param("1=42")?, (BindKey::index(1), "42"));
        assert_eq!(parse_param("$2=x=y")?, (BindKey::index(2), "x=y"));
        assert_eq!(parse_param(":city=oslo")?, (BindKey::name("city"), "oslo"));
        assert_eq!(parse_param("city=")?, (BindKey::name("city"), ""));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=1").is_err());
        Ok(())
    }

    #[test]
    fn test_generate_rows_is_deterministic() {
        let a = generate_rows(50, 7);
        let b = generate_rows(50, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        assert!(a.iter().all(|row| row.len() == schema().len()));
    }
}
