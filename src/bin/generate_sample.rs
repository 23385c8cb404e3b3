//! Write a synthetic CMC-shaped data file so the harness can run without the
//! survey data.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cmc_bayes::data::loader::write_data;
use cmc_bayes::data::synthetic::generate_cmc_like;

#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
#[command(about = "Write a synthetic CMC-shaped data file")]
struct Args {
    /// Output path
    #[arg(default_value = "../data/cmc.data")]
    out: PathBuf,

    /// Number of rows (the survey has 1473)
    #[arg(short, long, default_value_t = 1473)]
    rows: usize,

    #[arg(short, long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let table = generate_cmc_like(args.rows, args.seed)?;
    if let Some(dir) = args.out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    write_data(&table, &args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;

    log::info!(
        "Wrote {} rows (seed {}) to {}",
        table.n_rows(),
        args.seed,
        args.out.display()
    );
    println!("Wrote {}", args.out.display());
    Ok(())
}
