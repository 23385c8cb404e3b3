use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use cmc_bayes::data::discretize::discretize_data;
use cmc_bayes::data::loader::load_data;
use cmc_bayes::data::split::split_data;
use cmc_bayes::experiment::{
    run_baseline_experiment_with_report, run_experiment_with_report, ExperimentReport,
};
use cmc_bayes::network::{HillClimbSearch, Network};
use cmc_bayes::{viz, ExperimentConfig, Split};

#[derive(Parser, Debug)]
#[command(name = "cmc-bayes")]
#[command(about = "Compare Bayesian network classifiers with baselines on CMC data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the baselines and the Bayesian network, print their metrics
    Run(RunArgs),
    /// Open the network viewer
    View {
        /// Network topology (JSON); omit to pick one from the File menu
        #[arg(short, long)]
        network: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Experiment config (JSON); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    data_file: Option<String>,

    /// Column to predict (class or n_children)
    #[arg(short, long)]
    target: Option<String>,

    /// Network topology (JSON)
    #[arg(short, long, conflicts_with = "learn")]
    network: Option<PathBuf>,

    /// Learn the structure by hill climbing with this score (BicScore, K2Score, BDeuScore)
    #[arg(long)]
    learn: Option<String>,

    /// Parameter estimator (MaximumLikelihoodEstimator, BayesianEstimator)
    #[arg(short, long)]
    estimator: Option<String>,

    /// Keep continuous columns as they are
    #[arg(long)]
    no_discretize: bool,

    /// Print the per-class classification report of every model
    #[arg(long)]
    report: bool,
}

impl RunArgs {
    fn into_config(self) -> Result<(ExperimentConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(file) = self.data_file {
            config.data_file = file;
        }
        if let Some(target) = self.target {
            config.target = target;
        }
        if let Some(network) = self.network {
            config.network = Some(network);
            config.learn = None;
        }
        if let Some(score) = self.learn {
            config.learn = Some(score);
            config.network = None;
        }
        if let Some(estimator) = self.estimator {
            config.estimator = estimator;
        }
        if self.no_discretize {
            config.discretize = false;
        }
        config.validate().context("invalid experiment config")?;
        Ok((config, self.report))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Run(args) => {
            let (config, show_report) = args.into_config()?;
            run(&config, show_report)
        }
        Command::View { network } => match network {
            Some(path) => {
                let network = Network::from_file(&path)
                    .with_context(|| format!("reading network {}", path.display()))?;
                viz::plot_network(&network)
            }
            None => viz::open_viewer(),
        },
    }
}

fn run(config: &ExperimentConfig, show_report: bool) -> Result<()> {
    let table = load_data(&config.data_dir, &config.data_file).with_context(|| {
        format!(
            "loading {}",
            config.data_dir.join(&config.data_file).display()
        )
    })?;

    let mut data = split_data(&table, &config.target, &config.split)
        .with_context(|| format!("splitting on '{}'", config.target))?;
    if config.discretize {
        data = discretize_data(
            &data,
            &config.continuous_columns,
            config.n_bins,
            &config.target,
        )
        .context("discretizing")?;
    }

    let mut reports = Vec::new();
    for kind in config.baseline_kinds()? {
        let report = run_baseline_experiment_with_report(&data, kind.label())
            .with_context(|| format!("running {kind}"))?;
        reports.push(report);
    }

    let network = resolve_network(config, &data)?;
    let report = run_experiment_with_report(&data, &network, config.estimator()?, &config.target)
        .context("running the Bayesian network")?;
    reports.push(report);

    print_summary(&reports);
    if show_report {
        for report in &reports {
            println!("\n{}\n{}", report.model, report.report);
        }
    }
    Ok(())
}

/// Declared topology, a learned one, or a naive Bayes star around the target.
fn resolve_network(config: &ExperimentConfig, data: &Split) -> Result<Network> {
    if let Some(path) = &config.network {
        return Network::from_file(path)
            .with_context(|| format!("reading network {}", path.display()));
    }
    if let Some(score) = config.score()? {
        let train_ds = data.train.to_table()?;
        let mut search = HillClimbSearch::new(&train_ds)?;
        if let Some(k) = config.max_indegree {
            search = search.with_max_indegree(k);
        }
        return search.estimate(score).context("learning the structure");
    }
    let features = data.train.features.columns();
    Ok(Network::naive_bayes(&config.target, features)?)
}

fn print_summary(reports: &[ExperimentReport]) {
    let rule = "-".repeat(78);
    if let Some(first) = reports.first() {
        println!(
            "\n{} train rows, {} test rows",
            first.n_train, first.n_test
        );
    }
    println!("{rule}");
    println!(
        "{:<38} {:>9} {:>9} {:>9} {:>9}",
        "Model", "Accuracy", "Precision", "Recall", "F1"
    );
    println!("{rule}");
    for r in reports {
        println!(
            "{:<38} {:>9.3} {:>9.3} {:>9.3} {:>9.3}",
            r.model, r.metrics.accuracy, r.metrics.precision, r.metrics.recall, r.metrics.f1
        );
    }
    println!("{rule}");
}
