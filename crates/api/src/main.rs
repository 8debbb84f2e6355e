mod config;
mod metrics;
mod service;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use config::AppConfig;
use service::{EvidenceTarget, GraphQuery, GraphService};
use store::DatasetStore;

const USAGE: &str = "usage: api <record.json | data-dir> \
    [--dataset NAME] [--from YYYY-MM-DD] [--to YYYY-MM-DD] \
    [--node ID | --edge A B] [--co-mentions] [--stats]";

struct CliArgs {
    path: PathBuf,
    dataset: Option<String>,
    date_start: Option<String>,
    date_end: Option<String>,
    target: Option<EvidenceTarget>,
    co_mentions: bool,
    stats: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("{}", USAGE);
    };
    let mut cli = CliArgs {
        path: PathBuf::from(path),
        dataset: None,
        date_start: None,
        date_end: None,
        target: None,
        co_mentions: false,
        stats: false,
    };
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--dataset" => cli.dataset = Some(args.next().context("--dataset needs a value")?),
            "--from" => cli.date_start = Some(args.next().context("--from needs a date")?),
            "--to" => cli.date_end = Some(args.next().context("--to needs a date")?),
            "--node" => {
                let id = args.next().context("--node needs an id")?;
                cli.target = Some(EvidenceTarget::Node(id));
            }
            "--edge" => {
                let a = args.next().context("--edge needs two ids")?;
                let b = args.next().context("--edge needs two ids")?;
                cli.target = Some(EvidenceTarget::Edge(a, b));
            }
            "--co-mentions" => cli.co_mentions = true,
            "--stats" => cli.stats = true,
            other => bail!("unknown flag '{}'\n{}", other, USAGE),
        }
    }
    Ok(cli)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = parse_args()?;

    // A directory argument becomes the configured data_dir; a plain file
    // loads into an in-memory store under its stem name.
    let config = AppConfig {
        data_dir: cli.path.is_dir().then(|| cli.path.clone()),
        include_page_co_mentions: cli.co_mentions,
        ..AppConfig::default()
    };

    let store = match &config.data_dir {
        Some(dir) => Arc::new(DatasetStore::open(dir)?),
        None => {
            let json = std::fs::read_to_string(&cli.path)
                .with_context(|| format!("failed to read {}", cli.path.display()))?;
            let name = cli
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("dataset")
                .to_string();
            let store = Arc::new(DatasetStore::new());
            store.insert_json(&name, &json)?;
            store
        }
    };

    let dataset = match cli.dataset {
        Some(name) => name,
        None => {
            let datasets = store.list();
            match datasets.as_slice() {
                [only] => only.clone(),
                [] => bail!("no datasets found under {}", cli.path.display()),
                many => bail!(
                    "multiple datasets available ({}); pick one with --dataset",
                    many.join(", ")
                ),
            }
        }
    };

    let service = GraphService::new(store, config);

    let query = GraphQuery {
        dataset,
        date_start: cli.date_start,
        date_end: cli.date_end,
    };

    if let Some(target) = &cli.target {
        let bundle = service.evidence(&query, target)?;
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        let positioned = service.graph(&query)?;
        println!("{}", serde_json::to_string_pretty(&positioned)?);
    }

    if cli.stats {
        eprintln!("{}", serde_json::to_string_pretty(&service.stats())?);
    }

    Ok(())
}
