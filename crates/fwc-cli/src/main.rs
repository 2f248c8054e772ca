mod output;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, io};

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use fwc_crawler::{crawl_seeds, probe, CrawlerConfig, HttpFetcher, Method};
use tokio::runtime;

/// Forecast publication crawler
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Args {
    #[clap(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[clap(name = "crawl")]
    Crawl(CrawlArgs),
    #[clap(name = "probe")]
    Probe(ProbeArgs),
    #[clap(hide = true)]
    Completion,
}

/// Crawl every seed and write the inventory tables
#[derive(Debug, clap::Args)]
pub struct CrawlArgs {
    /// Path to a csv file with `label,url` columns
    #[clap(parse(from_os_str), long, short)]
    pub seeds: PathBuf,
    /// Directory receiving the per seed tables and summary.csv
    #[clap(parse(from_os_str), long, short)]
    pub output_dir: PathBuf,
    /// Only crawl the seed with this label
    #[clap(long)]
    pub label: Option<String>,
    /// Optional default crawler yaml configuration file
    #[clap(env = "FWC_CRAWLER_CONFIG", parse(from_os_str), long)]
    pub crawler_config: Option<PathBuf>,
    /// Override crawler's user agent
    #[clap(long)]
    pub user_agent: Option<String>,
    /// Override crawler's maximum number of pages per seed
    #[clap(long)]
    pub max_pages: Option<usize>,
    /// Override crawler's maximum link depth
    #[clap(long)]
    pub max_depth: Option<usize>,
    /// Override crawler's number of seeds crawled concurrently
    #[clap(long)]
    pub num_workers: Option<usize>,
    /// Override crawler's delay in seconds between two requests of a seed
    #[clap(long)]
    pub delay: Option<f32>,
    /// Override crawler's request timeout in seconds
    #[clap(long)]
    pub timeout: Option<u64>,
    /// When quiet no logs are outputted
    #[clap(long, short)]
    pub quiet: bool,
}

impl TryFrom<&CrawlArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CrawlArgs) -> Result<Self, Self::Error> {
        let mut conf = if let Some(file) = args.crawler_config.as_ref().map(File::open) {
            serde_yaml::from_reader(file?)?
        } else {
            CrawlerConfig::default()
        };
        if let Some(user_agent) = &args.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(max_pages) = args.max_pages {
            conf.max_pages = max_pages;
        }
        if let Some(max_depth) = args.max_depth {
            conf.max_depth = max_depth;
        }
        if let Some(num_workers) = args.num_workers {
            conf.num_workers = num_workers;
        }
        if let Some(delay) = args.delay {
            conf.delay = delay;
        }
        if let Some(timeout) = args.timeout {
            conf.timeout = timeout;
        }
        Ok(conf)
    }
}

pub fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let crawler_conf: CrawlerConfig = (&args).try_into()?;

    let mut seeds = output::read_seeds(&args.seeds)?;
    if let Some(label) = &args.label {
        seeds.retain(|s| &s.label == label);
        if seeds.is_empty() {
            anyhow::bail!("No seed labelled {label} in {}", args.seeds.display());
        }
    }

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let report = rt.block_on(crawl_seeds(&crawler_conf, seeds))?;

    output::create_dir(&args.output_dir)?;
    for seed in &report.seeds {
        for path in output::write_seed(&args.output_dir, seed)? {
            log::info!("Wrote {}", path.display());
        }
    }
    let summary = args.output_dir.join("summary.csv");
    output::write_summary(&summary, report.summaries())?;
    log::info!("Wrote {}", summary.display());

    for failure in &report.failures {
        log::warn!("No output for {}: {}", failure.label, failure.reason);
    }
    Ok(())
}

/// Fetch a single url and print what the crawler extracts from it as json
#[derive(Debug, clap::Args)]
pub struct ProbeArgs {
    /// The url to fetch
    #[clap(long)]
    pub url: String,
    /// Only request headers
    #[clap(long)]
    pub head: bool,
    /// Custom user agent to download the page
    #[clap(long)]
    pub ua: Option<String>,
}

pub fn probe_url(args: ProbeArgs) -> anyhow::Result<()> {
    let mut conf = CrawlerConfig::default();
    if let Some(ua) = args.ua {
        conf.user_agent = ua;
    }
    let method = if args.head { Method::Head } else { Method::Get };

    let rt = runtime::Builder::new_current_thread().enable_all().build()?;
    let res = rt.block_on(async {
        let fetcher = Arc::new(HttpFetcher::new(&conf)?);
        anyhow::Ok(probe(&conf, fetcher, &args.url, method).await)
    })?;

    serde_json::to_writer_pretty(io::stdout(), &res)?;
    println!();
    Ok(())
}

fn init_logs(filters: &str) {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", filters);
    }
    env_logger::init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Crawl(args) => {
            if !args.quiet {
                init_logs("fwc_crawler=info,fwc=info");
            }
            crawl(args)
        }
        SubCommand::Probe(args) => {
            init_logs("fwc_crawler=warn");
            probe_url(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "fwc", &mut io::stdout());
            Ok(())
        }
    }
}
