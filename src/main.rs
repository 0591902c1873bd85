//! Request the record collection of a Discogs user and write it to a folder
//! with a markdown file for each record.
//!
//! Image URLs are only returned when a personal access token is configured.
use anyhow::Result;
use clap::Parser;
use discogs_md::logging::LoggingConfig;
use discogs_md::{load_records, mirror_collection, store, CollectionClient, Config, Summary};
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(
    name = "discogs-md",
    about = "Mirror a Discogs collection as markdown files with YAML front matter."
)]
struct Opt {
    /// Discogs user name
    #[clap(long = "user_name", required_unless_present = "from_json")]
    pub user_name: Option<String>,

    /// Output folder for the collection records
    #[clap(long = "output_folder", default_value = "collection", parse(from_os_str))]
    pub output_folder: PathBuf,

    /// Logging configuration
    #[clap(long = "log_config", default_value = "logging.yaml", parse(from_os_str))]
    pub log_config: PathBuf,

    /// Render a dump made by collection_dump instead of querying Discogs
    #[clap(long = "from_json", parse(from_os_str))]
    pub from_json: Option<PathBuf>,
}

fn run(opt: Opt) -> Result<Summary> {
    let Opt {
        user_name,
        output_folder,
        from_json,
        ..
    } = opt;

    let summary = match (from_json, user_name) {
        (Some(path), _) => {
            info!("Rendering records from {:?}", path);
            store(&load_records(path)?, &output_folder)?
        }
        (None, Some(user_name)) => {
            let config = Config::from_env()?;
            let client = CollectionClient::new(config.user_agent, config.token);
            mirror_collection(&client, &user_name, &output_folder)?
        }
        (None, None) => return Err(discogs_md::Error::ConfigMissing("user_name").into()),
    };

    Ok(summary)
}

fn main() {
    let opt = Opt::parse();

    if let Err(e) = LoggingConfig::load(&opt.log_config).and_then(|config| config.init()) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }

    match run(opt) {
        Ok(summary) => info!(
            "Wrote {} files for {} records by {} artists",
            summary.files, summary.records, summary.artists
        ),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
