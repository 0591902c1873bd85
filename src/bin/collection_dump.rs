use anyhow::{Context, Result};
use discogs_md::logging::LoggingConfig;
use discogs_md::{fetch, Config};
use std::env::{args, args_os};
use std::fs::File;
use std::io::BufWriter;

fn main() -> Result<()> {
    LoggingConfig::load("logging.yaml")?.init()?;

    let user_name = args().nth(1).context("missing user name")?;
    let path = args_os().nth(2).context("missing path")?;

    let config = Config::from_env()?;
    let records = fetch(&user_name, &config.user_agent, config.token.as_deref())?;

    let file = File::create(path)?;
    let w = BufWriter::new(file);
    serde_json::to_writer_pretty(w, &records)?;

    Ok(())
}
