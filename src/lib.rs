use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub mod config;
pub mod discogs;
mod error;
pub mod logging;
pub mod markdown;
pub mod record;
pub mod slug;

pub use config::Config;
pub use discogs::{fetch, CollectionClient, Transport};
pub use error::{Error, Result};
pub use markdown::write_collection;
pub use record::{collection_artists, Entity, Record};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub records: usize,
    pub files: usize,
    pub artists: usize,
}

/// Write `records` to `out_dir` and summarize what was written.
pub fn store(records: &[Record], out_dir: impl AsRef<Path>) -> Result<Summary> {
    let files = write_collection(records, out_dir)?;
    Ok(Summary {
        records: records.len(),
        files,
        artists: collection_artists(records).len(),
    })
}

/// Fetch the whole collection of `user_name`, then write one file per release
/// to `out_dir`. Nothing is written unless the fetch succeeded.
pub fn mirror_collection<T: Transport>(
    client: &CollectionClient<T>,
    user_name: &str,
    out_dir: impl AsRef<Path>,
) -> Result<Summary> {
    let records = client.fetch(user_name)?;
    store(&records, out_dir)
}

/// Read records back from a JSON dump made by `collection_dump`.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let dump = |e: Box<dyn std::error::Error + Send + Sync>| Error::Dump {
        path: path.into(),
        source: e,
    };
    let file = File::open(path).map_err(|e| dump(e.into()))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| dump(e.into()))
}
