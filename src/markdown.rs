//! Rendering of records as markdown files with a YAML front matter header.
use crate::error::{Error, Result};
use crate::record::Record;
use crate::slug::file_name;
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;

const DELIMITER: &str = "---\n";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Year {
    Known(u32),
    Unknown,
}

impl From<u32> for Year {
    fn from(year: u32) -> Self {
        match year {
            0 => Year::Unknown,
            year => Year::Known(year),
        }
    }
}

impl Serialize for Year {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Year::Known(year) => serializer.serialize_u32(*year),
            Year::Unknown => serializer.serialize_str("Unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for Year {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(year) => Ok(Year::Known(year)),
            Raw::Text(text) if text == "Unknown" => Ok(Year::Unknown),
            Raw::Text(text) => Err(serde::de::Error::custom(format!(
                "expected a year or \"Unknown\", got {:?}",
                text
            ))),
        }
    }
}

/// The metadata written on top of each file. Field order is the key order in
/// the output.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: String,
    pub artists: Vec<String>,
    pub year: Year,
    pub format: Vec<String>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub labels: Vec<String>,
    pub thumbnail: String,
    pub cover: String,
}

impl From<&Record> for FrontMatter {
    fn from(record: &Record) -> Self {
        FrontMatter {
            title: record.title.clone(),
            artists: record.artist_names(),
            year: record.year.into(),
            format: record.format_names(),
            genres: record.genres.clone(),
            styles: record.styles.clone(),
            labels: record.label_names(),
            thumbnail: record.thumb.clone(),
            cover: record.cover_image.clone(),
        }
    }
}

pub fn render(record: &Record) -> Result<String> {
    let yaml = serde_yaml::to_string(&FrontMatter::from(record))?;
    Ok(format!("{}{}{}", DELIMITER, yaml, DELIMITER))
}

pub fn parse_front_matter(document: &str) -> Result<FrontMatter> {
    let rest = document
        .strip_prefix(DELIMITER)
        .ok_or_else(|| Error::Render("document does not start with ---".into()))?;
    let end = rest
        .find("\n---\n")
        .ok_or_else(|| Error::Render("unterminated front matter".into()))?;
    Ok(serde_yaml::from_str(&rest[..=end])?)
}

fn prepare_folder(folder: &Path) -> Result<()> {
    if folder.exists() && !folder.is_dir() {
        return Err(Error::not_writable(
            folder,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "not a directory"),
        ));
    }
    create_dir_all(folder).map_err(|e| Error::not_writable(folder, e))
}

/// Write every record to `folder` as `<year>-<title>.md`, in order.
///
/// Records with the same slug end up in the same file, the last one wins.
/// Returns the number of distinct files written.
pub fn write_collection(records: &[Record], folder: impl AsRef<Path>) -> Result<usize> {
    let folder = folder.as_ref();
    prepare_folder(folder)?;
    info!("Storing collection records under {:?}", folder);

    let mut written = HashSet::new();
    for record in records {
        let name = file_name(record);
        let path = folder.join(&name);
        let document = render(record)?;

        let mut file = File::create(&path).map_err(|e| Error::not_writable(&path, e))?;
        file.write_all(document.as_bytes())
            .map_err(|e| Error::not_writable(&path, e))?;

        if !written.insert(name) {
            warn!(
                "{:?} overwritten by release {} ({:?})",
                path, record.id, record.title
            );
        }
    }

    info!("Done writing records.");
    Ok(written.len())
}
