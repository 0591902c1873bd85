use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A named upstream object (artist, label, format). Only `name` is rendered,
/// everything else Discogs sends along is kept in `extra`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One release of a collection, as found under `basic_information`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Record {
    pub id: u64,
    pub master_id: u64,
    #[serde(deserialize_with = "null_as_empty")]
    pub master_url: String,
    pub resource_url: String,
    // only present with a token
    #[serde(default, deserialize_with = "null_as_empty")]
    pub thumb: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cover_image: String,
    pub title: String,
    pub year: u32,
    pub formats: Vec<Entity>,
    pub artists: Vec<Entity>,
    pub labels: Vec<Entity>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn names(entities: &[Entity]) -> Vec<String> {
    entities.iter().map(|x| x.name.clone()).collect()
}

impl Record {
    pub fn artist_names(&self) -> Vec<String> {
        names(&self.artists)
    }

    pub fn format_names(&self) -> Vec<String> {
        names(&self.formats)
    }

    pub fn label_names(&self) -> Vec<String> {
        names(&self.labels)
    }
}

pub fn collection_artists(records: &[Record]) -> BTreeSet<&str> {
    records
        .iter()
        .flat_map(|record| record.artists.iter().map(|x| x.name.as_str()))
        .collect()
}
