use crate::record::Record;
use once_cell::sync::Lazy;
use regex::Regex;

static STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static COLLAPSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

/// Sanitize a string for use as a file name. The extension has to be added
/// afterwards, a `.` would be stripped.
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    let stripped = STRIP.replace_all(&lower, "");
    COLLAPSE.replace_all(&stripped, "-").into_owned()
}

pub fn file_name(record: &Record) -> String {
    format!("{}.md", slugify(&format!("{}-{}", record.year, record.title)))
}
