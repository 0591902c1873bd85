use anyhow::{Context, Result};
use env_logger::{fmt::Color, Builder, WriteStyle};
use log::{Level, LevelFilter};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

// overrides the configured filters, same syntax as RUST_LOG
pub const LOG_ENV: &str = "DISCOGS_MD_LOG";
pub const LOG_STYLE_ENV: &str = "DISCOGS_MD_LOG_STYLE";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Auto,
    Always,
    Never,
}

impl From<Style> for WriteStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Auto => WriteStyle::Auto,
            Style::Always => WriteStyle::Always,
            Style::Never => WriteStyle::Never,
        }
    }
}

/// Contents of `logging.yaml`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub modules: BTreeMap<String, String>,
    pub style: Style,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".into(),
            modules: BTreeMap::new(),
            style: Style::Auto,
        }
    }
}

fn level(s: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(s).with_context(|| format!("invalid log level {:?}", s))
}

impl LoggingConfig {
    /// Load the config at `path`, falling back to the defaults when the file
    /// doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("couldn't read logging config {:?}", path))?;
        Self::parse(&text).with_context(|| format!("invalid logging config {:?}", path))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        level(&self.level)?;
        for value in self.modules.values() {
            level(value)?;
        }
        Ok(())
    }

    pub fn builder(&self) -> Result<Builder> {
        let mut builder = Builder::new();
        builder
            .filter_level(level(&self.level)?)
            .write_style(self.style.into())
            .format(|buf, record| {
                let mut style = buf.style();
                let level = match record.level() {
                    Level::Warn => style.set_color(Color::Yellow).value("   warn"),
                    Level::Info => style.set_color(Color::Green).value("   info"),
                    Level::Error => style.set_color(Color::Red).value("  error"),
                    Level::Debug => style.set_color(Color::Blue).value("  debug"),
                    Level::Trace => style
                        .set_color(Color::Blue)
                        .set_bold(true)
                        .value("  trace"),
                };

                writeln!(buf, "{} {}", level, record.args())
            });
        for (module, value) in &self.modules {
            builder.filter_module(module, level(value)?);
        }

        if let Ok(filters) = std::env::var(LOG_ENV) {
            builder.parse_filters(&filters);
        }
        if let Ok(style) = std::env::var(LOG_STYLE_ENV) {
            builder.parse_write_style(&style);
        }

        Ok(builder)
    }

    pub fn init(&self) -> Result<()> {
        self.builder()?
            .try_init()
            .context("logger already initialized")
    }
}
