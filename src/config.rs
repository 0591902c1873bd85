use crate::error::{Error, Result};
use std::fmt;

pub const USER_AGENT: &str = "USER_AGENT";
pub const PAT_TOKEN: &str = "PAT_TOKEN";

/// Identity used against the Discogs API. We authorize as our own user with a
/// personal access token, so there is no OAuth flow.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub user_agent: String,
    pub token: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("user_agent", &self.user_agent)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Read the configuration from the process environment, after loading a
    /// `.env` file if there is one.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let user_agent = lookup(USER_AGENT)
            .filter(|x| !x.is_empty())
            .ok_or(Error::ConfigMissing(USER_AGENT))?;
        // a collection can be requested without a token, but without image URLs
        let token = lookup(PAT_TOKEN).filter(|x| !x.is_empty());

        Ok(Config { user_agent, token })
    }
}
