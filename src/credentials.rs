use crate::error::{Result, StatsError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

pub const DEFAULT_CREDS_FILE: &str = "ws_mongo_creds";
pub const DEFAULT_CREDS_SECTION: &str = "WorkspaceMongoCreds";
pub const KEY_USER: &str = "user";
pub const KEY_PWD: &str = "pwd";

/// Database login read from the credential file.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub pwd: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pwd", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct RawSection {
    user: Option<String>,
    pwd: Option<String>,
}

impl Credentials {
    /// Reads `user` and `pwd` from `[section]` of a TOML file.
    pub fn load(path: &Path, section: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StatsError::Credentials {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content, section).map_err(|message| StatsError::Credentials {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str, section: &str) -> std::result::Result<Self, String> {
        let mut sections: BTreeMap<String, RawSection> = toml::from_str(content).map_err(|e| {
            format!("not valid TOML ({e}); values must be quoted strings, e.g. {KEY_USER} = \"wsadmin\"")
        })?;
        let raw = sections
            .remove(section)
            .ok_or_else(|| format!("missing section [{section}]"))?;

        let user = required(raw.user, section, KEY_USER)?;
        let pwd = required(raw.pwd, section, KEY_PWD)?;
        Ok(Self { user, pwd })
    }
}

fn required(value: Option<String>, section: &str, key: &str) -> std::result::Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!("missing or empty '{key}' in section [{section}]")),
    }
}
