use crate::cli::Cli;
use crate::credentials::DEFAULT_CREDS_FILE;
use crate::error::{Result, StatsError};
use crate::report::RenderOptions;
use crate::store::MongoTarget;
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "ws-stats";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 49990;
pub const DEFAULT_DB: &str = "workspace";

pub const ENV_CREDS_FILE: &str = "WS_STATS_CREDS";
pub const ENV_CREDS_SECTION: &str = "WS_STATS_CREDS_SECTION";
pub const ENV_MONGO_HOST: &str = "WS_STATS_MONGO_HOST";
pub const ENV_MONGO_PORT: &str = "WS_STATS_MONGO_PORT";
pub const ENV_MONGO_DB: &str = "WS_STATS_MONGO_DB";
pub const ENV_MONGO_URI: &str = "WS_STATS_MONGO_URI";
pub const ENV_PAGE_SIZE: &str = "WS_STATS_PAGE_SIZE";

/// Locates the credential file.
///
/// An explicit path wins; otherwise `ws_mongo_creds` in `cwd` if present,
/// else the same name in the platform config directory.
pub fn resolve_creds_file(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let local = cwd.join(DEFAULT_CREDS_FILE);
    if local.is_file() {
        return Ok(local);
    }

    let project_dirs = ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| StatsError::config(t!("errors.no_config_dir")))?;
    Ok(project_dirs.config_dir().join(DEFAULT_CREDS_FILE))
}

/// Everything one run needs, checked before any I/O against the store.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: MongoTarget,
    pub creds_file: PathBuf,
    pub creds_section: String,
    pub page_size: u64,
    pub render: RenderOptions,
}

impl RunConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = env::current_dir()?;
        let creds_file = resolve_creds_file(cli.creds_file.as_deref(), &cwd)?;

        let config = Self {
            target: MongoTarget {
                host: cli.host.trim().to_string(),
                port: cli.port,
                database: cli.database.trim().to_string(),
                uri: cli
                    .uri
                    .as_deref()
                    .map(str::trim)
                    .filter(|uri| !uri.is_empty())
                    .map(str::to_string),
            },
            creds_file,
            creds_section: cli.creds_section.trim().to_string(),
            page_size: cli.page_size,
            render: RenderOptions {
                format: cli.format,
                show_workspaces: cli.workspaces,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(StatsError::config(t!("errors.invalid_page_size")));
        }
        if self.target.uri.is_none() {
            non_empty("--host", &self.target.host)?;
        }
        non_empty("--db", &self.target.database)?;
        non_empty("--creds-section", &self.creds_section)?;
        Ok(())
    }
}

fn non_empty(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(StatsError::config(t!("errors.empty_setting", name = name)));
    }
    Ok(())
}
