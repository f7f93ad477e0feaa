//! Configuration file and cookie file discovery for the `fbdl` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use engine_logging::engine_info;
use fbdl_engine::{
    CookieJar, EngineConfig, FetchSettings, MetadataScope, ResolverSettings, DEFAULT_SITE_ORIGIN,
};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "fbdl.ron";
pub const LOCAL_COOKIE_FILE: &str = "cookies";
pub const HOME_COOKIE_FILE: &str = ".facebook-cookies";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output_dir: Option<PathBuf>,
    pub jobs: usize,
    pub connect_timeout_secs: u64,
    pub page_timeout_secs: u64,
    pub media_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub site_origin: String,
    /// Keep descriptors from earlier pages when resolving later ones.
    pub shared_metadata: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            output_dir: None,
            jobs: 1,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            page_timeout_secs: fetch.page_timeout.as_secs(),
            media_timeout_secs: fetch.media_timeout.map(|t| t.as_secs()),
            user_agent: None,
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            shared_metadata: false,
        }
    }
}

impl AppConfig {
    pub fn engine_config(&self, output_dir: PathBuf, cookies: CookieJar) -> EngineConfig {
        let mut fetch = FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            page_timeout: Duration::from_secs(self.page_timeout_secs),
            media_timeout: self.media_timeout_secs.map(Duration::from_secs),
            ..FetchSettings::default()
        };
        if let Some(agent) = &self.user_agent {
            fetch.user_agent = agent.clone();
        }
        let metadata_scope = if self.shared_metadata {
            MetadataScope::Shared
        } else {
            MetadataScope::PerPage
        };
        EngineConfig {
            fetch,
            resolver: ResolverSettings {
                site_origin: self.site_origin.clone(),
                metadata_scope,
            },
            output_dir,
            cookies,
        }
    }
}

/// Load the configuration file. A missing file yields defaults unless `required`.
pub fn load_config(path: &Path, required: bool) -> Result<AppConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config file {}", path.display()))
        }
    };
    let config: AppConfig = ron::from_str(&content)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    engine_info!("Loaded configuration from {:?}", path);
    Ok(config)
}

/// Cookie file to use: the explicit path, else `./cookies`, else `~/.facebook-cookies`.
pub fn find_cookie_file(
    explicit: Option<&Path>,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("cookie file {} does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }
    let local = cwd.join(LOCAL_COOKIE_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }
    Ok(home
        .map(|home| home.join(HOME_COOKIE_FILE))
        .filter(|path| path.is_file()))
}

pub fn load_cookies(path: &Path) -> Result<CookieJar> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading cookie file {}", path.display()))?;
    let jar = CookieJar::parse(&raw);
    engine_info!(
        "Loaded {} cookies ({}) from {:?}",
        jar.len(),
        jar.names().collect::<Vec<_>>().join(", "),
        path
    );
    Ok(jar)
}
