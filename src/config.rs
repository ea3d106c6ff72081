use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use tracing::{debug, info};

use crate::calendar::feed::DEFAULT_MAX_RESULTS;
use crate::calendar::FeedInfo;
use crate::engine::{CalendarOptions, Trigger, MAX_YEAR_COUNT};
use crate::layout::fit::CellMetrics;
use crate::layout::grid::ViewMode;
use crate::theme;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub feeds: Vec<FeedInfo>,
    pub feeds_dir: PathBuf,
    pub default_view: ViewMode,
    pub trigger: Trigger,
    pub year_start: i32,
    pub year_count: u32,
    pub bottom_margin: u16,
    pub max_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            feeds_dir: default_feeds_dir(),
            default_view: ViewMode::Month,
            trigger: Trigger::Click,
            year_start: 2000,
            year_count: 20,
            bottom_margin: 0,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl Config {
    /// Load `<config_dir>/calgrid/config.toml`, or defaults when it is absent.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .wrap_err_with(|| format!("invalid config {}", path.display()))?;
        info!(path = %path.display(), feeds = config.feeds.len(), "config loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: ConfigFile = toml::from_str(content)?;
        raw.into_config()
    }

    pub fn calendar_options(&self) -> CalendarOptions {
        let defaults = CalendarOptions::default();
        CalendarOptions {
            default_view: self.default_view,
            trigger: self.trigger,
            year_start: self.year_start,
            year_count: self.year_count,
            month_metrics: CellMetrics {
                bottom_margin: self.bottom_margin,
                ..defaults.month_metrics
            },
            week_metrics: CellMetrics {
                bottom_margin: self.bottom_margin,
                ..defaults.week_metrics
            },
            on_event: None,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("calgrid").join("config.toml"))
}

fn default_feeds_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("calgrid").join("feeds"))
        .unwrap_or_else(|| PathBuf::from("feeds"))
}

// ── TOML config types ──

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    feed: Vec<FeedEntry>,
    feeds_dir: Option<PathBuf>,
    default_view: Option<String>,
    trigger: Option<String>,
    year_start: Option<i32>,
    year_count: Option<u32>,
    bottom_margin: Option<u16>,
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    id: String,
    color: Option<String>,
}

impl ConfigFile {
    fn into_config(self) -> Result<Config> {
        let defaults = Config::default();

        let default_view = match self.default_view.as_deref() {
            Some(v) => ViewMode::parse(v).ok_or_else(|| eyre!("unknown default_view '{}'", v))?,
            None => defaults.default_view,
        };
        let trigger = match self.trigger.as_deref() {
            Some(t) => Trigger::parse(t).ok_or_else(|| eyre!("unknown trigger '{}'", t))?,
            None => defaults.trigger,
        };

        let year_count = self.year_count.unwrap_or(defaults.year_count);
        if year_count > MAX_YEAR_COUNT {
            return Err(eyre!(
                "year_count {} is larger than {}",
                year_count,
                MAX_YEAR_COUNT
            ));
        }

        let feeds = self
            .feed
            .into_iter()
            .enumerate()
            .map(|(label, entry)| -> Result<FeedInfo> {
                let color = match entry.color.as_deref() {
                    Some(c) => theme::parse_color(c)
                        .ok_or_else(|| eyre!("unknown color '{}' for feed '{}'", c, entry.id))?,
                    None => theme::feed_color(label),
                };
                Ok(FeedInfo {
                    id: entry.id,
                    label,
                    color,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Config {
            feeds,
            feeds_dir: self.feeds_dir.unwrap_or(defaults.feeds_dir),
            default_view,
            trigger,
            year_start: self.year_start.unwrap_or(defaults.year_start),
            year_count,
            bottom_margin: self.bottom_margin.unwrap_or(defaults.bottom_margin),
            max_results: self.max_results.unwrap_or(defaults.max_results),
        })
    }
}
