use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use serde::Deserialize;
use tasklist_core::{
  DEFAULT_TASKS_KEY,
  Timing
};
use tracing::{
  debug,
  info
};

pub const CONFIG_ENV_VAR: &str =
  "TASKLIST_CONFIG";
const CONFIG_DIR_NAME: &str = "tasklist";
const CONFIG_FILE_NAME: &str =
  "tasklist.toml";

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub data_dir:    Option<PathBuf>,
  pub storage_key: String,
  pub timezone:    Option<String>,
  pub color:       bool,
  pub timing:      TimingConfig,
  #[serde(skip)]
  pub loaded_from: Option<PathBuf>
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
  pub debounce_ms:           u64,
  pub delete_delay_ms:       u64,
  pub persist_interval_secs: u64
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_dir:    None,
      storage_key: DEFAULT_TASKS_KEY
        .to_string(),
      timezone:    None,
      color:       true,
      timing:      TimingConfig::default(),
      loaded_from: None
    }
  }
}

impl Default for TimingConfig {
  fn default() -> Self {
    let timing = Timing::default();
    Self {
      debounce_ms:           timing
        .debounce
        .as_millis()
        as u64,
      delete_delay_ms:       timing
        .delete_delay
        .as_millis()
        as u64,
      persist_interval_secs: timing
        .persist_interval
        .as_secs()
    }
  }
}

impl Config {
  /// Loads the config file, or defaults
  /// when none is found. An explicitly
  /// named file must exist.
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) = resolve_config_path(
      config_override
    )?
    else {
      debug!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let mut cfg = Self::parse_file(&path)?;
    cfg.loaded_from = Some(path);
    Ok(cfg)
  }

  pub fn parse_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text =
      fs::read_to_string(path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    Self::parse_str(&text).with_context(
      || {
        format!(
          "invalid config {}",
          path.display()
        )
      }
    )
  }

  pub fn parse_str(
    text: &str
  ) -> anyhow::Result<Self> {
    toml::from_str::<Config>(text)
      .map_err(|e| anyhow!("{e}"))
  }

  /// Applies `KEY=VALUE` overrides on
  /// top of the loaded file.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k.trim();
      let value = v.trim();
      debug!(key, value, "applying override");

      match key {
        | "data_dir" => {
          self.data_dir =
            Some(PathBuf::from(value));
        }
        | "storage_key" => {
          if value.is_empty() {
            return Err(anyhow!(
              "storage_key cannot be \
               empty"
            ));
          }
          self.storage_key =
            value.to_string();
        }
        | "timezone" => {
          self.timezone =
            Some(value.to_string());
        }
        | "color" => {
          self.color = parse_bool(value)
            .ok_or_else(|| {
              anyhow!(
                "invalid color \
                 setting: {value}"
              )
            })?;
        }
        | "timing.debounce_ms" => {
          self.timing.debounce_ms =
            parse_number(key, value)?;
        }
        | "timing.delete_delay_ms" => {
          self.timing.delete_delay_ms =
            parse_number(key, value)?;
        }
        | "timing.persist_interval_secs" => {
          self
            .timing
            .persist_interval_secs =
            parse_number(key, value)?;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: \
             {other}"
          ));
        }
      }
    }
    Ok(())
  }

  pub fn timing(&self) -> Timing {
    Timing {
      debounce:         Duration::from_millis(
        self.timing.debounce_ms
      ),
      delete_delay:     Duration::from_millis(
        self.timing.delete_delay_ms
      ),
      persist_interval: Duration::from_secs(
        self
          .timing
          .persist_interval_secs
      )
    }
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.data_dir.as_deref()
  {
    expand_tilde(cfg_value)
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(expand_tilde(path)));
  }

  if let Ok(env_path) =
    std::env::var(CONFIG_ENV_VAR)
  {
    if env_path == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(expand_tilde(
      Path::new(&env_path)
    )));
  }

  let Some(config_dir) =
    dirs::config_dir()
  else {
    return Ok(None);
  };
  let candidate = config_dir
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  if let Some(data) = dirs::data_dir() {
    return Ok(data.join(CONFIG_DIR_NAME));
  }
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".tasklist"))
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

fn parse_number(
  key: &str,
  value: &str
) -> anyhow::Result<u64> {
  value.parse::<u64>().with_context(
    || {
      format!(
        "{key} expects a whole \
         number, got {value}"
      )
    }
  )
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::Config;

  #[test]
  fn defaults_match_the_browser_timings()
  {
    let timing =
      Config::default().timing();
    assert_eq!(
      timing.debounce,
      Duration::from_millis(300)
    );
    assert_eq!(
      timing.delete_delay,
      Duration::from_millis(300)
    );
    assert_eq!(
      timing.persist_interval,
      Duration::from_secs(30)
    );
  }

  #[test]
  fn partial_file_keeps_other_defaults()
  {
    let cfg = Config::parse_str(
      r#"
storage_key = "todo"
timezone = "Europe/Berlin"

[timing]
debounce_ms = 150
"#
    )
    .expect("valid config");
    assert_eq!(cfg.storage_key, "todo");
    assert_eq!(
      cfg.timezone.as_deref(),
      Some("Europe/Berlin")
    );
    assert_eq!(cfg.timing.debounce_ms, 150);
    assert_eq!(
      cfg.timing.delete_delay_ms,
      300
    );
    assert!(cfg.color);
  }

  #[test]
  fn unknown_keys_are_rejected() {
    assert!(
      Config::parse_str("colour = true")
        .is_err()
    );
    let mut cfg = Config::default();
    assert!(
      cfg
        .apply_overrides([(
          "nope".to_string(),
          "1".to_string()
        )])
        .is_err()
    );
  }

  #[test]
  fn overrides_win_over_file_values() {
    let mut cfg = Config::parse_str(
      "color = true\n"
    )
    .expect("valid config");
    cfg
      .apply_overrides([
        (
          "color".to_string(),
          "off".to_string()
        ),
        (
          "timing.persist_interval_secs"
            .to_string(),
          "5".to_string()
        ),
      ])
      .expect("valid overrides");
    assert!(!cfg.color);
    assert_eq!(
      cfg.timing().persist_interval,
      Duration::from_secs(5)
    );
  }
}
