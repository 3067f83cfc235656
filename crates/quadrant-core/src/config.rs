use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use quadrant_shared::Credentials;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::api::DEFAULT_SERVER_URL;

const RC_ENV_VAR: &str = "QUADRANTRC";
const PASSWORD_ENV_VAR: &str =
  "QUADRANT_PASSWORD";
const RC_FILE_NAME: &str =
  ".quadrantrc";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  pub fn defaults() -> Self {
    let mut cfg = Config {
      map:          HashMap::new(),
      loaded_files: vec![]
    };

    for (key, value) in [
      ("server.url", DEFAULT_SERVER_URL),
      ("filter.pending", "all"),
      ("filter.done", "all"),
      ("color", "on"),
      ("confirm", "on")
    ] {
      cfg
        .map
        .insert(key.to_string(), value.to_string());
    }

    cfg
  }

  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading quadrantrc");
      cfg.load_file(
        &path,
        &mut Vec::new()
      )?;
    } else {
      debug!(
        "no quadrantrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  /// Login credentials, if a username is
  /// configured. The password may come
  /// from the environment instead of the
  /// rc file.
  pub fn credentials(
    &self
  ) -> anyhow::Result<Option<Credentials>>
  {
    let Some(username) = self
      .get("auth.username")
      .filter(|u| !u.trim().is_empty())
    else {
      return Ok(None);
    };

    let password = self
      .get("auth.password")
      .or_else(|| {
        std::env::var(PASSWORD_ENV_VAR)
          .ok()
      })
      .ok_or_else(|| {
        anyhow!(
          "auth.username is set but no \
           password was configured \
           (auth.password or \
           {PASSWORD_ENV_VAR})"
        )
      })?;

    Ok(Some(Credentials {
      username: username
        .trim()
        .to_string(),
      password
    }))
  }

  /// `active` is the chain of files
  /// currently being read, outermost
  /// first.
  #[tracing::instrument(skip(
    self, active
  ))]
  fn load_file(
    &mut self,
    path: &Path,
    active: &mut Vec<PathBuf>
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());
    active.push(identity(&path));

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if active
          .contains(&identity(&include_path))
        {
          warn!(include = %include_path.display(), "include cycle; skipping");
        } else if include_path.exists() {
          self.load_file(
            &include_path,
            active
          )?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, "loaded config key");
      self.map.insert(key, value);
    }

    active.pop();
    Ok(())
  }
}

/// Where exports are written: the flag,
/// then `export.dir`, then the OS
/// download directory, then `.`.
pub fn resolve_export_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> PathBuf {
  if let Some(path) = override_dir {
    return expand_tilde(path);
  }

  if let Some(cfg_value) =
    cfg.get("export.dir")
    && !cfg_value.trim().is_empty()
  {
    return expand_tilde(Path::new(
      cfg_value.trim()
    ));
  }

  dirs::download_dir()
    .unwrap_or_else(|| PathBuf::from("."))
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping \
       quadrantrc"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn identity(path: &Path) -> PathBuf {
  fs::canonicalize(path)
    .unwrap_or_else(|_| path.to_path_buf())
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

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::path::Path;

  use tempfile::tempdir;

  use super::{
    Config,
    resolve_export_dir
  };

  #[test]
  fn loads_rc_with_include_and_overrides()
  {
    let dir = tempdir().expect("tempdir");
    fs::write(
      dir.path().join("server.rc"),
      "server.url = http://tasks.local:8080\n"
    )
    .expect("write include");
    let rc = dir.path().join("main.rc");
    fs::write(
      &rc,
      "# quadrant settings\n\
       include server.rc\n\
       filter.pending=imp_urg  # start focused\n\
       color=off\n"
    )
    .expect("write rc");

    let mut cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);
    assert_eq!(
      cfg.get("server.url").as_deref(),
      Some("http://tasks.local:8080")
    );
    assert_eq!(
      cfg.get("filter.pending").as_deref(),
      Some("imp_urg")
    );
    assert_eq!(
      cfg.get("filter.done").as_deref(),
      Some("all")
    );
    assert_eq!(
      cfg.get_bool("color"),
      Some(false)
    );

    cfg.apply_overrides([(
      "rc.color".to_string(),
      "on".to_string()
    )]);
    assert_eq!(
      cfg.get_bool("color"),
      Some(true)
    );
  }

  #[test]
  fn shared_includes_load_and_cycles_stop()
  {
    let dir = tempdir().expect("tempdir");
    fs::write(
      dir.path().join("common.rc"),
      "color=off\n"
    )
    .expect("write common");
    fs::write(
      dir.path().join("left.rc"),
      "include common.rc\n\
       filter.done=imp_urg\n"
    )
    .expect("write left");
    fs::write(
      dir.path().join("right.rc"),
      "include ./common.rc\n\
       include main.rc\n"
    )
    .expect("write right");
    let rc = dir.path().join("main.rc");
    fs::write(
      &rc,
      "include left.rc\n\
       include right.rc\n\
       confirm=off\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(&rc))
      .expect("load config");

    let common_loads = cfg
      .loaded_files
      .iter()
      .filter(|p| p.ends_with("common.rc"))
      .count();
    assert_eq!(common_loads, 2);
    assert_eq!(
      cfg
        .loaded_files
        .iter()
        .filter(|p| p.ends_with("main.rc"))
        .count(),
      1
    );
    assert_eq!(
      cfg.get_bool("color"),
      Some(false)
    );
    assert_eq!(
      cfg.get("filter.done").as_deref(),
      Some("imp_urg")
    );
    assert_eq!(
      cfg.get_bool("confirm"),
      Some(false)
    );
  }

  #[test]
  fn rejects_lines_without_equals() {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("bad.rc");
    fs::write(&rc, "just words\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());
  }

  #[test]
  fn credentials_need_a_password() {
    let mut cfg = Config::defaults();
    assert!(
      cfg
        .credentials()
        .expect("no username")
        .is_none()
    );

    cfg.apply_overrides([
      (
        "auth.username".to_string(),
        "vicky".to_string()
      ),
      (
        "auth.password".to_string(),
        "password123".to_string()
      ),
    ]);
    let creds = cfg
      .credentials()
      .expect("credentials")
      .expect("configured");
    assert_eq!(creds.username, "vicky");
  }

  #[test]
  fn export_dir_prefers_flag_then_config()
  {
    let mut cfg = Config::defaults();
    cfg.apply_overrides([(
      "export.dir".to_string(),
      "/tmp/exports".to_string()
    )]);
    assert_eq!(
      resolve_export_dir(
        &cfg,
        Some(Path::new("/srv/out"))
      ),
      Path::new("/srv/out")
    );
    assert_eq!(
      resolve_export_dir(&cfg, None),
      Path::new("/tmp/exports")
    );
  }
}
