use crate::error::{FlamebornError, Result};
use crate::types::config::FlamebornConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use toml::map::Map;
use toml::Value;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "flameborn.toml";
pub const DEFAULT_LOCAL_FILE: &str = ".flameborn/local.toml";
pub const DEFAULT_GLOBAL_CONFIG_FILE: &str = ".config/flameborn/config.toml";

/// Loads `flameborn.toml` from `root`, layered over the user's global config and
/// under `.flameborn/local.toml`. Returns `None` when the project file is absent.
pub fn load_config(root: &Path) -> Result<Option<FlamebornConfig>> {
    let global = std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_GLOBAL_CONFIG_FILE));
    load_config_with_global(root, global.as_deref())
}

/// One file in the configuration stack, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigLayer {
    Global,
    Project,
    Local,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Global => "global",
            Self::Project => "project",
            Self::Local => "local",
        })
    }
}

/// The merged table after each applied layer.
struct Applied {
    layer: ConfigLayer,
    path: PathBuf,
    merged: Value,
}

pub(crate) fn load_config_with_global(
    root: &Path,
    global_path: Option<&Path>,
) -> Result<Option<FlamebornConfig>> {
    let project_path = root.join(DEFAULT_CONFIG_FILE);
    if !project_path.exists() {
        return Ok(None);
    }

    let layers = [
        global_path.map(|path| (ConfigLayer::Global, path.to_path_buf())),
        Some((ConfigLayer::Project, project_path)),
        Some((ConfigLayer::Local, root.join(DEFAULT_LOCAL_FILE))),
    ];

    let mut merged = Value::Table(Map::new());
    let mut applied = Vec::new();
    for (layer, path) in layers.into_iter().flatten() {
        if !path.exists() {
            continue;
        }
        merge_toml(&mut merged, read_toml_value(&path)?);
        debug!(layer = %layer, path = %path.display(), "applied config layer");
        applied.push(Applied {
            layer,
            path,
            merged: merged.clone(),
        });
    }

    let cfg = resolve(merged).map_err(|e| attribute(e, &applied))?;
    Ok(Some(cfg))
}

fn resolve(merged: Value) -> Result<FlamebornConfig> {
    let cfg: FlamebornConfig = merged
        .try_into()
        .map_err(|e: toml::de::Error| FlamebornError::ConfigParse(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Names the layer that introduced the failure: the last one whose merged
/// result fails while everything below it still resolves.
fn attribute(err: FlamebornError, applied: &[Applied]) -> FlamebornError {
    let mut culprit = None;
    let mut below_ok = true;
    for step in applied {
        let ok = resolve(step.merged.clone()).is_ok();
        if !ok && below_ok {
            culprit = Some(step);
        }
        below_ok = ok;
    }
    let Some(step) = culprit else {
        return err;
    };
    let origin = format!("{} ({} layer)", step.path.display(), step.layer);
    match err {
        FlamebornError::ConfigInvalid(message) => {
            FlamebornError::ConfigInvalid(format!("{origin}: {message}"))
        }
        FlamebornError::ConfigParse(message) => {
            FlamebornError::ConfigParse(format!("{origin}: {message}"))
        }
        other => other,
    }
}

fn read_toml_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| FlamebornError::ConfigParse(format!("{}: {}", path.display(), e)))
}

fn merge_toml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_config_returns_none_when_project_file_missing() {
        let dir = TempDir::new().expect("temp dir should be created");
        let cfg = load_config_with_global(dir.path(), None).expect("load should not fail");
        assert!(cfg.is_none());
    }

    #[test]
    fn load_config_merges_global_project_and_local_in_order() {
        let root = TempDir::new().expect("root temp dir should be created");
        let global_root = TempDir::new().expect("global temp dir should be created");
        let global_path = global_root.path().join("config.toml");

        fs::write(
            &global_path,
            r#"
[scoring]
patients_weight = 3.0
accessibility_weight = 7.0

[donation]
currency = "CELO"
"#,
        )
        .expect("global config should write");

        fs::write(
            root.path().join(DEFAULT_CONFIG_FILE),
            r#"
[scoring]
patients_weight = 2.0

[distribution]
equity_floor_percent = 5.0
"#,
        )
        .expect("project config should write");

        fs::create_dir_all(root.path().join(".flameborn")).expect("local dir should create");
        fs::write(
            root.path().join(DEFAULT_LOCAL_FILE),
            r#"
[distribution]
equity_floor_percent = 8.0
"#,
        )
        .expect("local override should write");

        let cfg = load_config_with_global(root.path(), Some(&global_path))
            .expect("load should succeed")
            .expect("merged config should exist");

        let policy = cfg.scoring_policy();
        assert_eq!(policy.patients_weight, 2.0);
        assert_eq!(policy.accessibility_weight, 7.0);
        assert_eq!(policy.equity_floor_percent, 8.0);
        assert_eq!(cfg.donation_settings().currency, "CELO");
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let root = TempDir::new().expect("root temp dir should be created");
        fs::write(
            root.path().join(DEFAULT_CONFIG_FILE),
            r#"
[distribution]
equity_floor_percent = -1.0
"#,
        )
        .expect("project config should write");

        let err = load_config_with_global(root.path(), None).expect_err("load should fail");
        assert!(matches!(err, FlamebornError::ConfigInvalid(_)));
    }

    #[test]
    fn invalid_value_is_traced_to_the_layer_that_set_it() {
        let root = TempDir::new().expect("root temp dir should be created");
        let global_root = TempDir::new().expect("global temp dir should be created");
        let global_path = global_root.path().join("config.toml");
        fs::write(
            &global_path,
            r#"
[donation]
amount_decimals = 40
"#,
        )
        .expect("global config should write");
        fs::write(
            root.path().join(DEFAULT_CONFIG_FILE),
            r#"
[scoring]
patients_weight = 2.0
"#,
        )
        .expect("project config should write");

        let err = load_config_with_global(root.path(), Some(&global_path))
            .expect_err("load should fail");
        let message = err.to_string();
        assert!(matches!(err, FlamebornError::ConfigInvalid(_)));
        assert!(message.contains("(global layer)"));
        assert!(message.contains("config.toml"));
    }

    #[test]
    fn local_override_is_blamed_over_a_valid_project_file() {
        let root = TempDir::new().expect("root temp dir should be created");
        fs::write(
            root.path().join(DEFAULT_CONFIG_FILE),
            r#"
[distribution]
equity_floor_percent = 5.0
"#,
        )
        .expect("project config should write");
        fs::create_dir_all(root.path().join(".flameborn")).expect("local dir should create");
        fs::write(
            root.path().join(DEFAULT_LOCAL_FILE),
            r#"
[distribution]
equity_floor_percent = 250.0
"#,
        )
        .expect("local override should write");

        let err = load_config_with_global(root.path(), None).expect_err("load should fail");
        assert!(err.to_string().contains("(local layer)"));
    }

    #[test]
    fn later_layer_can_repair_an_earlier_one() {
        let root = TempDir::new().expect("root temp dir should be created");
        let global_root = TempDir::new().expect("global temp dir should be created");
        let global_path = global_root.path().join("config.toml");
        fs::write(
            &global_path,
            r#"
[distribution]
equity_floor_percent = 150.0
"#,
        )
        .expect("global config should write");
        fs::write(
            root.path().join(DEFAULT_CONFIG_FILE),
            r#"
[distribution]
equity_floor_percent = 4.0
"#,
        )
        .expect("project config should write");

        let cfg = load_config_with_global(root.path(), Some(&global_path))
            .expect("load should succeed")
            .expect("merged config should exist");
        assert_eq!(cfg.scoring_policy().equity_floor_percent, 4.0);
    }

    #[test]
    fn load_config_reports_malformed_toml() {
        let root = TempDir::new().expect("root temp dir should be created");
        fs::write(root.path().join(DEFAULT_CONFIG_FILE), "[scoring\n")
            .expect("project config should write");

        let err = load_config_with_global(root.path(), None).expect_err("load should fail");
        assert!(err.to_string().contains("config parse error"));
    }
}
