//! Configuration file loading and error types.

use std::{fs, path::Path};

use crate::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format")]
    UnsupportedFormat,
    #[error("validation: {0}")]
    Validation(String),
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "json" | "jsonc" => {
            let stripped = json_comments::StripComments::new(data.as_bytes());
            Ok(serde_json::from_reader(stripped)?)
        }
        "yaml" | "yml" => Ok(serde_yaml::from_str(&data)?),
        "toml" => Ok(toml::from_str(&data)?),
        _ => Err(ConfigError::UnsupportedFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(ext: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "wayfarer-config-{}-{}.{ext}",
            std::process::id(),
            ext
        ));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_toml() {
        let path = write_temp(
            "toml",
            r#"
[server]
listen = "127.0.0.1:9000"

[blob]
signing_secret = "0123456789abcdef0123"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.listen, "127.0.0.1:9000");
        assert_eq!(cfg.blob.signed_url_ttl_secs, 60);
        assert_eq!(cfg.tiers.len(), 4);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_load_jsonc_strips_comments() {
        let path = write_temp(
            "jsonc",
            r#"{
  // signing key for download links
  "blob": { "signing_secret": "0123456789abcdef0123", "backend": "memory" },
  "quota": { "bulk_min_tier": "explorer" }
}"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.blob.backend, "memory");
        assert_eq!(cfg.quota.bulk_min_tier, "explorer");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_load_yaml_tiers() {
        let path = write_temp(
            "yaml",
            r#"
blob:
  signing_secret: "0123456789abcdef0123"
tiers:
  free: { max_storage_bytes: "100MB", max_experiences: 1, max_exports: 0 }
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.tiers.len(), 1);
        assert_eq!(
            cfg.tiers[&wayfarer_guard::Tier::Free].max_storage_bytes,
            100 * 1024 * 1024
        );
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_unsupported_extension() {
        let path = write_temp("ini", "listen = x");
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::UnsupportedFormat)
        ));
        let _ = fs::remove_file(path);
    }
}
