use std::path::PathBuf;

use anyhow::{Context, bail};
use atelier_media::CloudinaryConfig;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your-secret-key",
];

#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub static_dir: Option<PathBuf>,
    /// `None` unless all three Cloudinary variables are set.
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let set = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = set("ATELIER_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("ATELIER_JWT_SECRET is unset or still a placeholder; set it in .env and restart");
        }

        let port = match set("ATELIER_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("ATELIER_PORT is not a port number: {raw}"))?,
            None => 3000,
        };

        let cloudinary = match (
            set("CLOUDINARY_CLOUD_NAME"),
            set("CLOUDINARY_API_KEY"),
            set("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        Ok(Self {
            host: set("ATELIER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: set("ATELIER_DB_PATH")
                .unwrap_or_else(|| "atelier.db".into())
                .into(),
            jwt_secret,
            static_dir: set("ATELIER_STATIC_DIR").map(PathBuf::from),
            cloudinary,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("ATELIER_JWT_SECRET", "s3cret-value")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("atelier.db"));
        assert!(cfg.static_dir.is_none());
        assert!(cfg.cloudinary.is_none());
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(load(&[]).is_err());
        assert!(load(&[("ATELIER_JWT_SECRET", "dev-secret-change-me")]).is_err());
        assert!(load(&[("ATELIER_JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = load(&[("ATELIER_JWT_SECRET", "x"), ("ATELIER_PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("ATELIER_PORT"));
    }

    #[test]
    fn cloudinary_needs_all_three() {
        let partial = load(&[
            ("ATELIER_JWT_SECRET", "x"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "123"),
        ])
        .unwrap();
        assert!(partial.cloudinary.is_none());

        let full = load(&[
            ("ATELIER_JWT_SECRET", "x"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "123"),
            ("CLOUDINARY_API_SECRET", "abc"),
        ])
        .unwrap();
        assert_eq!(full.cloudinary.unwrap().cloud_name, "demo");
    }
}
