use std::{collections::HashMap, fs};

use anyhow::Context;
use url::Url;

#[derive(Debug)]
pub struct Settings {
    pub api_base_url: String,
    pub geocode_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            geocode_base_url: "https://api.bigdatacloud.net/data".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("citylog.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("api_base_url") {
                settings.api_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("geocode_base_url") {
                settings.geocode_base_url = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("CITYLOG_API_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = std::env::var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Ok(v) = std::env::var("CITYLOG_GEOCODE_URL") {
        settings.geocode_base_url = v;
    }
    if let Ok(v) = std::env::var("APP__GEOCODE_BASE_URL") {
        settings.geocode_base_url = v;
    }

    settings
}

/// Checks a configured base URL and strips any trailing slash so endpoint
/// paths can be appended verbatim.
pub fn validate_base_url(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw).with_context(|| format!("invalid base url '{raw}'"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("base url '{raw}' must use http or https");
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn validates_and_trims_base_urls() {
        assert_eq!(
            validate_base_url("http://127.0.0.1:8000/").expect("valid"),
            "http://127.0.0.1:8000"
        );
        assert_eq!(
            validate_base_url("https://api.bigdatacloud.net/data").expect("valid"),
            "https://api.bigdatacloud.net/data"
        );
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn layers_defaults_file_and_environment() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();

        let temp_root = env::temp_dir().join(format!("citylog_config_test_{suffix}"));
        fs::create_dir_all(&temp_root).expect("temp root");

        let original_dir = env::current_dir().expect("cwd");
        env::set_current_dir(&temp_root).expect("set cwd");
        for var in [
            "CITYLOG_API_URL",
            "APP__API_BASE_URL",
            "CITYLOG_GEOCODE_URL",
            "APP__GEOCODE_BASE_URL",
        ] {
            env::remove_var(var);
        }

        let defaults = load_settings();
        assert_eq!(defaults.api_base_url, "http://127.0.0.1:8000");

        fs::write(
            "citylog.toml",
            "api_base_url = \"http://localhost:9001\"\n",
        )
        .expect("write config");
        let from_file = load_settings();
        assert_eq!(from_file.api_base_url, "http://localhost:9001");
        assert_eq!(
            from_file.geocode_base_url,
            "https://api.bigdatacloud.net/data"
        );

        env::set_var("CITYLOG_API_URL", "http://localhost:9002");
        let from_env = load_settings();
        assert_eq!(from_env.api_base_url, "http://localhost:9002");

        env::set_var("APP__API_BASE_URL", "http://localhost:9003");
        let from_app_env = load_settings();
        assert_eq!(from_app_env.api_base_url, "http://localhost:9003");

        for var in ["CITYLOG_API_URL", "APP__API_BASE_URL"] {
            env::remove_var(var);
        }
        env::set_current_dir(original_dir).expect("restore cwd");
        fs::remove_dir_all(temp_root).expect("cleanup");
    }
}
