use serde::Deserialize;
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub lead: LeadConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the platform backend.
    pub base_url: String,
    /// Command to run to get the bearer token (e.g., "pass show advisorchat").
    /// The command is run via `sh -c`. Token is optional; anonymous chat is
    /// allowed.
    pub token_cmd: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token_cmd: None,
        }
    }
}

impl ApiConfig {
    /// Resolve the bearer token from token_cmd or the ADVISORCHAT_TOKEN env
    /// var. Returns None when neither yields a token.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(cmd) = &self.token_cmd {
            if let Ok(output) = Command::new("sh").arg("-c").arg(cmd).output() {
                if output.status.success() {
                    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !token.is_empty() {
                        return Some(token);
                    }
                }
            }
        }

        std::env::var("ADVISORCHAT_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeadConfig {
    /// Enable the lead-capture prompt entirely.
    pub enabled: bool,
    /// Heuristic trigger: offer the prompt once this many user turns have
    /// been submitted. 0 disables the heuristic.
    pub prompt_after_turns: usize,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prompt_after_turns: 3,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Custom data directory. Defaults to ~/.local/share/advisorchat.
    pub data_dir: Option<String>,
    /// Write per-session transcripts under the data directory.
    pub transcripts: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            transcripts: true,
        }
    }
}

impl SessionConfig {
    /// Resolve the data directory, using the configured path or the XDG
    /// default.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(ref custom) = self.data_dir {
            return PathBuf::from(custom);
        }

        let base = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".local").join("share")
            });
        base.join("advisorchat")
    }
}

impl Config {
    pub fn load_or_default() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("warning: failed to parse {}: {e}", path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }
}

fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("advisorchat").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.api.base_url, "http://localhost:8000");
        assert_eq!(cfg.api.token_cmd, None);
        assert!(cfg.lead.enabled);
        assert_eq!(cfg.lead.prompt_after_turns, 3);
        assert!(cfg.session.transcripts);
    }

    #[test]
    fn parse_toml() {
        let toml_str = r#"
[api]
base_url = "https://api.studypath.example"
token_cmd = "pass show advisorchat"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.api.base_url, "https://api.studypath.example");
        assert_eq!(cfg.api.token_cmd.as_deref(), Some("pass show advisorchat"));
        // Unspecified sections fall back to defaults
        assert_eq!(cfg.lead.prompt_after_turns, 3);
    }

    #[test]
    fn parse_lead_config() {
        let toml_str = r#"
[lead]
enabled = false
prompt_after_turns = 5
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert!(!cfg.lead.enabled);
        assert_eq!(cfg.lead.prompt_after_turns, 5);
    }

    #[test]
    fn parse_session_config() {
        let toml_str = r#"
[session]
data_dir = "/tmp/advisorchat-test"
transcripts = false
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.session.data_dir.as_deref(), Some("/tmp/advisorchat-test"));
        assert!(!cfg.session.transcripts);
    }

    #[test]
    fn parse_empty_toml() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn custom_data_dir_wins() {
        let cfg = SessionConfig {
            data_dir: Some("/srv/chat".to_string()),
            transcripts: true,
        };
        assert_eq!(cfg.resolve_data_dir(), PathBuf::from("/srv/chat"));
    }

    #[test]
    fn resolve_token_from_cmd() {
        let cfg = ApiConfig {
            base_url: "http://localhost:8000".to_string(),
            token_cmd: Some("echo tok_test_123".to_string()),
        };
        assert_eq!(cfg.resolve_token().as_deref(), Some("tok_test_123"));
    }

    #[test]
    fn resolve_token_failing_cmd_falls_through() {
        let cfg = ApiConfig {
            base_url: "http://localhost:8000".to_string(),
            token_cmd: Some("false".to_string()),
        };
        // Command failed; result depends only on the env fallback
        let expected = std::env::var("ADVISORCHAT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        assert_eq!(cfg.resolve_token(), expected.map(|t| t.trim().to_string()));
    }
}
