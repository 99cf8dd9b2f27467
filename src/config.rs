use std::env;
use std::path::PathBuf;

/// Which remote mirror, if any, backs the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteConfig {
    /// PostgREST endpoint (Supabase-style) plus its API key.
    Rest { url: String, api_key: String },
    /// Direct Postgres connection.
    Postgres { database_url: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub data_dir: PathBuf,
    pub remote: Option<RemoteConfig>,
    pub remote_timeout_secs: u64,

    pub claude_api_key: String,
    pub claude_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".into())
                .into(),
            remote: remote_from_parts(
                non_empty("DATABASE_URL"),
                non_empty("SUPABASE_URL"),
                non_empty("SUPABASE_KEY"),
            ),
            remote_timeout_secs: env::var("REMOTE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),

            claude_api_key: env::var("CLAUDE_API_KEY").unwrap_or_else(|_| String::new()),
            claude_model: env::var("CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".into()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// A direct database URL wins; the REST mirror needs both endpoint and key.
/// Anything else means local-only mode.
fn remote_from_parts(
    database_url: Option<String>,
    rest_url: Option<String>,
    rest_key: Option<String>,
) -> Option<RemoteConfig> {
    if let Some(database_url) = database_url {
        return Some(RemoteConfig::Postgres { database_url });
    }
    match (rest_url, rest_key) {
        (Some(url), Some(api_key)) => Some(RemoteConfig::Rest {
            url: url.trim_end_matches('/').to_string(),
            api_key,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_absent_is_local_only() {
        assert_eq!(remote_from_parts(None, None, None), None);
    }

    #[test]
    fn test_rest_requires_both_values() {
        assert_eq!(
            remote_from_parts(None, Some("https://x.supabase.co".into()), None),
            None
        );
        assert_eq!(
            remote_from_parts(None, None, Some("key".into())),
            None
        );
    }

    #[test]
    fn test_rest_url_trailing_slash_trimmed() {
        let remote = remote_from_parts(None, Some("https://x.supabase.co/".into()), Some("k".into()));
        assert_eq!(
            remote,
            Some(RemoteConfig::Rest {
                url: "https://x.supabase.co".into(),
                api_key: "k".into(),
            })
        );
    }

    #[test]
    fn test_database_url_takes_precedence() {
        let remote = remote_from_parts(
            Some("postgres://localhost/habitflow".into()),
            Some("https://x.supabase.co".into()),
            Some("k".into()),
        );
        assert!(matches!(remote, Some(RemoteConfig::Postgres { .. })));
    }
}
