use std::path::PathBuf;

use maze_core::Viewport;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_JSON_LIMIT: usize = 1_048_576; // 1MB
pub const DEFAULT_VIEWPORT: Viewport = Viewport::new(500.0, 500.0);

/// Server settings, read from `MAZE_API_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: String,
    pub json_limit: usize,
    /// Viewport assumed when a selection request does not send one
    pub viewport: Viewport,
    /// When set, every generated maze is also written here as `maze_<n>.txt`
    pub save_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            json_limit: DEFAULT_JSON_LIMIT,
            viewport: DEFAULT_VIEWPORT,
            save_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(bind) = lookup("MAZE_API_BIND") {
            config.bind = bind;
        }
        if let Some(limit) = lookup("MAZE_API_JSON_LIMIT") {
            config.json_limit = limit
                .trim()
                .parse()
                .map_err(|_| format!("Invalid MAZE_API_JSON_LIMIT: '{}'", limit))?;
        }
        if let Some(viewport) = lookup("MAZE_API_VIEWPORT") {
            config.viewport = parse_viewport(&viewport)?;
        }
        config.save_dir = lookup("MAZE_API_SAVE_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

/// Parse `WIDTHxHEIGHT`, e.g. `500x500`.
pub fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let invalid = || format!("Invalid viewport: '{}'. Expected WIDTHxHEIGHT", s);

    let (width, height) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: f32 = width.trim().parse().map_err(|_| invalid())?;
    let height: f32 = height.trim().parse().map_err(|_| invalid())?;
    if !(width > 0.0 && height > 0.0) {
        return Err(invalid());
    }
    Ok(Viewport::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("MAZE_API_BIND", "127.0.0.1:9000"),
            ("MAZE_API_JSON_LIMIT", "2048"),
            ("MAZE_API_VIEWPORT", "800x600"),
            ("MAZE_API_SAVE_DIR", "generatedMazes"),
        ]))
        .unwrap();

        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.json_limit, 2048);
        assert_eq!(config.viewport, Viewport::new(800.0, 600.0));
        assert_eq!(config.save_dir, Some(PathBuf::from("generatedMazes")));
    }

    #[test]
    fn test_bad_values() {
        assert!(ServerConfig::from_lookup(lookup(&[("MAZE_API_JSON_LIMIT", "lots")])).is_err());
        assert!(parse_viewport("500").is_err());
        assert!(parse_viewport("0x500").is_err());
        assert!(parse_viewport("axb").is_err());
        assert_eq!(parse_viewport(" 640X480 "), Ok(Viewport::new(640.0, 480.0)));
    }
}
