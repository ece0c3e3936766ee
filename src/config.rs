use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    pub script: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("usage: loot_emptier <server-root> [replay-script.yaml]".to_string());
        }

        let root = Path::new(&args[1]).to_path_buf();
        let script = if args.len() > 2 {
            Some(PathBuf::from(&args[2]))
        } else {
            std::env::var("LOOT_EMPTIER_SCRIPT")
                .ok()
                .and_then(|value| {
                    let trimmed = value.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(PathBuf::from(trimmed))
                    }
                })
        };
        Ok(Self { root, script })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn root_is_required() {
        let err = AppConfig::from_args(&args(&["loot_emptier"])).unwrap_err();
        assert!(err.starts_with("usage:"));
    }

    #[test]
    fn explicit_script_argument() {
        let config = AppConfig::from_args(&args(&["loot_emptier", "/srv/game", "run.yaml"]))
            .expect("config");
        assert_eq!(config.root, PathBuf::from("/srv/game"));
        assert_eq!(config.script, Some(PathBuf::from("run.yaml")));
    }
}
