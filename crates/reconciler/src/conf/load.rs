//! Load — config loading and validation (§6, §7 ConfigReloadError / MisconfigurationError).

use std::path::Path;
use thiserror::Error;

use super::model::Config;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("parsing config file {path}: {source}")]
    Parse { path: String, #[source] source: serde_yaml::Error },
    #[error("both swarm.networks and kubernetes.namespace are configured; exactly one discipline may be active")]
    BothDisciplinesConfigured,
}

impl Config {
    /// Read and parse the config file at `path`.
    ///
    /// Unlike the original source (`log.Panic` on any failure), a parse or
    /// read failure here is a plain `Err` — the caller is expected to log
    /// and keep the previously loaded config (§9 REDESIGN FLAGS).
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject structurally impossible configurations at load time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let swarm = !self.swarm.networks.is_empty();
        let kube = !self.kubernetes.namespace.is_empty();
        if swarm && kube {
            return Err(ConfigError::BothDisciplinesConfigured);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_minimal_swarm_config() {
        let f = write_temp(
            "checkintervall: 10\nswarm:\n  networks: [proxy]\ncmd:\n  processname: nginx\n",
        );
        let cfg = Config::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.check_interval_secs, 10);
        assert_eq!(cfg.swarm.networks, vec!["proxy".to_string()]);
    }

    #[test]
    fn rejects_both_disciplines() {
        let f = write_temp(
            "swarm:\n  networks: [proxy]\nkubernetes:\n  namespace: default\n",
        );
        let err = Config::load_from_file(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::BothDisciplinesConfigured));
    }

    #[test]
    fn missing_checkintervall_defaults_to_30() {
        let f = write_temp("swarm:\n  networks: [proxy]\n");
        let cfg = Config::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.check_interval_secs, 30);
    }

    #[test]
    fn parse_error_is_not_fatal() {
        let f = write_temp("not: [valid: yaml: at all");
        let err = Config::load_from_file(f.path());
        assert!(err.is_err());
    }
}
