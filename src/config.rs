use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::reachability::ReachabilityConfig;
use crate::analysis::simulation::SimulationConfig;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct LabConfig {
    #[serde(default)]
    pub reachability: ReachabilityConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl LabConfig {
    /// 文件不存在时使用默认配置.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LabConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.reachability.max_markings >= 1,
            "reachability.max_markings must be at least 1"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::reachability::WideningPolicy;
    use crate::analysis::simulation::PolicyKind;

    #[test]
    fn empty_file_gives_defaults() {
        let config = LabConfig::from_toml_str("").unwrap();
        assert_eq!(config, LabConfig::default());
        assert_eq!(config.reachability.max_markings, 10);
        assert_eq!(config.simulation.max_steps, 10);
    }

    #[test]
    fn sections_override_defaults() {
        let config = LabConfig::from_toml_str(
            r#"
            [reachability]
            max_markings = 25
            widening = "recent-growth"

            [simulation]
            policy = { kind = "seeded-random", seed = 7 }
            "#,
        )
        .unwrap();

        assert_eq!(config.reachability.max_markings, 25);
        assert_eq!(config.reachability.widening, WideningPolicy::RecentGrowth);
        assert_eq!(config.simulation.max_steps, 10);
        assert_eq!(config.simulation.policy, PolicyKind::SeededRandom { seed: 7 });
    }

    #[test]
    fn zero_cap_is_rejected() {
        let err = LabConfig::from_toml_str("[reachability]\nmax_markings = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_markings"));
    }

    #[test]
    fn unknown_widening_is_rejected() {
        assert!(LabConfig::from_toml_str("[reachability]\nwidening = \"sometimes\"\n").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = LabConfig::load_from_file("/nonexistent/pn-lab.toml").unwrap();
        assert_eq!(config, LabConfig::default());
    }
}
