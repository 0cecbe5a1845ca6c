// ABOUTME: Deployment stage enumeration, the unit of lock exclusivity.
// ABOUTME: Parses from CLI arguments and config keys in lowercase form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown stage '{0}' (expected development, staging or production)")]
pub struct ParseStageError(String);

/// A named deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Development,
    Staging,
    Production,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Development, Stage::Staging, Stage::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Development => "development",
            Stage::Staging => "staging",
            Stage::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Stage::Production)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Stage::Development),
            "staging" | "stage" => Ok(Stage::Staging),
            "production" | "prod" => Ok(Stage::Production),
            _ => Err(ParseStageError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_names_and_short_forms() {
        assert_eq!("staging".parse::<Stage>().unwrap(), Stage::Staging);
        assert_eq!("PROD".parse::<Stage>().unwrap(), Stage::Production);
        assert_eq!("dev".parse::<Stage>().unwrap(), Stage::Development);
    }

    #[test]
    fn rejects_unknown_stage() {
        let err = "qa".parse::<Stage>().unwrap_err();
        assert!(err.to_string().contains("qa"));
    }

    #[test]
    fn display_matches_serde_name() {
        for stage in Stage::ALL {
            let yaml = serde_yaml::to_string(&stage).unwrap();
            assert_eq!(yaml.trim(), stage.to_string());
        }
    }
}
