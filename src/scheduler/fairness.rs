//! Fairness discipline within a tier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the scheduler picks among eligible uploads of one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FairnessMode {
    /// Oldest eligible upload first, whoever it belongs to
    #[value(alias = "fifo")]
    StrictArrival,
    /// Peers take turns; the peer waiting longest since it was last served goes next
    #[default]
    RoundRobin,
}

impl fmt::Display for FairnessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FairnessMode::StrictArrival => write!(f, "strict-arrival"),
            FairnessMode::RoundRobin => write!(f, "round-robin"),
        }
    }
}

impl FromStr for FairnessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "strict-arrival" | "fifo" => Ok(FairnessMode::StrictArrival),
            "round-robin" => Ok(FairnessMode::RoundRobin),
            other => Err(format!("Unknown fairness mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_round_robin() {
        assert_eq!(FairnessMode::default(), FairnessMode::RoundRobin);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("fifo".parse::<FairnessMode>().unwrap(), FairnessMode::StrictArrival);
        assert_eq!("strict_arrival".parse::<FairnessMode>().unwrap(), FairnessMode::StrictArrival);
        assert_eq!("Round-Robin".parse::<FairnessMode>().unwrap(), FairnessMode::RoundRobin);
        assert!("lottery".parse::<FairnessMode>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for mode in [FairnessMode::StrictArrival, FairnessMode::RoundRobin] {
            assert_eq!(mode.to_string().parse::<FairnessMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_serde_names() {
        let mode: FairnessMode = serde_yaml::from_str("strict_arrival").unwrap();
        assert_eq!(mode, FairnessMode::StrictArrival);
        assert_eq!(serde_json::to_string(&FairnessMode::RoundRobin).unwrap(), "\"round_robin\"");
    }
}
