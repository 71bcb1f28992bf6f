use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which operations a round draws from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    #[default]
    Addition,
    Subtraction,
    #[serde(alias = "both")]
    Mixed,
}

impl OperationMode {
    pub fn all() -> Vec<OperationMode> {
        vec![
            OperationMode::Addition,
            OperationMode::Subtraction,
            OperationMode::Mixed,
        ]
    }
}

impl Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationMode::Addition => write!(f, "addition"),
            OperationMode::Subtraction => write!(f, "subtraction"),
            OperationMode::Mixed => write!(f, "mixed"),
        }
    }
}

impl std::str::FromStr for OperationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "addition" | "add" | "+" => Ok(OperationMode::Addition),
            "subtraction" | "sub" | "-" => Ok(OperationMode::Subtraction),
            "mixed" | "both" | "+-" => Ok(OperationMode::Mixed),
            other => Err(format!(
                "unknown operation mode '{}', expected one of: {}",
                other,
                OperationMode::all().iter().join(", ")
            )),
        }
    }
}

/// The operation of a single problem.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
}

impl Operation {
    pub fn symbol(&self) -> char {
        match self {
            Operation::Addition => '+',
            Operation::Subtraction => '-',
        }
    }

    pub fn apply(&self, a: i32, b: i32) -> i32 {
        match self {
            Operation::Addition => a + b,
            Operation::Subtraction => a - b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_accepts_legacy_both() {
        let mode: OperationMode = serde_json::from_str("\"both\"").unwrap();
        assert_eq!(mode, OperationMode::Mixed);
        assert_eq!(serde_json::to_string(&mode).unwrap(), "\"mixed\"");
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Sub".parse::<OperationMode>(), Ok(OperationMode::Subtraction));
        assert_eq!(
            "multiply".parse::<OperationMode>(),
            Err("unknown operation mode 'multiply', expected one of: addition, subtraction, mixed"
                .to_string())
        );
        for mode in OperationMode::all() {
            assert_eq!(mode.to_string().parse::<OperationMode>(), Ok(mode));
        }
    }
}
