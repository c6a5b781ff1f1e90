// src/types.rs

use std::str::FromStr;

use serde::Deserialize;

/// Where the supervised processes' stdout/stderr end up.
///
/// - `Stdout` (default): forwarded to devloop's own stdout.
/// - `Stderr`: forwarded to devloop's stderr, next to the logs.
/// - `Discard`: dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    Stdout,
    Stderr,
    Discard,
}

impl Default for OutputTarget {
    fn default() -> Self {
        OutputTarget::Stdout
    }
}

impl FromStr for OutputTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" => Ok(OutputTarget::Stdout),
            "stderr" => Ok(OutputTarget::Stderr),
            "discard" | "none" => Ok(OutputTarget::Discard),
            other => Err(format!(
                "invalid output target: {other} (expected \"stdout\", \"stderr\" or \"discard\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_targets_case_insensitively() {
        assert_eq!("STDOUT".parse::<OutputTarget>(), Ok(OutputTarget::Stdout));
        assert_eq!(" stderr ".parse::<OutputTarget>(), Ok(OutputTarget::Stderr));
        assert_eq!("none".parse::<OutputTarget>(), Ok(OutputTarget::Discard));
    }

    #[test]
    fn rejects_unknown_target() {
        let err = "file".parse::<OutputTarget>().unwrap_err();
        assert!(err.contains("invalid output target"));
    }
}
