use serde::{Deserialize, Serialize};

/// Options controlling a resolution run.
///
/// Serializable so build tooling can carry these in project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverOptions {
    /// Allow just-in-time bindings for concrete classes with an injectable
    /// constructor. When disabled, every key needs an explicit binding.
    pub allow_implicit: bool,
    /// Emit warnings for explicit bindings that are never reached from the
    /// injector's required keys.
    pub report_unused: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            allow_implicit: true,
            report_unused: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ResolverOptions::default();
        assert!(options.allow_implicit);
        assert!(!options.report_unused);
    }

    #[test]
    fn test_round_trip() {
        let options = ResolverOptions {
            allow_implicit: false,
            report_unused: true,
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: ResolverOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(options, back);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let options: ResolverOptions = serde_json::from_str(r#"{"report-unused": true}"#).unwrap();
        assert!(options.allow_implicit);
        assert!(options.report_unused);
    }
}
