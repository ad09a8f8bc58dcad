use serde::{Deserialize, Serialize};
use spark_rpc_core::{Result, RpcError};

use crate::diff::ChangeDetection;

/// 路由表配置。
///
/// ```toml
/// change_detection = "structural"   # 或 "always"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    pub change_detection: ChangeDetection,
}

impl RoutingConfig {
    /// 从 TOML 文本解析。
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| RpcError::Configuration {
            detail: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_structural_detection() {
        assert_eq!(
            RoutingConfig::from_toml_str("").unwrap().change_detection,
            ChangeDetection::Structural
        );
    }

    #[test]
    fn parses_always_detection() {
        let config = RoutingConfig::from_toml_str("change_detection = \"always\"").unwrap();
        assert_eq!(config.change_detection, ChangeDetection::Always);
    }

    #[test]
    fn unknown_keys_are_configuration_errors() {
        let err = RoutingConfig::from_toml_str("detection = 1").unwrap_err();
        assert!(matches!(err, RpcError::Configuration { .. }));
    }
}
