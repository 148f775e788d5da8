//! 质控参数.
//!
//! 所有过滤阈值都集中在 [`QcConfig`] 中, 并显式传给每个过滤规则.

use crate::consts::defaults;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// 配置加载或校验错误.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读配置文件失败.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML 解析失败.
    #[error("cannot parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// 占比类参数不在 \[0, 1\] 内.
    #[error("`{name}` must lie in [0, 1], got {value}")]
    FractionOutOfRange {
        /// 参数名.
        name: &'static str,
        /// 参数值.
        value: f64,
    },

    /// 强度门限不是有限值.
    #[error("`{name}` must be finite, got {value}")]
    NonFiniteThreshold {
        /// 参数名.
        name: &'static str,
        /// 参数值.
        value: f32,
    },
}

/// 质控参数.
///
/// 从 YAML 加载时所有字段都可省略, 省略的字段取 [`crate::consts::defaults`]
/// 中的默认值.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QcConfig {
    /// 饱和强度门限.
    pub saturation_threshold: f32,

    /// 饱和像素占比上限.
    pub saturation_frac_cutoff: f64,

    /// 细胞核最小面积 (像素数).
    pub nucleus_min_area: usize,

    /// 边缘缓冲宽度.
    pub border_buffer: usize,

    /// 用于强度判断的通道下标.
    pub channel: usize,

    /// 荧光强度门限.
    pub fluoro_threshold: f32,

    /// 荧光阳性像素占比下限.
    pub fluoro_frac_cutoff: f64,

    /// 是否启用荧光阳性保留过滤.
    pub filter_fluoro: bool,

    /// 定稿后是否额外写出 `{id}_mask.png` 预览图.
    pub write_preview: bool,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            saturation_threshold: defaults::SATURATION_THRESHOLD,
            saturation_frac_cutoff: defaults::SATURATION_FRAC_CUTOFF,
            nucleus_min_area: defaults::NUCLEUS_MIN_AREA,
            border_buffer: defaults::BORDER_BUFFER,
            channel: defaults::CHANNEL_OF_INTEREST,
            fluoro_threshold: defaults::FLUORO_THRESHOLD,
            fluoro_frac_cutoff: defaults::FLUORO_FRAC_CUTOFF,
            filter_fluoro: true,
            write_preview: false,
        }
    }
}

impl QcConfig {
    /// 从 YAML 文本解析并校验.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 YAML 文件加载并校验.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// 检查参数是否在合理范围内.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("saturation_frac_cutoff", self.saturation_frac_cutoff),
            ("fluoro_frac_cutoff", self.fluoro_frac_cutoff),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::FractionOutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("saturation_threshold", self.saturation_threshold),
            ("fluoro_threshold", self.fluoro_threshold),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteThreshold { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, QcConfig};

    #[test]
    fn test_empty_yaml_is_default() {
        let c = QcConfig::from_yaml_str("{}").unwrap();
        assert_eq!(c, QcConfig::default());
        assert_eq!(c.nucleus_min_area, 8000);
        assert_eq!(c.border_buffer, 10);
        assert_eq!(c.channel, 1);
        assert!(c.filter_fluoro);
    }

    #[test]
    fn test_partial_yaml() {
        let c = QcConfig::from_yaml_str("nucleus_min_area: 500\nfilter_fluoro: false\n").unwrap();
        assert_eq!(c.nucleus_min_area, 500);
        assert!(!c.filter_fluoro);
        assert_eq!(c.saturation_frac_cutoff, 0.05);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let e = QcConfig::from_yaml_str("nucleus_area: 500\n").unwrap_err();
        assert!(matches!(e, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_fraction_out_of_range() {
        let e = QcConfig::from_yaml_str("saturation_frac_cutoff: 1.5\n").unwrap_err();
        assert!(matches!(
            e,
            ConfigError::FractionOutOfRange {
                name: "saturation_frac_cutoff",
                ..
            }
        ));

        let c = QcConfig {
            fluoro_frac_cutoff: -0.1,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_non_finite_threshold() {
        let c = QcConfig {
            fluoro_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::NonFiniteThreshold {
                name: "fluoro_threshold",
                ..
            })
        ));
    }
}
