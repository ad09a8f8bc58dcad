//! 参数类型与默认类型转换服务。
//!
//! 服务端绑定参数时，入站值统一以 JSON 值表示，需要按方法签名声明的 [`ParameterType`]
//! 转换；转换策略由 [`TypeConverter`](crate::contract::TypeConverter) 决定，这里给出默认实现。

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::contract::TypeConverter;

/// 方法签名中声明的参数类型。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// 不做转换。
    Any,
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl ParameterType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterType::Any => "any",
            ParameterType::Bool => "bool",
            ParameterType::Integer => "integer",
            ParameterType::Float => "float",
            ParameterType::String => "string",
            ParameterType::Array => "array",
            ParameterType::Object => "object",
        }
    }

    /// 值是否已经是该类型。
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParameterType::Any => true,
            ParameterType::Bool => value.is_boolean(),
            ParameterType::Integer => value.is_i64() || value.is_u64(),
            ParameterType::Float => value.is_number(),
            ParameterType::String => value.is_string(),
            ParameterType::Array => value.is_array(),
            ParameterType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 返回 JSON 值的类型名，用于错误诊断。
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 类型转换失败。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionError {
    pub expected: ParameterType,
    pub actual: &'static str,
    pub detail: String,
}

impl ConversionError {
    fn new(expected: ParameterType, value: &Value, detail: impl Into<String>) -> Self {
        Self {
            expected,
            actual: value_kind(value),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot convert {} to {}: {}",
            self.actual, self.expected, self.detail
        )
    }
}

impl std::error::Error for ConversionError {}

/// 默认的 JSON 值转换器。
///
/// # 转换规则（How）
/// - 值已是目标类型时原样返回；
/// - 数字字符串解析为整数/浮点，`"true"`/`"false"` 解析为布尔；
/// - 数字、布尔渲染为字符串；整数扩宽为浮点，整值浮点收窄为整数；
/// - 其余组合（包括 `null` 到非 `Any` 类型）均失败。
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTypeConverter;

impl TypeConverter for DefaultTypeConverter {
    fn convert(&self, value: Value, target: ParameterType) -> Result<Value, ConversionError> {
        if target.accepts(&value) {
            return Ok(value);
        }
        match (target, &value) {
            (ParameterType::Integer, Value::String(text)) => {
                let trimmed = text.trim();
                if let Ok(v) = trimmed.parse::<i64>() {
                    Ok(Value::from(v))
                } else if let Ok(v) = trimmed.parse::<u64>() {
                    Ok(Value::from(v))
                } else {
                    Err(ConversionError::new(target, &value, format!("`{text}` is not an integer")))
                }
            }
            (ParameterType::Integer, Value::Number(n)) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => Err(ConversionError::new(target, &value, format!("{n} has a fractional part"))),
            },
            (ParameterType::Float, Value::String(text)) => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| ConversionError::new(target, &value, format!("`{text}` is not a number"))),
            (ParameterType::Bool, Value::String(text)) => match text.trim() {
                t if t.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                t if t.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                _ => Err(ConversionError::new(target, &value, format!("`{text}` is not a boolean"))),
            },
            (ParameterType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (ParameterType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            _ => Err(ConversionError::new(target, &value, "no conversion rule")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert(value: Value, target: ParameterType) -> Result<Value, ConversionError> {
        DefaultTypeConverter.convert(value, target)
    }

    #[test]
    fn matching_kind_is_identity() {
        assert_eq!(convert(json!(5), ParameterType::Integer).unwrap(), json!(5));
        assert_eq!(convert(json!({"a": 1}), ParameterType::Object).unwrap(), json!({"a": 1}));
        assert_eq!(convert(Value::Null, ParameterType::Any).unwrap(), Value::Null);
    }

    #[test]
    fn strings_parse_into_scalars() {
        assert_eq!(convert(json!(" 42 "), ParameterType::Integer).unwrap(), json!(42));
        assert_eq!(convert(json!("2.5"), ParameterType::Float).unwrap(), json!(2.5));
        assert_eq!(convert(json!("TRUE"), ParameterType::Bool).unwrap(), json!(true));
    }

    #[test]
    fn scalars_render_into_strings() {
        assert_eq!(convert(json!(7), ParameterType::String).unwrap(), json!("7"));
        assert_eq!(convert(json!(false), ParameterType::String).unwrap(), json!("false"));
    }

    #[test]
    fn integral_float_narrows() {
        assert_eq!(convert(json!(3.0), ParameterType::Integer).unwrap(), json!(3));
        let err = convert(json!(3.5), ParameterType::Integer).unwrap_err();
        assert_eq!(err.actual, "float");
    }

    #[test]
    fn incompatible_values_fail_with_both_kinds() {
        let err = convert(json!("abc"), ParameterType::Integer).unwrap_err();
        assert_eq!(err.expected, ParameterType::Integer);
        assert_eq!(err.actual, "string");

        let err = convert(Value::Null, ParameterType::String).unwrap_err();
        assert_eq!(err.actual, "null");
    }
}
