use std::collections::BTreeMap;

use serde_json::Value;

use crate::convert::ParameterType;

/// 参数的绑定方式。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// 按参数名从入站映射取值，并转换为声明类型。
    Value(ParameterType),
    /// 绑定为本次调用的取消令牌，不读取入站映射。
    Cancellation,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParameterInfo {
    pub name: String,
    pub kind: ParameterKind,
}

/// 显式注册的方法签名，取代运行时反射得到的方法信息。
///
/// # 契约说明（What）
/// - `service` 为服务接口名，`name` 为方法名；
/// - `parameters` 保持声明顺序，分发表按该顺序构造实参；
/// - `metadata` 会原样写入生成的服务描述。
#[derive(Clone, Debug, PartialEq)]
pub struct MethodSignature {
    pub service: String,
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
    pub metadata: BTreeMap<String, Value>,
}

impl MethodSignature {
    pub fn new(service: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
            parameters: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// 追加一个按名绑定的参数。
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: ParameterType) -> Self {
        self.parameters.push(ParameterInfo {
            name: name.into(),
            kind: ParameterKind::Value(ty),
        });
        self
    }

    /// 追加一个取消令牌参数。
    #[must_use]
    pub fn cancellation(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ParameterInfo {
            name: name.into(),
            kind: ParameterKind::Cancellation,
        });
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }
}
