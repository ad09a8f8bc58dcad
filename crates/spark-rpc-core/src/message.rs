use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 具名参数映射：参数名 → 值。
pub type Parameters = BTreeMap<String, Value>;

/// 真正放到线上的调用载荷。
///
/// `service_id` 永远是通道无关的线上 Id，服务端分发表据此查找处理函数。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvokeMessage {
    pub service_id: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl InvokeMessage {
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            parameters: Parameters::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// 客户端发送前使用的路由限定消息。
///
/// # 契约说明（What）
/// - `local_service_id` 是解析键，可能形如 `channel/serviceId`；
/// - [`Self::resolution_key`] 在解析键非空时返回它，否则回退到线上 `service_id`；
/// - [`Self::into_wire`] 剥离解析键，得到交给传输层的 [`InvokeMessage`]。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScopedInvokeMessage {
    pub message: InvokeMessage,
    pub local_service_id: Option<String>,
}

impl ScopedInvokeMessage {
    pub fn new(message: InvokeMessage, local_service_id: Option<String>) -> Self {
        Self {
            message,
            local_service_id,
        }
    }

    pub fn service_id(&self) -> &str {
        &self.message.service_id
    }

    pub fn resolution_key(&self) -> &str {
        match self.local_service_id.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => &self.message.service_id,
        }
    }

    pub fn into_wire(self) -> InvokeMessage {
        self.message
    }
}

impl From<InvokeMessage> for ScopedInvokeMessage {
    fn from(message: InvokeMessage) -> Self {
        Self::new(message, None)
    }
}

/// 一次远程调用的上下文。
///
/// `message` 缺失时调用管线以 `InvalidArgument` 拒绝，不会触发任何解析或传输。
#[derive(Clone, Debug, Default)]
pub struct InvokeContext {
    pub message: Option<ScopedInvokeMessage>,
}

impl InvokeContext {
    pub fn new(message: impl Into<ScopedInvokeMessage>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// 远端返回的结果消息。
///
/// 服务端执行失败时 `exception_message` 携带描述，`result` 为空。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvokeResultMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
}

impl InvokeResultMessage {
    pub fn success(result: Value) -> Self {
        Self {
            result: Some(result),
            exception_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: None,
            exception_message: Some(message.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.exception_message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_key_prefers_non_empty_local_id() {
        let scoped = ScopedInvokeMessage::new(InvokeMessage::new("svc1"), Some("chA/svc1".into()));
        assert_eq!(scoped.resolution_key(), "chA/svc1");
        assert_eq!(scoped.into_wire().service_id, "svc1");

        let empty = ScopedInvokeMessage::new(InvokeMessage::new("svc1"), Some(String::new()));
        assert_eq!(empty.resolution_key(), "svc1");

        let plain = ScopedInvokeMessage::from(InvokeMessage::new("svc1"));
        assert_eq!(plain.resolution_key(), "svc1");
    }

    #[test]
    fn wire_message_serializes_without_resolution_key() {
        let scoped = ScopedInvokeMessage::new(
            InvokeMessage::new("svc1").with_parameter("p0", 5),
            Some("chA/svc1".into()),
        );
        let json = serde_json::to_string(&scoped.into_wire()).unwrap();
        assert!(!json.contains("chA"));
        assert!(json.contains("\"p0\":5"));
    }
}
