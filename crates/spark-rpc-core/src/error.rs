//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为路由表、调用管线与分发表提供统一的错误域，调用方可据此区分“请求从未离开进程”
//!   （参数校验、地址解析）与“已触达网络”（通信失败）两类失败；
//! - 每个变体都映射到稳定的错误码，便于日志检索与告警聚合。
//!
//! ## 设计要求（What）
//! - 所有错误均派生 [`thiserror::Error`]，可直接交给 `?` 传播；
//! - [`RpcError::is_communication`] 是调用管线判断“是否需要上报健康失败”的唯一依据。

use thiserror::Error;

/// 处理函数抛出的任意错误的装箱形态。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 以 [`RpcError`] 为默认错误类型的结果别名。
pub type Result<T, E = RpcError> = std::result::Result<T, E>;

/// 稳定错误码常量，写入日志与观测字段时使用。
pub mod codes {
    pub const INVALID_ARGUMENT: &str = "rpc.invalid_argument";
    pub const SERVICE_UNRESOLVED: &str = "rpc.service_unresolved";
    pub const COMMUNICATION_FAILURE: &str = "rpc.communication_failure";
    pub const MISSING_PARAMETER: &str = "rpc.missing_parameter";
    pub const PARAMETER_CONVERSION: &str = "rpc.parameter_conversion";
    pub const REMOTE_INVOCATION_FAILED: &str = "rpc.remote_invocation_failed";
    pub const CANCELLED: &str = "rpc.cancelled";
    pub const REMOTE: &str = "rpc.remote";
    pub const ROUTE_MATERIALIZATION: &str = "rpc.route_materialization";
    pub const DUPLICATE_SERVICE_ID: &str = "rpc.duplicate_service_id";
    pub const INVALID_ADDRESS: &str = "rpc.invalid_address";
    pub const CONFIGURATION: &str = "rpc.configuration";
    pub const TRANSPORT: &str = "rpc.transport";
}

/// 框架错误域。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - `InvalidArgument`/`ServiceUnresolved` 在任何网络 I/O 之前抛出；
///   - `CommunicationFailure` 由传输层产生，调用管线会据此上报健康失败后原样返回；
///   - `MissingParameter`/`ParameterConversion`/`RemoteInvocationFailed` 来自服务端参数绑定与执行；
///   - 其余变体覆盖路由物化、配置解析与注册冲突。
/// - **执行逻辑 (How)**：变体字段携带足以定位问题的上下文（参数名、期望/实际类型、解析键），
///   但不暴露分发表内部状态。
#[derive(Debug, Error)]
pub enum RpcError {
    /// 调用上下文不完整。
    #[error("invalid argument: `{field}` must be provided")]
    InvalidArgument { field: &'static str },

    /// 地址解析器未给出任何地址。
    #[error("no address could be resolved for service `{key}`")]
    ServiceUnresolved { key: String },

    /// 传输层报告的连通性错误。
    #[error("communication with `{endpoint}` failed: {detail}")]
    CommunicationFailure { endpoint: String, detail: String },

    /// 入站参数映射缺少必填参数。
    #[error("missing required parameter `{name}`")]
    MissingParameter { name: String },

    /// 参数值无法转换为声明类型。
    #[error("parameter `{name}` cannot be converted from {actual} to {expected}: {detail}")]
    ParameterConversion {
        name: String,
        expected: String,
        actual: String,
        detail: String,
    },

    /// 服务实现执行失败，`source` 保留原始错误。
    #[error("invocation of `{service_id}` failed: {source}")]
    RemoteInvocationFailed {
        service_id: String,
        #[source]
        source: BoxError,
    },

    /// 操作被取消。
    #[error("operation cancelled")]
    Cancelled,

    /// 远端在结果消息中回传了异常描述。
    #[error("remote service reported an error: {message}")]
    Remote { message: String },

    /// 原始路由描述无法物化。
    #[error("route materialization failed: {detail}")]
    RouteMaterialization { detail: String },

    /// 同一服务 Id 被注册了两次。
    #[error("service id `{id}` is registered more than once")]
    DuplicateServiceId { id: String },

    /// 地址无法转换为可连接端点。
    #[error("invalid address: {detail}")]
    InvalidAddress { detail: String },

    /// 配置文本无法解析。
    #[error("invalid configuration: {detail}")]
    Configuration { detail: String },

    /// 非连通性的传输层错误，例如编解码失败。
    #[error("transport error: {detail}")]
    Transport { detail: String },
}

impl RpcError {
    /// 构造通信失败错误。
    pub fn communication(endpoint: impl ToString, detail: impl Into<String>) -> Self {
        Self::CommunicationFailure {
            endpoint: endpoint.to_string(),
            detail: detail.into(),
        }
    }

    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            RpcError::InvalidArgument { .. } => codes::INVALID_ARGUMENT,
            RpcError::ServiceUnresolved { .. } => codes::SERVICE_UNRESOLVED,
            RpcError::CommunicationFailure { .. } => codes::COMMUNICATION_FAILURE,
            RpcError::MissingParameter { .. } => codes::MISSING_PARAMETER,
            RpcError::ParameterConversion { .. } => codes::PARAMETER_CONVERSION,
            RpcError::RemoteInvocationFailed { .. } => codes::REMOTE_INVOCATION_FAILED,
            RpcError::Cancelled => codes::CANCELLED,
            RpcError::Remote { .. } => codes::REMOTE,
            RpcError::RouteMaterialization { .. } => codes::ROUTE_MATERIALIZATION,
            RpcError::DuplicateServiceId { .. } => codes::DUPLICATE_SERVICE_ID,
            RpcError::InvalidAddress { .. } => codes::INVALID_ADDRESS,
            RpcError::Configuration { .. } => codes::CONFIGURATION,
            RpcError::Transport { .. } => codes::TRANSPORT,
        }
    }

    /// 是否属于通信层失败，即需要上报健康追踪的那一类。
    pub fn is_communication(&self) -> bool {
        matches!(self, RpcError::CommunicationFailure { .. })
    }

    /// 是否在触达网络之前就已失败。
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            RpcError::InvalidArgument { .. } | RpcError::ServiceUnresolved { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn communication_failure_is_the_only_health_relevant_kind() {
        let failure = RpcError::communication("127.0.0.1:9981", "connection refused");
        assert!(failure.is_communication());
        assert_eq!(failure.code(), codes::COMMUNICATION_FAILURE);

        let unresolved = RpcError::ServiceUnresolved { key: "svc".into() };
        assert!(!unresolved.is_communication());
        assert!(unresolved.is_local());
        assert!(!RpcError::Transport { detail: "codec".into() }.is_communication());
    }

    #[test]
    fn invocation_failure_keeps_the_original_error_as_source() {
        let original: BoxError = "boom".into();
        let err = RpcError::RemoteInvocationFailed {
            service_id: "users.get".into(),
            source: original,
        };
        let source = std::error::Error::source(&err).expect("source must be kept");
        assert_eq!(source.to_string(), "boom");
        assert!(err.to_string().contains("users.get"));
    }
}
