//! # 外部协作者契约
//!
//! 调用管线、路由表与分发表都只通过这里定义的窄接口访问外部世界：地址解析、传输客户端池、
//! 健康追踪、路由物化、类型转换与服务 Id 生成。实现方负责自身的并发控制，核心不替它们加锁。

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::address::Address;
use crate::convert::{ConversionError, ParameterType};
use crate::error::Result;
use crate::message::{InvokeMessage, InvokeResultMessage};
use crate::route::{ServiceRoute, ServiceRouteDescriptor};
use crate::signature::MethodSignature;

/// 按解析键查找一个可用地址。
///
/// # 契约说明（What）
/// - **输入**：`resolution_key` 可能是通道限定形式 `channel/serviceId`；
/// - **输出**：`Ok(None)` 表示当前没有地址，调用管线会转换为 `ServiceUnresolved`；
/// - **错误**：解析器自身故障以 `Err` 返回，调用管线记录日志后原样抛出。
///
/// # 风险提示（Trade-offs）
/// - 选择哪一个地址（轮询、随机、健康过滤）完全由实现决定，核心只要求“一个键解析出一个地址”。
#[async_trait]
pub trait AddressResolver: Send + Sync + 'static {
    async fn resolve(&self, resolution_key: &str) -> Result<Option<Address>>;
}

/// 单个端点上的传输客户端。
///
/// `send` 的通信层失败必须以 [`RpcError::CommunicationFailure`](crate::RpcError::CommunicationFailure)
/// 返回，调用管线据此触发健康上报。
#[async_trait]
pub trait TransportClient: Send + Sync + 'static {
    async fn send(&self, message: InvokeMessage) -> Result<InvokeResultMessage>;
}

/// 按端点获取传输客户端。
///
/// # 契约说明（What）
/// - 该调用被视为缓存查找而非建连：实现应按端点池化、复用客户端；
/// - 返回的 `Arc` 在调用结束（含取消）时被丢弃，即视为归还。
pub trait TransportClientFactory: Send + Sync + 'static {
    fn client_for(&self, endpoint: SocketAddr) -> Result<Arc<dyn TransportClient>>;
}

/// 健康追踪方的失败上报入口；判定算法不在本框架范围内。
#[async_trait]
pub trait HealthReporter: Send + Sync + 'static {
    async fn report_failure(&self, address: &Address) -> Result<()>;
}

/// 把后端存储读出的原始描述物化为路由。
///
/// 任一描述非法时整体失败，路由表不会安装部分快照。
#[async_trait]
pub trait RouteFactory: Send + Sync + 'static {
    async fn materialize(&self, descriptors: Vec<ServiceRouteDescriptor>) -> Result<Vec<ServiceRoute>>;
}

/// 把入站值转换为声明的参数类型。
pub trait TypeConverter: Send + Sync + 'static {
    fn convert(&self, value: Value, target: ParameterType) -> std::result::Result<Value, ConversionError>;
}

/// 为方法签名生成服务 Id；同一签名必须在进程重启后得到相同结果。
pub trait ServiceIdGenerator: Send + Sync + 'static {
    fn id_for(&self, method: &MethodSignature) -> String;
}
