#![deny(unsafe_code)]
#![doc = r#"
# spark-rpc-core

## 定位（Why）
- 调用方以“逻辑服务 Id”而非网络地址发起远程调用；框架负责解析地址、交给传输层发送，
  并把通信失败回报给健康追踪方。
- 本 crate 只承载三个子系统共享的契约：数据模型、错误分类、取消令牌与外部协作者接口。
  路由表、客户端调用管线、服务端分发表分别位于 `spark-rpc-router`、`spark-rpc-client`、
  `spark-rpc-server`。

## 核心契约（What）
- [`ServiceRoute`] 描述“某个服务 Id 当前可在哪些 [`Address`] 上访问”；
- [`InvokeMessage`] 是真正上线的载荷，[`ScopedInvokeMessage`] 额外携带仅供解析使用的
  通道限定键，发送前必须剥离；
- [`RpcError`] 汇总全部失败语义，并暴露稳定错误码；
- [`contract`] 模块列出外部协作者：地址解析、传输客户端工厂、健康上报、路由工厂、类型转换、
  服务 Id 生成。
"#]

pub mod address;
pub mod cancellation;
pub mod channel;
pub mod contract;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod ids;
pub mod message;
pub mod route;
pub mod signature;

pub use address::{Address, AddressDescriptor, IpAddressModel};
pub use cancellation::Cancellation;
pub use channel::service_id_with_channel;
pub use contract::{
    AddressResolver, HealthReporter, RouteFactory, ServiceIdGenerator, TransportClient,
    TransportClientFactory, TypeConverter,
};
pub use convert::{ConversionError, DefaultTypeConverter, ParameterType};
pub use descriptor::ServiceDescriptor;
pub use error::{BoxError, Result, RpcError};
pub use ids::DefaultServiceIdGenerator;
pub use message::{InvokeContext, InvokeMessage, InvokeResultMessage, Parameters, ScopedInvokeMessage};
pub use route::{ServiceRoute, ServiceRouteDescriptor};
pub use signature::{MethodSignature, ParameterInfo, ParameterKind};

/// 协议中立的动态值类型；参数与结果均以 JSON 值形态流转。
pub use serde_json::Value;
