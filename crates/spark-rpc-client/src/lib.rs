#![deny(unsafe_code)]

//! # spark-rpc-client
//!
//! ## 定位与职责（Why）
//! - 把“服务 Id + 具名参数（可选通道）”形式的逻辑调用变成一次完成了地址解析、传输发送
//!   与失败上报的远程调用；
//! - 调用管线本身不持有跨调用状态，重试、熔断等弹性策略交给外部健康追踪与地址解析器。
//!
//! ## 架构嵌入（Where）
//! - [`invoker`]：调用管线，校验、解析、剥离通道、发送、上报；
//! - [`proxy`]：由方法名驱动的通用服务代理，负责通道限定与结果类型转换；
//! - [`registration`]：把静态配置的远程服务写入路由表；
//! - [`pool`]：按端点缓存传输客户端的工厂；
//! - [`config`]：TOML 客户端配置。

pub mod config;
pub mod invoker;
pub mod pool;
pub mod proxy;
pub mod registration;

pub use config::{ClientConfig, RemoteServiceConfig};
pub use invoker::RemoteInvoker;
pub use pool::PooledClientFactory;
pub use proxy::ServiceProxy;
pub use registration::{register_remote_services, remote_service_routes};
