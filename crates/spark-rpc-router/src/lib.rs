#![deny(unsafe_code)]

//! # spark-rpc-router
//!
//! ## 定位与职责（Why）
//! - 持有 `serviceId → ServiceRoute` 的权威映射，接受后端存储推送的整表替换；
//! - 每次替换前与旧快照求差，向订阅者发出 `created`/`removed`/`changed` 通知，
//!   地址解析器据此刷新缓存。
//!
//! ## 架构嵌入（Where）
//! - [`table`]：基于 `ArcSwap` 的路由表，读路径零锁、写路径整表替换；
//! - [`diff`]：纯函数形式的差异计算与变更检测策略；
//! - [`events`]：订阅者契约；
//! - [`factory`]：JSON 地址描述的默认路由工厂；
//! - [`resolver`]：订阅路由事件的轮询地址解析器；
//! - [`config`]：TOML 配置。

pub mod config;
pub mod diff;
pub mod events;
pub mod factory;
pub mod resolver;
pub mod table;

pub use config::RoutingConfig;
pub use diff::{ChangeDetection, RouteChanges, diff_routes};
pub use events::RouteListener;
pub use factory::JsonRouteFactory;
pub use resolver::RouteTableResolver;
pub use table::{RouteSnapshot, RouteTable};
