#![deny(unsafe_code)]

//! # spark-rpc-server
//!
//! ## 定位与职责（Why）
//! - 传输层监听器收到线上消息后，按服务 Id 找到对应的 [`ServiceEntry`] 并执行；
//! - 每个条目负责按名绑定参数、为本次调用创建独占实例、调用实现并包装失败。
//!
//! ## 架构嵌入（Where）
//! - [`registration`]：服务实现的显式注册（实例工厂 + 方法列表），取代运行时类型扫描；
//! - [`table`]：构建器与只读分发表，以及把失败折叠为结果消息的执行入口；
//! - [`entry`]：服务条目与按位置取值的实参；
//! - `binding`：参数绑定规则。

mod binding;
pub mod entry;
pub mod registration;
pub mod table;

pub use entry::{Arguments, Handler, ServiceEntry};
pub use registration::ServiceRegistration;
pub use table::{DispatchTable, DispatchTableBuilder};
