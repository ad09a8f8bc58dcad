use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use spark_rpc_core::{Address, AddressResolver, Result, ServiceRoute};
use tracing::trace;

use crate::events::RouteListener;
use crate::table::RouteTable;

/// 由路由事件驱动的地址解析器。
///
/// # 教案式解读
/// - **作用域（Where）**：订阅 [`RouteTable`] 的变更通知，维护 `Id → 地址列表` 缓存，
///   供客户端调用管线作为 [`AddressResolver`] 使用；
/// - **实现策略（How）**：缓存放在 `DashMap` 中，每个 Id 带一个轮询游标，多次解析依次返回
///   列表中的地址；
/// - **契约（What）**：未知 Id 或地址列表为空时返回 `None`。
#[derive(Debug, Default)]
pub struct RouteTableResolver {
    cache: DashMap<String, CachedRoute>,
}

#[derive(Debug)]
struct CachedRoute {
    addresses: Arc<[Address]>,
    cursor: AtomicUsize,
}

impl CachedRoute {
    fn new(route: &ServiceRoute) -> Self {
        Self {
            addresses: Arc::from(route.addresses.as_slice()),
            cursor: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Option<Address> {
        if self.addresses.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.addresses.len();
        Some(self.addresses[index].clone())
    }
}

impl RouteTableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建解析器、订阅 `table`，并用订阅时刻的快照预热缓存。
    ///
    /// 订阅与取快照在路由表写锁内完成，并发更新要么已在快照里，要么随后以事件到达。
    pub async fn attach(table: &RouteTable) -> Arc<Self> {
        let resolver = Arc::new(Self::new());
        let snapshot = table.subscribe_with_snapshot(resolver.clone()).await;
        for route in snapshot.iter() {
            resolver.upsert(route);
        }
        resolver
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn upsert(&self, route: &ServiceRoute) {
        self.cache.insert(route.id().to_owned(), CachedRoute::new(route));
    }
}

impl RouteListener for RouteTableResolver {
    fn on_created(&self, routes: &[ServiceRoute]) {
        for route in routes {
            self.upsert(route);
        }
    }

    fn on_removed(&self, routes: &[ServiceRoute]) {
        for route in routes {
            self.cache.remove(route.id());
        }
    }

    fn on_changed(&self, current: &ServiceRoute, _previous: &ServiceRoute) {
        self.upsert(current);
    }
}

#[async_trait]
impl AddressResolver for RouteTableResolver {
    async fn resolve(&self, resolution_key: &str) -> Result<Option<Address>> {
        let address = self.cache.get(resolution_key).and_then(|entry| entry.next());
        trace!(resolution_key, resolved = address.is_some(), "address lookup");
        Ok(address)
    }
}
