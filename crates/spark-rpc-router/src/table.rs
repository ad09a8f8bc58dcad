use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use spark_rpc_core::{Result, RouteFactory, ServiceRoute, ServiceRouteDescriptor};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::RoutingConfig;
use crate::diff::{ChangeDetection, RouteChanges, diff_routes};
use crate::events::{RouteListener, RouteListeners};

/// 路由快照：Id 唯一、按安装顺序排列的路由集合。
pub type RouteSnapshot = Arc<Vec<ServiceRoute>>;

/// 与快照一同原子替换的 `Id → 位置` 索引。
#[derive(Debug, Default)]
struct RouteCatalog {
    routes: RouteSnapshot,
    index: HashMap<String, usize>,
}

impl RouteCatalog {
    fn new(routes: Vec<ServiceRoute>) -> Self {
        let index = routes
            .iter()
            .enumerate()
            .map(|(position, route)| (route.id().to_owned(), position))
            .collect();
        Self {
            routes: Arc::new(routes),
            index,
        }
    }

    fn get(&self, id: &str) -> Option<&ServiceRoute> {
        self.index.get(id).map(|&position| &self.routes[position])
    }
}

/// 服务路由表：持有 `serviceId → ServiceRoute` 的权威映射。
///
/// # 行为概览（How）
/// 1. 当前快照连同 Id 索引放在 [`ArcSwap`] 中，[`Self::routes`] 与 [`Self::route`] 不加锁；
/// 2. 写路径（设置、合并、清空）由异步互斥锁串行化，差异计算不会交错；
/// 3. 每次写入先完成物化，再计算差异、派发通知，最后整表 `store` 新快照；
/// 4. 物化失败在第 1 步之前返回，既不派发通知也不改动快照。
///
/// # 使用契约（What）
/// - **并发读**：更新进行中读者只会看到完整的旧快照或完整的新快照；
/// - **通知时机**：订阅者在新快照安装前收到通知，通知批次与最终安装内容一致；
/// - **Id 唯一**：同一批输入里重复的 Id 以后出现者为准，位置保留首次出现处。
pub struct RouteTable {
    factory: Arc<dyn RouteFactory>,
    catalog: ArcSwap<RouteCatalog>,
    update_lock: Mutex<()>,
    listeners: RouteListeners,
    detection: ChangeDetection,
}

impl RouteTable {
    /// 以结构化变更检测构建空路由表。
    pub fn new(factory: Arc<dyn RouteFactory>) -> Self {
        Self::with_config(factory, RoutingConfig::default())
    }

    pub fn with_config(factory: Arc<dyn RouteFactory>, config: RoutingConfig) -> Self {
        Self {
            factory,
            catalog: ArcSwap::from_pointee(RouteCatalog::default()),
            update_lock: Mutex::new(()),
            listeners: RouteListeners::default(),
            detection: config.change_detection,
        }
    }

    pub fn change_detection(&self) -> ChangeDetection {
        self.detection
    }

    /// 当前快照，仅读内存。
    pub fn routes(&self) -> RouteSnapshot {
        Arc::clone(&self.catalog.load().routes)
    }

    /// 按 Id 查找当前路由。
    pub fn route(&self, id: &str) -> Option<ServiceRoute> {
        self.catalog.load().get(id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.load().routes.is_empty()
    }

    /// 注册变更订阅者。
    ///
    /// 只关心此后的变更时使用；需要“当前全量 + 后续增量”的订阅者应改用
    /// [`Self::subscribe_with_snapshot`]。
    pub fn subscribe(&self, listener: Arc<dyn RouteListener>) {
        self.listeners.add(listener);
    }

    /// 在写锁内注册订阅者并返回此刻的快照。
    ///
    /// 订阅与取快照之间不会插入任何更新：快照之后的每一次变更都会通知到 `listener`，
    /// 快照之前的变更都已体现在返回值中。
    ///
    /// 写路径在持锁期间同步派发通知，因此不要在 [`RouteListener`] 回调里同步等待本方法，
    /// 应把订阅放到单独的任务中。
    pub async fn subscribe_with_snapshot(&self, listener: Arc<dyn RouteListener>) -> RouteSnapshot {
        let _guard = self.update_lock.lock().await;
        self.listeners.add(listener);
        self.routes()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// 以后端存储读出的原始描述整体替换路由。
    pub async fn set_routes(&self, descriptors: Vec<ServiceRouteDescriptor>) -> Result<()> {
        let _guard = self.update_lock.lock().await;
        let materialized = self.factory.materialize(descriptors).await?;
        self.install_locked(dedup_by_id(materialized));
        Ok(())
    }

    /// 把 `routes` 合并进当前快照后整体安装，同 Id 以 `routes` 为准。
    pub async fn merge_routes(&self, routes: Vec<ServiceRoute>) -> Result<()> {
        let _guard = self.update_lock.lock().await;
        let mut merged: Vec<ServiceRoute> = self.routes().iter().cloned().collect();
        merged.extend(routes);
        self.install_locked(dedup_by_id(merged));
        Ok(())
    }

    /// 安装空快照；已为空时不做任何事。
    ///
    /// 被清掉的路由会以一批 `removed` 通知告知订阅者。
    pub async fn clear_routes(&self) {
        let _guard = self.update_lock.lock().await;
        let previous = self.routes();
        if previous.is_empty() {
            return;
        }
        let changes = RouteChanges {
            removed: previous.to_vec(),
            ..RouteChanges::default()
        };
        self.listeners.dispatch(&changes);
        self.catalog.store(Arc::new(RouteCatalog::default()));
        info!(removed = changes.removed.len(), "service routes cleared");
    }

    fn install_locked(&self, current: Vec<ServiceRoute>) {
        let previous = self.routes();
        let changes = diff_routes(&previous, &current, self.detection);
        debug!(
            routes = current.len(),
            created = changes.created.len(),
            removed = changes.removed.len(),
            changed = changes.changed.len(),
            "installing service routes"
        );
        self.listeners.dispatch(&changes);
        self.catalog.store(Arc::new(RouteCatalog::new(current)));
    }
}

/// 去重：后出现的同 Id 路由覆盖先前的值，位置保留首次出现处。
fn dedup_by_id(routes: Vec<ServiceRoute>) -> Vec<ServiceRoute> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(routes.len());
    let mut unique: Vec<ServiceRoute> = Vec::with_capacity(routes.len());
    for route in routes {
        match positions.get(route.id()) {
            Some(&index) => unique[index] = route,
            None => {
                positions.insert(route.id().to_owned(), unique.len());
                unique.push(route);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_rpc_core::{Address, ServiceDescriptor};

    fn route(id: &str, port: u16) -> ServiceRoute {
        ServiceRoute::new(ServiceDescriptor::new(id), [Address::ip("127.0.0.1", port)])
    }

    #[test]
    fn later_duplicate_overrides_in_first_position() {
        let unique = dedup_by_id(vec![route("a", 1), route("b", 2), route("a", 3)]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].id(), "a");
        assert_eq!(unique[0].addresses, vec![Address::ip("127.0.0.1", 3)]);
        assert_eq!(unique[1].id(), "b");
    }

    #[test]
    fn catalog_index_points_at_installed_positions() {
        let catalog = RouteCatalog::new(vec![route("a", 1), route("b", 2), route("c", 3)]);
        assert_eq!(catalog.get("b").map(|r| r.addresses.clone()), Some(vec![Address::ip("127.0.0.1", 2)]));
        assert_eq!(catalog.get("c").map(ServiceRoute::id), Some("c"));
        assert!(catalog.get("d").is_none());
        assert!(RouteCatalog::default().get("a").is_none());
    }
}
