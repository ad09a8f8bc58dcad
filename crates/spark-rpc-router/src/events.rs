use std::sync::Arc;

use parking_lot::RwLock;
use spark_rpc_core::ServiceRoute;

use crate::diff::RouteChanges;

/// 路由变更的订阅者，例如需要刷新缓存的地址解析器。
///
/// # 契约说明（What）
/// - 回调在路由表的更新锁内同步执行，此时新快照尚未安装；
/// - 回调不应阻塞或回调路由表的写方法，否则会与更新锁形成死锁；
/// - 三个方法均有空默认实现，订阅者只需覆盖关心的事件。
pub trait RouteListener: Send + Sync + 'static {
    /// 一批新出现的路由。
    fn on_created(&self, _routes: &[ServiceRoute]) {}

    /// 一批被删除的路由（旧快照中的对象）。
    fn on_removed(&self, _routes: &[ServiceRoute]) {}

    /// 同一 Id 的路由发生了变化。
    fn on_changed(&self, _current: &ServiceRoute, _previous: &ServiceRoute) {}
}

/// 订阅者列表；读多写少，使用读写锁保护。
#[derive(Default)]
pub(crate) struct RouteListeners {
    inner: RwLock<Vec<Arc<dyn RouteListener>>>,
}

impl RouteListeners {
    pub(crate) fn add(&self, listener: Arc<dyn RouteListener>) {
        self.inner.write().push(listener);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// 依次派发 `created`、`removed`、`changed`，空批次不派发。
    pub(crate) fn dispatch(&self, changes: &RouteChanges) {
        let listeners = self.inner.read().clone();
        for listener in &listeners {
            if !changes.created.is_empty() {
                listener.on_created(&changes.created);
            }
            if !changes.removed.is_empty() {
                listener.on_removed(&changes.removed);
            }
            for (current, previous) in &changes.changed {
                listener.on_changed(current, previous);
            }
        }
    }
}
