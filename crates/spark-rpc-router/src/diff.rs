//! 新旧路由集合的差异计算。
//!
//! 差异计算是纯函数，不触碰快照也不发通知；路由表在物化成功后调用它，
//! 再统一派发通知并安装新快照。

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use spark_rpc_core::ServiceRoute;

/// 保留下来的路由何时视为“已变更”。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDetection {
    /// 描述或地址序列逐字段比较不相等时才发出 `Changed`。
    #[default]
    Structural,
    /// 每次更新对所有保留的路由都发出 `Changed`。
    ///
    /// 新快照总是重新构造的对象，按对象身份比较时永远不相等，这一模式复现该行为。
    Always,
}

impl ChangeDetection {
    fn differs(self, current: &ServiceRoute, previous: &ServiceRoute) -> bool {
        match self {
            ChangeDetection::Structural => current != previous,
            ChangeDetection::Always => true,
        }
    }
}

/// 一次更新产生的全部变更。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteChanges {
    pub created: Vec<ServiceRoute>,
    pub removed: Vec<ServiceRoute>,
    /// `(当前路由, 旧路由)`。
    pub changed: Vec<(ServiceRoute, ServiceRoute)>,
}

impl RouteChanges {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// 计算 `previous` → `current` 的差异。
///
/// # 执行逻辑（How）
/// 1. 旧集合为空且新集合非空：新集合全部记为 `created`，不再比较；
/// 2. 否则按 Id 求出新增、删除与保留集合；
/// 3. 保留集合中每个 Id 在旧集合里也存在时，按 `detection` 比较新旧对象，不相等记为 `changed`。
///
/// 输出顺序跟随输入顺序：`created`/`changed` 按新集合，`removed` 按旧集合。
pub fn diff_routes(
    previous: &[ServiceRoute],
    current: &[ServiceRoute],
    detection: ChangeDetection,
) -> RouteChanges {
    if previous.is_empty() {
        return RouteChanges {
            created: current.to_vec(),
            ..RouteChanges::default()
        };
    }

    let previous_by_id: HashMap<&str, &ServiceRoute> =
        previous.iter().map(|route| (route.id(), route)).collect();
    let current_ids: HashSet<&str> = current.iter().map(ServiceRoute::id).collect();

    let mut changes = RouteChanges::default();
    for route in current {
        match previous_by_id.get(route.id()) {
            None => changes.created.push(route.clone()),
            Some(old) if detection.differs(route, old) => {
                changes.changed.push((route.clone(), (*old).clone()));
            }
            Some(_) => {}
        }
    }
    changes.removed = previous
        .iter()
        .filter(|route| !current_ids.contains(route.id()))
        .cloned()
        .collect();
    changes
}
