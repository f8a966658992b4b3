//! 优化问题的整体定义。
//!
//! 一个问题由坐标点快照和目标函数组成。快照在创建时就固定下来，之后的每一次优化都只读取它。

use crate::data::{Waypoint, Waypoints};
use crate::objectives::default::TourObjective;
use crate::objectives::metric::RouteMetric;
use crate::objectives::Objective;
use crate::representation::Route;
use crate::Error;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct RouteProblem {
    waypoints: Waypoints,
    objective: TourObjective,
}

impl RouteProblem {
    /// 坐标点少于两个时直接报错
    pub fn new(points: Vec<Waypoint>) -> Result<Self, Error> {
        let waypoints = Waypoints::new(points)?;
        let objective = TourObjective::new(&waypoints);
        Ok(Self {
            waypoints,
            objective,
        })
    }

    pub fn waypoints(&self) -> &Waypoints {
        &self.waypoints
    }

    pub fn objective(&self) -> &TourObjective {
        &self.objective
    }

    /// 不经优化的路径：优先点在前，普通点保持输入顺序
    pub fn initial_route(&self) -> Route {
        Route::new(
            self.waypoints.priority(),
            self.waypoints.regular().iter().copied(),
        )
    }

    /// 随机生成一条合法路径：优先点在前，普通点随机打乱
    pub fn random_route<R: Rng>(&self, rng: &mut R) -> Route {
        let mut regular = self.waypoints.regular().to_vec();
        regular.shuffle(rng);
        Route::new(self.waypoints.priority(), regular)
    }

    /// 把路径还原为坐标点列表
    pub fn resolve(&self, route: &Route) -> Vec<Waypoint> {
        route
            .stops()
            .iter()
            .map(|&index| self.waypoints.get(index).clone())
            .collect()
    }

    pub fn metric(&self, route: &Route) -> RouteMetric {
        RouteMetric {
            stops: self.resolve(route),
            total_distance: self.objective.tour_length(route),
        }
    }
}
