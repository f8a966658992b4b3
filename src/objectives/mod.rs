//! 目标函数接口，以及默认目标函数的实现
//!

use crate::representation::Route;
use itertools::Itertools;

pub mod default;
pub mod metric;

pub trait Objective {
    /// 从第 `from` 个坐标点到第 `to` 个坐标点的距离，单位为千米
    fn distance(&self, from: usize, to: usize) -> f64;

    /// 路径总长度。路径被看作一个闭合回路，最后一个点还要回到第一个点
    fn tour_length(&self, route: &Route) -> f64 {
        route
            .stops()
            .iter()
            .copied()
            .circular_tuple_windows()
            .map(|(from, to)| self.distance(from, to))
            .sum()
    }

    /// 适应度 = 1 / (1 + 路径总长度)，取值在 (0, 1] 之间
    fn fitness(&self, route: &Route) -> f64 {
        1.0 / (1.0 + self.tour_length(route))
    }
}
