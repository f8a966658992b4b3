//! 路径和个体的表示。
//!
//! 一条路径存放的是坐标点在快照中的下标。路径分为前后两段：前段是优先段，长度等于优先点个数，顺序永远固定；后段是普通段，可以任意排列。所有改动路径的方法都只作用于普通段，因此优先段的约束由类型本身保证，不需要调用者记住下标的偏移量。

use crate::objectives::Objective;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    stops: Vec<usize>,
    priority_len: usize,
}

impl Route {
    /// 用固定的优先段和一个普通段拼接出一条路径
    pub fn new(priority: &[usize], regular: impl IntoIterator<Item = usize>) -> Self {
        let mut stops = priority.to_vec();
        stops.extend(regular);
        Self {
            stops,
            priority_len: priority.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn stops(&self) -> &[usize] {
        &self.stops
    }

    pub fn priority_len(&self) -> usize {
        self.priority_len
    }

    pub fn priority_zone(&self) -> &[usize] {
        &self.stops[..self.priority_len]
    }

    pub fn regular_zone(&self) -> &[usize] {
        &self.stops[self.priority_len..]
    }

    /// 交换普通段中的两个位置，位置从普通段的开头算起
    pub fn swap_regular(&mut self, first: usize, second: usize) {
        let offset = self.priority_len;
        self.stops.swap(offset + first, offset + second);
    }

    /// 翻转 `[start, end]` 之间的片段，位置是整条路径中的绝对位置，且不能落在优先段内
    pub fn reverse(&mut self, start: usize, end: usize) {
        assert!(
            start >= self.priority_len && start <= end && end < self.stops.len(),
            "翻转区间 [{start}, {end}] 越界"
        );
        self.stops[start..=end].reverse();
    }
}

/// 个体：一条路径和它的适应度，适应度越高越好
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub route: Route,
    pub fitness: f64,
}

impl Individual {
    pub fn evaluate<O: Objective>(route: Route, objective: &O) -> Self {
        let fitness = objective.fitness(&route);
        Self { route, fitness }
    }
}
