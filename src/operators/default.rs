use super::{Crossover, Mutate, Refine};
use crate::config::GeneticConfig;
use crate::objectives::Objective;
use crate::representation::{Individual, Route};
use rand::Rng;
use rustc_hash::FxHashSet;

/// 2-opt 搜索中认为路径确实变短的最小改进量，单位为千米
const MIN_IMPROVEMENT: f64 = 1e-9;

/// 默认操作：有约束的顺序杂交、有约束的交换变异和 2-opt 局部搜索
#[derive(Debug, Clone)]
pub struct DefaultOperators {
    priority: Vec<usize>,
    crossover_rate: f64,
    mutation_rate: f64,
}

impl DefaultOperators {
    /// `priority` 是按优先级排好序的优先点下标
    pub fn new(priority: &[usize], config: &GeneticConfig) -> Self {
        Self {
            priority: priority.to_vec(),
            crossover_rate: config.crossover_rate,
            mutation_rate: config.mutation_rate,
        }
    }

    /// 对两个普通段做顺序杂交（OX）
    ///
    /// 先把第一个父代在 `[start, end]` 之间的片段原样复制到子代，再按第二个父代的顺序依次填入其余的点
    pub fn order_crossover<R: Rng>(first: &[usize], second: &[usize], rng: &mut R) -> Vec<usize> {
        let length = first.len();
        if length == 0 {
            return vec![];
        }
        let a = rng.random_range(0..length);
        let b = rng.random_range(0..length);
        let (start, end) = (a.min(b), a.max(b));
        let mut child: Vec<Option<usize>> = vec![None; length];
        for position in start..=end {
            child[position] = Some(first[position]);
        }
        let copied: FxHashSet<usize> = first[start..=end].iter().copied().collect();
        let mut cursor = 0;
        for &stop in second {
            if copied.contains(&stop) {
                continue;
            }
            while child[cursor].is_some() {
                cursor += 1;
            }
            child[cursor] = Some(stop);
        }
        child.into_iter().flatten().collect()
    }

    /// 翻转路径上 `[i, j]` 片段后总长度的变化量
    fn reversal_delta<O: Objective>(objective: &O, stops: &[usize], i: usize, j: usize) -> f64 {
        let n = stops.len();
        // 翻转整条回路不改变长度
        if i == 0 && j == n - 1 {
            return 0.0;
        }
        let before = stops[(i + n - 1) % n];
        let first = stops[i];
        let last = stops[j];
        let after = stops[(j + 1) % n];
        objective.distance(before, last) + objective.distance(first, after)
            - objective.distance(before, first)
            - objective.distance(last, after)
    }
}

impl Crossover for DefaultOperators {
    fn crossover<O: Objective, R: Rng>(
        &self,
        objective: &O,
        first: &Individual,
        second: &Individual,
        rng: &mut R,
    ) -> Individual {
        if !rng.random_bool(self.crossover_rate) {
            return if rng.random_bool(0.5) {
                first.clone()
            } else {
                second.clone()
            };
        }
        let regular = Self::order_crossover(
            first.route.regular_zone(),
            second.route.regular_zone(),
            rng,
        );
        Individual::evaluate(Route::new(&self.priority, regular), objective)
    }
}

impl Mutate for DefaultOperators {
    fn mutate<O: Objective, R: Rng>(
        &self,
        objective: &O,
        mut individual: Individual,
        rng: &mut R,
    ) -> Individual {
        if !rng.random_bool(self.mutation_rate) {
            return individual;
        }
        let length = individual.route.regular_zone().len();
        if length == 0 {
            return individual;
        }
        let first = rng.random_range(0..length);
        let second = rng.random_range(0..length);
        individual.route.swap_regular(first, second);
        Individual::evaluate(individual.route, objective)
    }
}

impl Refine for DefaultOperators {
    fn refine<O: Objective>(&self, objective: &O, individual: Individual) -> Individual {
        let Individual { mut route, fitness } = individual;
        let n = route.len();
        let offset = route.priority_len();
        let mut improved = false;
        let mut searching = true;
        while searching {
            searching = false;
            for i in offset..n.saturating_sub(1) {
                for j in (i + 2)..n {
                    let delta = Self::reversal_delta(objective, route.stops(), i, j);
                    if delta < -MIN_IMPROVEMENT {
                        route.reverse(i, j);
                        improved = true;
                        searching = true;
                    }
                }
            }
        }
        if improved {
            Individual::evaluate(route, objective)
        } else {
            Individual { route, fitness }
        }
    }
}
