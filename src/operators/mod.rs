//! 算子接口，以及默认操作的实现（包含杂交、变异和局部搜索算子）
//!
//! 所有算子都只改动路径的普通段，优先段保持不变。

use crate::objectives::Objective;
use crate::representation::Individual;
use rand::Rng;

pub mod default;

pub trait Crossover {
    /// 基于两个父代个体创建一个子代个体
    fn crossover<O: Objective, R: Rng>(
        &self,
        objective: &O,
        first: &Individual,
        second: &Individual,
        rng: &mut R,
    ) -> Individual;
}

pub trait Mutate {
    /// 基于现有的一个个体通过随机扰动创建一个新的个体
    fn mutate<O: Objective, R: Rng>(
        &self,
        objective: &O,
        individual: Individual,
        rng: &mut R,
    ) -> Individual;
}

pub trait Refine {
    /// 对一个个体做确定性的局部搜索，直到到达局部最优
    fn refine<O: Objective>(&self, objective: &O, individual: Individual) -> Individual;
}
