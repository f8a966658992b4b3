//! 遗传算法
//!
//! 一次优化依次经过这些状态：初始化（生成第 0 代种群）→ 评估（按适应度排序）→ 选择与繁殖（精英保留，其余位置由锦标赛选择、杂交、变异和局部搜索填满）→ 推进（更新历史最优）→ 回到评估，直到代数用完或者被取消。

use super::{CancellationToken, Metaheuristic, OptimizationResult, Outcome};
use crate::config::GeneticConfig;
use crate::interfaces::{Interface, Message};
use crate::objectives::Objective;
use crate::operators::default::DefaultOperators;
use crate::operators::{Crossover, Mutate, Refine};
use crate::problem::RouteProblem;
use crate::representation::Individual;
use crate::Error;
use rand::Rng;
use tracing::{debug, info};
use web_time::Instant;

#[derive(Debug, Clone)]
pub struct Genetic {
    config: GeneticConfig,
}

impl Genetic {
    /// 参数不合法时直接报错，因此创建出来的 Genetic 总是可以运行的
    pub fn new(config: GeneticConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    pub fn start<'a, R: Rng>(&'a self, problem: &'a RouteProblem, rng: &mut R) -> Evolution<'a> {
        let waypoints = problem.waypoints();
        info!(
            "开始优化：{} 个坐标点，其中 {} 个优先点，种群大小 {}，共 {} 代",
            waypoints.len(),
            waypoints.priority().len(),
            self.config.population_size,
            self.config.generations
        );
        Evolution::new(problem, &self.config, rng)
    }

    /// 和 solve 相同，但每隔 report_interval 代让出一次控制权
    pub async fn solve_async<R: Rng>(
        &self,
        problem: &RouteProblem,
        rng: &mut R,
        interface: &dyn Interface,
        cancellation: &CancellationToken,
    ) -> OptimizationResult {
        let mut evolution = self.start(problem, rng);
        while !evolution.is_finished() && !cancellation.is_cancelled() {
            self.advance(&mut evolution, rng, interface);
            if evolution.generation() % self.config.report_interval == 0 {
                interface.checkpoint();
                tokio::task::yield_now().await;
            }
        }
        self.finish(evolution, interface)
    }

    fn advance<R: Rng>(&self, evolution: &mut Evolution, rng: &mut R, interface: &dyn Interface) {
        let start = Instant::now();
        let improved = evolution.step(rng);
        let generation = evolution.generation();
        if generation == 1 {
            let time = start.elapsed().as_micros() as u64;
            interface.post(Message::Elapsed { time });
        }
        let best_distance = evolution.best_distance();
        if improved {
            debug!("第 {generation} 代找到了更短的路径：{best_distance:.3} km");
            interface.post(Message::BetterSolution {
                generation,
                distance: best_distance,
                fitness: evolution.best().fitness,
            });
        }
        interface.post(Message::Progress {
            generation,
            progress: evolution.progress(),
            best_distance,
        });
    }

    fn finish(&self, evolution: Evolution, interface: &dyn Interface) -> OptimizationResult {
        let outcome = if evolution.is_finished() {
            Outcome::Completed
        } else {
            info!("优化在第 {} 代被取消", evolution.generation());
            Outcome::Cancelled
        };
        let result = evolution.into_result(outcome);
        info!(
            "优化结束，共 {} 代，总距离 {:.3} km",
            result.generation, result.total_distance
        );
        interface.post(Message::Finished {
            generation: result.generation,
            distance: result.total_distance,
            cancelled: result.is_cancelled(),
        });
        result
    }
}

impl Metaheuristic for Genetic {
    fn solve<R: Rng>(
        &self,
        problem: &RouteProblem,
        rng: &mut R,
        interface: &dyn Interface,
        cancellation: &CancellationToken,
    ) -> OptimizationResult {
        let mut evolution = self.start(problem, rng);
        while !evolution.is_finished() && !cancellation.is_cancelled() {
            self.advance(&mut evolution, rng, interface);
            if evolution.generation() % self.config.report_interval == 0 {
                interface.checkpoint();
            }
        }
        self.finish(evolution, interface)
    }
}

/// 一次优化的全部可变状态，只属于这一次优化
pub struct Evolution<'a> {
    problem: &'a RouteProblem,
    config: &'a GeneticConfig,
    operators: DefaultOperators,
    population: Vec<Individual>,
    best: Individual,
    generation: usize,
}

/// 适应度最高的个体，并列时取最先出现的
fn fittest(population: &[Individual]) -> &Individual {
    population
        .iter()
        .skip(1)
        .fold(&population[0], |best, current| {
            if current.fitness > best.fitness {
                current
            } else {
                best
            }
        })
}

impl<'a> Evolution<'a> {
    pub fn new<R: Rng>(problem: &'a RouteProblem, config: &'a GeneticConfig, rng: &mut R) -> Self {
        let operators = DefaultOperators::new(problem.waypoints().priority(), config);
        let population: Vec<_> = (0..config.population_size)
            .map(|_| Individual::evaluate(problem.random_route(rng), problem.objective()))
            .collect();
        let best = fittest(&population).clone();
        Self {
            problem,
            config,
            operators,
            population,
            best,
            generation: 0,
        }
    }

    /// 已经完成的代数
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// 历史最优个体，不一定在当前种群中
    pub fn best(&self) -> &Individual {
        &self.best
    }

    pub fn best_distance(&self) -> f64 {
        self.problem.objective().tour_length(&self.best.route)
    }

    pub fn is_finished(&self) -> bool {
        self.generation >= self.config.generations
    }

    /// 完成百分比
    pub fn progress(&self) -> f64 {
        self.generation as f64 / self.config.generations as f64 * 100.0
    }

    /// 锦标赛选择：有放回地抽取 tournament_size 个个体，返回其中适应度最高的，并列时取最先抽到的
    pub fn select<'p, R: Rng>(&self, population: &'p [Individual], rng: &mut R) -> &'p Individual {
        let mut winner = &population[rng.random_range(0..population.len())];
        for _ in 1..self.config.tournament_size {
            let candidate = &population[rng.random_range(0..population.len())];
            if candidate.fitness > winner.fitness {
                winner = candidate;
            }
        }
        winner
    }

    /// 执行一代，返回历史最优是否被刷新
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> bool {
        let objective = self.problem.objective();
        let size = self.config.population_size;
        self.population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        let mut next: Vec<Individual> = Vec::with_capacity(size);
        next.extend_from_slice(&self.population[..self.config.elite_count()]);
        while next.len() < size {
            let first = self.select(&self.population, rng);
            let second = self.select(&self.population, rng);
            let mut child = self.operators.crossover(objective, first, second, rng);
            child = self.operators.mutate(objective, child, rng);
            if rng.random_bool(self.config.local_search_rate) {
                child = self.operators.refine(objective, child);
            }
            next.push(child);
        }
        self.population = next;
        self.generation += 1;
        let current = fittest(&self.population);
        if current.fitness > self.best.fitness {
            self.best = current.clone();
            true
        } else {
            false
        }
    }

    pub fn into_result(self, outcome: Outcome) -> OptimizationResult {
        let Individual { route, fitness } = self.best;
        OptimizationResult {
            route: self.problem.resolve(&route),
            total_distance: self.problem.objective().tour_length(&route),
            generation: self.generation,
            fitness,
            outcome,
        }
    }
}
