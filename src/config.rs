use crate::data::Waypoint;
use crate::Error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

/// 遗传算法的参数
///
/// 没有提供的字段使用默认值；同时接受 camelCase 写法，方便直接使用前端传来的对象
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    #[serde(alias = "populationSize")]
    pub population_size: usize,
    pub generations: usize,
    #[serde(alias = "mutationRate")]
    pub mutation_rate: f64,
    #[serde(alias = "elitismRate")]
    pub elitism_rate: f64,
    #[serde(alias = "crossoverRate")]
    pub crossover_rate: f64,
    /// 每一代的后代中做 2-opt 局部搜索的比例
    #[serde(alias = "localSearchRate")]
    pub local_search_rate: f64,
    #[serde(alias = "tournamentSize")]
    pub tournament_size: usize,
    /// 每隔多少代让出一次控制权
    #[serde(alias = "reportInterval")]
    pub report_interval: usize,
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 500,
            mutation_rate: 0.02,
            elitism_rate: 0.1,
            crossover_rate: 0.8,
            local_search_rate: 0.1,
            tournament_size: 5,
            report_interval: 10,
            seed: None,
        }
    }
}

impl GeneticConfig {
    /// 检查所有参数是否在取值范围内，不做任何截断
    pub fn validate(&self) -> Result<(), Error> {
        if self.population_size < 1 {
            return Err(Error::InvalidConfiguration(
                "population_size 至少为 1".to_string(),
            ));
        }
        if self.generations < 1 {
            return Err(Error::InvalidConfiguration(
                "generations 至少为 1".to_string(),
            ));
        }
        if self.tournament_size < 1 {
            return Err(Error::InvalidConfiguration(
                "tournament_size 至少为 1".to_string(),
            ));
        }
        if self.report_interval < 1 {
            return Err(Error::InvalidConfiguration(
                "report_interval 至少为 1".to_string(),
            ));
        }
        let rates = [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
            ("local_search_rate", self.local_search_rate),
        ];
        for (name, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} 应在 [0, 1] 之间，当前为 {rate}"
                )));
            }
        }
        if !(0.0..1.0).contains(&self.elitism_rate) {
            return Err(Error::InvalidConfiguration(format!(
                "elitism_rate 应在 [0, 1) 之间，当前为 {}",
                self.elitism_rate
            )));
        }
        Ok(())
    }

    /// 每一代直接保留的精英个体数
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elitism_rate).floor() as usize
    }

    /// 有随机种子时结果可以复现，否则每次使用新的随机源
    pub fn make_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum SolverConfig {
    Genetic(GeneticConfig),
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig::Genetic(GeneticConfig::default())
    }
}

impl SolverConfig {
    pub fn make_rng(&self) -> StdRng {
        match self {
            SolverConfig::Genetic(config) => config.make_rng(),
        }
    }

    /// 多线程运行时第 `index` 个线程使用的参数，种子依次错开
    pub fn for_run(&self, index: usize) -> SolverConfig {
        match self {
            SolverConfig::Genetic(config) => SolverConfig::Genetic(GeneticConfig {
                seed: config.seed.map(|seed| seed.wrapping_add(index as u64)),
                ..config.clone()
            }),
        }
    }
}

/// 配置文件
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub info: Option<BTreeMap<String, String>>,
    pub optimization: Option<SolverConfig>,
    /// 没有写 `is_priority` 的点由 `priority` 是否大于 0 决定
    pub points: Option<Vec<Waypoint>>,
}

impl Config {
    pub fn genetic(&self) -> GeneticConfig {
        match self.optimization.clone().unwrap_or_default() {
            SolverConfig::Genetic(genetic) => genetic,
        }
    }
}
