use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use route::config::{Config, GeneticConfig, SolverConfig};
use route::data::{presets, read_waypoints, Waypoint};
use route::interfaces::channel::spawn_optimization;
use route::interfaces::command_line::{CommandLine, CommandLineArgs};
use route::objectives::default::haversine;
use route::objectives::Objective;
use route::operators::default::DefaultOperators;
use route::operators::{Crossover, Mutate, Refine};
use route::optimizers::genetic::Evolution;
use route::problem::RouteProblem;
use route::representation::{Individual, Route};
use route::{CancellationToken, Error, Interface, Message, Outcome, RouteOptimizer};
use std::cell::RefCell;

#[derive(Default)]
struct Recorder {
    messages: RefCell<Vec<Message>>,
}

impl Interface for Recorder {
    fn post(&self, message: Message) {
        self.messages.borrow_mut().push(message);
    }
}

impl Recorder {
    fn progress(&self) -> Vec<f64> {
        self.messages
            .borrow()
            .iter()
            .filter_map(|message| match message {
                Message::Progress { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect()
    }
}

/// 在第 `at` 代结束时请求取消
struct CancelAt {
    at: usize,
    token: CancellationToken,
}

impl Interface for CancelAt {
    fn post(&self, message: Message) {
        if let Message::Progress { generation, .. } = message {
            if generation == self.at {
                self.token.cancel();
            }
        }
    }
}

fn three_cities() -> Vec<Waypoint> {
    vec![
        Waypoint::new("Dhaka", 23.6850, 90.3563),
        Waypoint::new("Chittagong", 22.3569, 91.7832),
        Waypoint::new("Sylhet", 24.8949, 91.8687),
    ]
}

/// 六个城市，其中 Khulna 优先级 1，Sylhet 优先级 2
fn cities_with_priority() -> Vec<Waypoint> {
    presets()
        .into_iter()
        .map(|point| match point.name.as_str() {
            "Khulna" => point.with_priority(1),
            "Sylhet" => point.with_priority(2),
            _ => point,
        })
        .collect()
}

fn config(population_size: usize, generations: usize, seed: u64) -> GeneticConfig {
    GeneticConfig {
        population_size,
        generations,
        seed: Some(seed),
        ..Default::default()
    }
}

fn is_permutation(stops: &[usize], size: usize) -> bool {
    let mut sorted = stops.to_vec();
    sorted.sort_unstable();
    sorted == (0..size).collect::<Vec<_>>()
}

#[test]
fn distance_is_symmetric() {
    let points = presets();
    for a in &points {
        assert_eq!(haversine(a, a), 0.0);
        for b in &points {
            assert_eq!(haversine(a, b), haversine(b, a));
        }
    }
}

#[test]
fn distance_between_dhaka_and_chittagong() {
    let cities = three_cities();
    let distance = haversine(&cities[0], &cities[1]);
    assert!(distance > 200.0 && distance < 215.0, "{distance}");
}

#[test]
fn two_points_form_a_closed_circuit() {
    let points = three_cities()[..2].to_vec();
    let expected = 2.0 * haversine(&points[0], &points[1]);
    let optimizer = RouteOptimizer::new(points.clone(), config(10, 5, 1)).unwrap();
    let result = optimizer.optimize(&());
    assert_eq!(result.route.len(), 2);
    for point in &points {
        assert!(result.route.contains(point));
    }
    assert!((result.total_distance - expected).abs() < 1e-9);
}

#[test]
fn three_cities_scenario() {
    let points = three_cities();
    let optimizer = RouteOptimizer::new(points.clone(), config(20, 50, 7)).unwrap();
    let result = optimizer.optimize(&());
    assert_eq!(result.route.len(), 3);
    for point in &points {
        assert!(result.route.iter().any(|x| x.id == point.id));
    }
    assert!(result.total_distance > 0.0);
    assert!((result.fitness - 1.0 / (1.0 + result.total_distance)).abs() < 1e-12);
    assert!(result.fitness > 0.0 && result.fitness <= 1.0);
    assert_eq!(result.generation, 50);
    assert_eq!(result.outcome, Outcome::Completed);
}

#[test]
fn priority_points_are_sorted_by_rank() {
    let problem = RouteProblem::new(cities_with_priority()).unwrap();
    let waypoints = problem.waypoints();
    let names: Vec<_> = waypoints
        .priority()
        .iter()
        .map(|&index| waypoints.get(index).name.as_str())
        .collect();
    assert_eq!(names, ["Khulna", "Sylhet"]);
    assert_eq!(waypoints.regular().len(), 4);
}

#[test]
fn priority_prefix_holds_in_every_generation() {
    let problem = RouteProblem::new(cities_with_priority()).unwrap();
    let config = GeneticConfig {
        population_size: 30,
        generations: 40,
        mutation_rate: 0.5,
        local_search_rate: 0.5,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(42);
    let mut evolution = Evolution::new(&problem, &config, &mut rng);
    let priority = problem.waypoints().priority();
    let size = problem.waypoints().len();
    while !evolution.is_finished() {
        for individual in evolution.population() {
            assert_eq!(individual.route.priority_zone(), priority);
            assert!(is_permutation(individual.route.stops(), size));
        }
        evolution.step(&mut rng);
        assert_eq!(evolution.population().len(), 30);
    }
    assert_eq!(evolution.best().route.priority_zone(), priority);
}

#[test]
fn single_priority_point_stays_first() {
    let mut points = three_cities();
    points[2] = points[2].clone().with_priority(1);
    let sylhet = points[2].id.clone();
    for seed in 0..5 {
        let optimizer = RouteOptimizer::new(points.clone(), config(20, 30, seed)).unwrap();
        let result = optimizer.optimize(&());
        assert_eq!(result.route[0].id, sylhet);
    }
}

#[test]
fn best_fitness_never_regresses() {
    let problem = RouteProblem::new(presets()).unwrap();
    let config = config(20, 60, 3);
    let mut rng = StdRng::seed_from_u64(3);
    let mut evolution = Evolution::new(&problem, &config, &mut rng);
    let mut previous = evolution.best().fitness;
    while !evolution.is_finished() {
        evolution.step(&mut rng);
        let current = evolution.best().fitness;
        assert!(current >= previous);
        previous = current;
    }
}

#[test]
fn single_generation() {
    let optimizer = RouteOptimizer::new(presets(), config(10, 1, 0)).unwrap();
    let recorder = Recorder::default();
    let result = optimizer.optimize(&recorder);
    assert_eq!(result.generation, 1);
    assert_eq!(recorder.progress(), vec![100.0]);
}

#[test]
fn progress_is_monotonic_and_ends_at_100() {
    let optimizer = RouteOptimizer::new(presets(), config(10, 37, 5)).unwrap();
    let recorder = Recorder::default();
    optimizer.optimize(&recorder);
    let progress = recorder.progress();
    assert_eq!(progress.len(), 37);
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(progress.iter().all(|&value| (0.0..=100.0).contains(&value)));
    assert_eq!(progress.last(), Some(&100.0));
    let messages = recorder.messages.borrow();
    assert!(matches!(
        messages.last(),
        Some(Message::Finished {
            generation: 37,
            cancelled: false,
            ..
        })
    ));
}

#[test]
fn better_solutions_are_reported_in_decreasing_distance() {
    let optimizer = RouteOptimizer::new(presets(), config(10, 50, 11)).unwrap();
    let recorder = Recorder::default();
    let result = optimizer.optimize(&recorder);
    let distances: Vec<f64> = recorder
        .messages
        .borrow()
        .iter()
        .filter_map(|message| match message {
            Message::BetterSolution { distance, .. } => Some(*distance),
            _ => None,
        })
        .collect();
    assert!(distances.windows(2).all(|pair| pair[1] < pair[0]));
    if let Some(last) = distances.last() {
        assert!((last - result.total_distance).abs() < 1e-9);
    }
}

#[test]
fn same_seed_gives_same_result() {
    let points = cities_with_priority();
    let first = RouteOptimizer::new(points.clone(), config(20, 20, 9)).unwrap();
    let second = RouteOptimizer::new(points, config(20, 20, 9)).unwrap();
    let a = first.optimize(&());
    let b = second.optimize(&());
    assert_eq!(a.route, b.route);
    assert_eq!(a.total_distance, b.total_distance);
}

#[test]
fn rejects_insufficient_input() {
    let one = vec![Waypoint::new("Dhaka", 23.6850, 90.3563)];
    assert_eq!(
        RouteOptimizer::new(one, GeneticConfig::default()).unwrap_err(),
        Error::InsufficientInput { found: 1 }
    );
    assert_eq!(
        RouteOptimizer::new(vec![], GeneticConfig::default()).unwrap_err(),
        Error::InsufficientInput { found: 0 }
    );
}

#[test]
fn rejects_invalid_configuration() {
    let invalid = [
        GeneticConfig {
            population_size: 0,
            ..Default::default()
        },
        GeneticConfig {
            generations: 0,
            ..Default::default()
        },
        GeneticConfig {
            mutation_rate: 1.5,
            ..Default::default()
        },
        GeneticConfig {
            crossover_rate: -0.1,
            ..Default::default()
        },
        GeneticConfig {
            elitism_rate: 1.0,
            ..Default::default()
        },
        GeneticConfig {
            mutation_rate: f64::NAN,
            ..Default::default()
        },
    ];
    for config in invalid {
        let error = RouteOptimizer::new(presets(), config).unwrap_err();
        assert!(matches!(error, Error::InvalidConfiguration(_)), "{error}");
    }
}

#[test]
fn rejects_invalid_waypoints() {
    let mut duplicated = presets();
    duplicated[1].id = duplicated[0].id.clone();
    assert!(matches!(
        RouteProblem::new(duplicated),
        Err(Error::InvalidWaypoint(_))
    ));
    let mut out_of_range = presets();
    out_of_range[0].lat = 91.0;
    assert!(matches!(
        RouteProblem::new(out_of_range),
        Err(Error::InvalidWaypoint(_))
    ));
}

#[test]
fn coincident_points_are_valid() {
    let points = vec![
        Waypoint::new("A", 23.0, 90.0),
        Waypoint::new("B", 23.0, 90.0),
        Waypoint::new("C", 23.0, 90.0),
    ];
    let optimizer = RouteOptimizer::new(points, config(5, 5, 0)).unwrap();
    let result = optimizer.optimize(&());
    assert_eq!(result.total_distance, 0.0);
    assert_eq!(result.fitness, 1.0);
}

#[test]
fn all_priority_points_keep_their_order() {
    let points: Vec<_> = presets()
        .into_iter()
        .enumerate()
        .map(|(index, point)| point.with_priority(6 - index as u32))
        .collect();
    let optimizer = RouteOptimizer::new(points, config(10, 10, 0)).unwrap();
    let result = optimizer.optimize(&());
    let ranks: Vec<u32> = result.route.iter().map(|point| point.priority).collect();
    assert_eq!(ranks, [1, 2, 3, 4, 5, 6]);
}

#[test]
fn cancelled_before_start() {
    let optimizer = RouteOptimizer::new(presets(), config(10, 100, 0)).unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let mut rng = optimizer.make_rng();
    let result = optimizer.optimize_with(&mut rng, &(), &token);
    assert!(result.is_cancelled());
    assert_eq!(result.generation, 0);
    assert_eq!(result.route.len(), 6);
}

#[test]
fn cancelled_during_run() {
    let optimizer = RouteOptimizer::new(cities_with_priority(), config(10, 1000, 0)).unwrap();
    let token = CancellationToken::new();
    let interface = CancelAt {
        at: 5,
        token: token.clone(),
    };
    let mut rng = optimizer.make_rng();
    let result = optimizer.optimize_with(&mut rng, &interface, &token);
    assert_eq!(result.outcome, Outcome::Cancelled);
    assert_eq!(result.generation, 5);
    assert_eq!(result.route[0].name, "Khulna");
    assert_eq!(result.route[1].name, "Sylhet");

    // 被取消的运行不影响之后的运行
    let result = optimizer.optimize_with(&mut rng, &(), &CancellationToken::new());
    assert_eq!(result.outcome, Outcome::Completed);
    assert_eq!(result.generation, 1000);
}

#[test]
fn order_crossover_gives_permutation() {
    let mut rng = StdRng::seed_from_u64(0);
    let first: Vec<usize> = (0..10).collect();
    let second: Vec<usize> = (0..10).rev().collect();
    for _ in 0..100 {
        let child = DefaultOperators::order_crossover(&first, &second, &mut rng);
        assert!(is_permutation(&child, 10));
    }
    let same = DefaultOperators::order_crossover(&first, &first, &mut rng);
    assert_eq!(same, first);
    assert!(DefaultOperators::order_crossover(&[], &[], &mut rng).is_empty());
}

#[test]
fn mutation_leaves_priority_zone_alone() {
    let problem = RouteProblem::new(cities_with_priority()).unwrap();
    let config = GeneticConfig {
        mutation_rate: 1.0,
        ..Default::default()
    };
    let operators = DefaultOperators::new(problem.waypoints().priority(), &config);
    let objective = problem.objective();
    let mut rng = StdRng::seed_from_u64(0);
    let mut individual = Individual::evaluate(problem.initial_route(), objective);
    for _ in 0..200 {
        individual = operators.mutate(objective, individual, &mut rng);
        assert_eq!(individual.route.priority_zone(), problem.waypoints().priority());
        assert!(is_permutation(individual.route.stops(), 6));
        assert_eq!(individual.fitness, objective.fitness(&individual.route));
    }
}

#[test]
fn mutation_without_regular_points_is_noop() {
    let points: Vec<_> = three_cities()
        .into_iter()
        .enumerate()
        .map(|(index, point)| point.with_priority(index as u32 + 1))
        .collect();
    let problem = RouteProblem::new(points).unwrap();
    let config = GeneticConfig {
        mutation_rate: 1.0,
        ..Default::default()
    };
    let operators = DefaultOperators::new(problem.waypoints().priority(), &config);
    let individual = Individual::evaluate(problem.initial_route(), problem.objective());
    let mut rng = StdRng::seed_from_u64(0);
    let mutated = operators.mutate(problem.objective(), individual.clone(), &mut rng);
    assert_eq!(mutated, individual);
}

#[test]
fn two_opt_reaches_local_optimum() {
    let problem = RouteProblem::new(cities_with_priority()).unwrap();
    let operators = DefaultOperators::new(problem.waypoints().priority(), &GeneticConfig::default());
    let objective = problem.objective();
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..20 {
        let individual = Individual::evaluate(problem.random_route(&mut rng), objective);
        let before = objective.tour_length(&individual.route);
        let refined = operators.refine(objective, individual);
        let after = objective.tour_length(&refined.route);
        assert!(after <= before + 1e-9);
        assert_eq!(refined.route.priority_zone(), problem.waypoints().priority());
        assert_eq!(refined.fitness, objective.fitness(&refined.route));
        let n = refined.route.len();
        for i in refined.route.priority_len()..n - 1 {
            for j in (i + 2)..n {
                let mut candidate = refined.route.clone();
                candidate.reverse(i, j);
                assert!(objective.tour_length(&candidate) >= after - 1e-6);
            }
        }
    }
}

#[test]
fn elite_count_rounds_down() {
    let config = GeneticConfig {
        population_size: 25,
        elitism_rate: 0.1,
        ..Default::default()
    };
    assert_eq!(config.elite_count(), 2);
}

#[test]
fn reads_waypoints_from_csv() {
    let csv = "name,lat,lng,priority,id\n\
               Dhaka,23.6850,90.3563,,dhaka\n\
               Sylhet, 24.8949, 91.8687, 1, sylhet\n\
               Khulna,22.8456,89.5403,0,\n";
    let points = read_waypoints(csv.as_bytes()).unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].id, "dhaka");
    assert!(!points[0].is_priority);
    assert!(points[1].is_priority);
    assert_eq!(points[1].priority, 1);
    assert_eq!(points[1].lat, 24.8949);
    assert!(!points[2].is_priority);
    assert!(!points[2].id.is_empty());
}

#[test]
fn malformed_csv_is_an_input_error() {
    let csv = "name,lat,lng\nDhaka,north,90.0\n";
    assert!(matches!(read_waypoints(csv.as_bytes()), Err(Error::Input(_))));
}

#[test]
fn parses_config_file() {
    let yaml = r#"
info:
  name: 测试
optimization:
  algorithm: genetic
  population_size: 50
  generations: 20
  mutationRate: 0.1
points:
  - id: a
    name: A
    lat: 23.0
    lng: 90.0
  - id: b
    name: B
    lat: 24.0
    lng: 91.0
    priority: 1
    isPriority: true
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let genetic = config.genetic();
    assert_eq!(genetic.population_size, 50);
    assert_eq!(genetic.generations, 20);
    assert_eq!(genetic.mutation_rate, 0.1);
    assert_eq!(genetic.crossover_rate, 0.8);
    let points = config.points.unwrap();
    assert!(points[1].is_priority);
    assert!(!points[0].is_priority);

    let empty: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(empty.genetic(), GeneticConfig::default());
}

#[test]
fn options_accept_camel_case() {
    let options: GeneticConfig =
        serde_json::from_str(r#"{"populationSize": 30, "elitismRate": 0.2}"#).unwrap();
    assert_eq!(options.population_size, 30);
    assert_eq!(options.elitism_rate, 0.2);
    assert_eq!(options.generations, 500);
}

#[test]
fn export_uses_camel_case() {
    let optimizer = RouteOptimizer::new(cities_with_priority(), config(10, 5, 0)).unwrap();
    let result = optimizer.optimize(&());
    let export = serde_json::to_value(result.to_export()).unwrap();
    assert!(export["totalDistance"].as_f64().unwrap() > 0.0);
    assert_eq!(export["route"][0]["order"], 1);
    assert_eq!(export["route"][0]["name"], "Khulna");
    assert_eq!(export["route"][0]["isPriority"], true);
    let text = result.metric().to_string();
    assert!(text.starts_with("1. Khulna"));
    assert!(text.contains("总距离"));
}

#[test]
fn messages_are_tagged() {
    let message = Message::Progress {
        generation: 3,
        progress: 30.0,
        best_distance: 12.5,
    };
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["type"], "progress");
    assert_eq!(value["generation"], 3);
}

#[tokio::test]
async fn optimize_async_completes() {
    let optimizer = RouteOptimizer::new(presets(), config(10, 25, 0)).unwrap();
    let recorder = Recorder::default();
    let result = optimizer
        .optimize_async(&recorder, &CancellationToken::new())
        .await;
    assert_eq!(result.generation, 25);
    assert_eq!(recorder.progress().last(), Some(&100.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn spawned_optimization_reports_through_channel() {
    let optimizer = RouteOptimizer::new(presets(), config(10, 20, 0)).unwrap();
    let mut handle = spawn_optimization(optimizer);
    let mut messages = vec![];
    while let Some(message) = handle.messages.recv().await {
        messages.push(message);
    }
    let result = handle.task.await.unwrap();
    assert_eq!(result.outcome, Outcome::Completed);
    assert!(matches!(
        messages.last(),
        Some(Message::Finished {
            generation: 20,
            ..
        })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn spawned_optimization_can_be_cancelled() {
    let optimizer = RouteOptimizer::new(presets(), config(20, 1_000_000, 0)).unwrap();
    let mut handle = spawn_optimization(optimizer);
    while let Some(message) = handle.messages.recv().await {
        if matches!(message, Message::Progress { .. }) {
            handle.cancel();
            break;
        }
    }
    while handle.messages.recv().await.is_some() {}
    let result = handle.task.await.unwrap();
    assert!(result.is_cancelled());
    assert!(result.generation < 1_000_000);
    assert_eq!(result.route.len(), 6);
}

/// 子代能否由某个区间 `[start, end]` 按顺序杂交的规则得到
fn follows_order_crossover(first: &[usize], second: &[usize], child: &[usize]) -> bool {
    let length = first.len();
    (0..length).any(|start| {
        (start..length).any(|end| {
            if child[start..=end] != first[start..=end] {
                return false;
            }
            let segment = &first[start..=end];
            let rest: Vec<usize> = second
                .iter()
                .copied()
                .filter(|stop| !segment.contains(stop))
                .collect();
            let outside: Vec<usize> = child[..start]
                .iter()
                .chain(&child[end + 1..])
                .copied()
                .collect();
            outside == rest
        })
    })
}

#[test]
fn order_crossover_copies_segment_and_fills_in_second_order() {
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..300 {
        let mut first: Vec<usize> = (0..8).collect();
        let mut second = first.clone();
        first.shuffle(&mut rng);
        second.shuffle(&mut rng);
        let child = DefaultOperators::order_crossover(&first, &second, &mut rng);
        assert!(
            follows_order_crossover(&first, &second, &child),
            "{first:?} × {second:?} → {child:?}"
        );
    }
}

#[test]
fn skipped_crossover_clones_either_parent() {
    let problem = RouteProblem::new(cities_with_priority()).unwrap();
    let priority = problem.waypoints().priority();
    let config = GeneticConfig {
        crossover_rate: 0.0,
        ..Default::default()
    };
    let operators = DefaultOperators::new(priority, &config);
    let objective = problem.objective();
    let regular = problem.waypoints().regular();
    let first = Individual::evaluate(Route::new(priority, regular.iter().copied()), objective);
    let second = Individual::evaluate(Route::new(priority, regular.iter().rev().copied()), objective);
    assert_ne!(first, second);
    let mut rng = StdRng::seed_from_u64(4);
    let (mut from_first, mut from_second) = (0, 0);
    for _ in 0..1000 {
        let child = operators.crossover(objective, &first, &second, &mut rng);
        if child == first {
            from_first += 1;
        } else if child == second {
            from_second += 1;
        } else {
            panic!("子代不是父代的副本：{:?}", child.route);
        }
    }
    assert!(from_first > 400 && from_second > 400, "{from_first} / {from_second}");
}

#[test]
fn tournament_draws_with_replacement_and_keeps_first_of_ties() {
    let problem = RouteProblem::new(presets()).unwrap();
    let config = GeneticConfig {
        tournament_size: 5,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(8);
    let evolution = Evolution::new(&problem, &config, &mut rng);
    // 只有 4 个个体，其中三个适应度并列最高
    let population: Vec<Individual> = [0.2, 0.5, 0.5, 0.5]
        .into_iter()
        .enumerate()
        .map(|(index, fitness)| Individual {
            route: Route::new(&[], [index]),
            fitness,
        })
        .collect();
    for _ in 0..200 {
        let mut replay = rng.clone();
        let mut expected = replay.random_range(0..4);
        for _ in 1..5 {
            let candidate = replay.random_range(0..4);
            if population[candidate].fitness > population[expected].fitness {
                expected = candidate;
            }
        }
        let winner = evolution.select(&population, &mut rng);
        assert!(std::ptr::eq(winner, &population[expected]));
    }
}

#[test]
fn seed_offset_wraps_around() {
    let solver = SolverConfig::Genetic(GeneticConfig {
        seed: Some(u64::MAX),
        ..Default::default()
    });
    let SolverConfig::Genetic(config) = solver.for_run(2);
    assert_eq!(config.seed, Some(1));
    let SolverConfig::Genetic(config) = SolverConfig::default().for_run(3);
    assert_eq!(config.seed, None);
}

#[test]
fn solver_config_runs_the_same_optimization() {
    let genetic = config(20, 30, 13);
    let solver = SolverConfig::Genetic(genetic.clone());
    let problem = RouteProblem::new(cities_with_priority()).unwrap();
    let mut rng = solver.make_rng();
    let result = solver
        .solve(&problem, &mut rng, &(), &CancellationToken::new())
        .unwrap();
    let expected = RouteOptimizer::new(cities_with_priority(), genetic)
        .unwrap()
        .optimize(&());
    let ids = |route: &[Waypoint]| route.iter().map(|x| x.name.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&result.route[..]), ids(&expected.route[..]));
    assert_eq!(result.total_distance, expected.total_distance);

    let invalid = SolverConfig::Genetic(GeneticConfig {
        generations: 0,
        ..Default::default()
    });
    assert!(matches!(
        invalid.solve(&problem, &mut rng, &(), &CancellationToken::new()),
        Err(Error::InvalidConfiguration(_))
    ));
}

#[test]
fn unseeded_runs_draw_fresh_entropy() {
    let optimizer = RouteOptimizer::new(presets(), GeneticConfig {
        population_size: 10,
        generations: 5,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(optimizer.config().seed, None);
    assert_eq!(optimizer.problem().waypoints().len(), 6);
    let result = optimizer.optimize(&());
    assert_eq!(result.generation, 5);
}

#[test]
fn priority_flag_is_inferred_from_rank() {
    let points: Vec<Waypoint> = serde_json::from_str(
        r#"[
            { "name": "A", "lat": 23.0, "lng": 90.0, "priority": 2 },
            { "name": "B", "lat": 24.0, "lng": 91.0, "priority": 3, "isPriority": false },
            { "name": "C", "lat": 22.0, "lng": 89.0 }
        ]"#,
    )
    .unwrap();
    assert!(points[0].is_priority);
    assert!(!points[1].is_priority);
    assert!(!points[2].is_priority);
    assert!(points.iter().all(|point| !point.id.is_empty()));
    assert_ne!(points[0].id, points[2].id);

    let yaml = "- { id: a, name: A, lat: 23.0, lng: 90.0, priority: 1 }\n";
    let points: Vec<Waypoint> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(points[0].id, "a");
    assert!(points[0].is_priority);
}

#[test]
fn command_line_writes_progress_at_checkpoints() {
    let dir = std::env::temp_dir().join(format!("route-checkpoint-{}", std::process::id()));
    let args = CommandLineArgs::parse_from(["route", "config.yaml", "--threads", "2", "optimize"]);
    let cli = CommandLine::new(args, Some(dir.clone())).unwrap();
    let log = dir.join("log.txt");
    cli.post(Message::Progress {
        generation: 3,
        progress: 30.0,
        best_distance: 12.5,
    });
    assert!(!log.exists());
    cli.checkpoint();
    cli.checkpoint();
    let content = std::fs::read_to_string(&log).unwrap();
    assert_eq!(content.matches("第 3 代").count(), 1);
    cli.post(Message::Progress {
        generation: 4,
        progress: 40.0,
        best_distance: 12.0,
    });
    cli.post(Message::Finished {
        generation: 4,
        distance: 12.0,
        cancelled: false,
    });
    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.contains("第 4 代"));
    assert!(content.contains("优化已完成"));
    std::fs::remove_dir_all(dir).unwrap();
}
