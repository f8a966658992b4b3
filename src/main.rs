//! route: 带优先级约束的路径优化系统［命令行版］
//!
//! `route` 是一个使用 Rust 编写的命令行程序。用户提供坐标点表以及配置文件，本程序能够计算路径长度，或者用遗传算法优化访问顺序，也可以作为 HTTP 服务运行。

use std::thread;

use clap::Parser;
use route::config::SolverConfig;
use route::data::{presets, Waypoint};
use route::interfaces::command_line::{Command, CommandLine, CommandLineArgs};
use route::problem::RouteProblem;
use route::server::start_server;
use route::{CancellationToken, Error, OptimizationResult};

fn run_optimization(
    points: Vec<Waypoint>,
    solver: SolverConfig,
    cli: &CommandLine,
) -> Result<OptimizationResult, Error> {
    let problem = RouteProblem::new(points)?;
    let mut rng = solver.make_rng();
    let result = solver.solve(&problem, &mut rng, cli, &CancellationToken::new())?;
    cli.write_result(&result)?;
    Ok(result)
}

fn main() -> Result<(), Error> {
    let _ = tracing_subscriber::fmt::try_init();
    let args = CommandLineArgs::parse();
    match args.command {
        Command::Presets => {
            for point in presets() {
                println!("{}\t{:.4}\t{:.4}", point.name, point.lat, point.lng);
            }
        }
        Command::Serve { port } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(start_server(port))?;
        }
        Command::Evaluate => {
            let (_, points) = args.prepare_input()?;
            let problem = RouteProblem::new(points)?;
            CommandLine::report_metric(problem.metric(&problem.initial_route()));
        }
        Command::Optimize => {
            let (solver, points) = args.prepare_input()?;
            let threads = args.threads.unwrap_or(1);
            let command_line = CommandLine::new(args.clone(), None)?;
            if threads <= 1 {
                let result = run_optimization(points, solver, &command_line)?;
                CommandLine::report_metric(result.metric());
            } else {
                let mut handles = vec![];
                for index in 0..threads {
                    let child = command_line.make_child(index)?;
                    let points = points.clone();
                    // 每个线程使用不同的种子，否则结果完全相同
                    let solver = solver.for_run(index);
                    let handle = thread::spawn(move || run_optimization(points, solver, &child));
                    handles.push(handle);
                }
                let mut results = vec![];
                for handle in handles {
                    let result = handle
                        .join()
                        .map_err(|_| Error::from("优化线程崩溃"))??;
                    results.push(result);
                }
                results.sort_by(|a, b| a.total_distance.total_cmp(&b.total_distance));
                for result in results {
                    CommandLine::report_metric(result.metric());
                }
            }
        }
    }
    Ok(())
}
