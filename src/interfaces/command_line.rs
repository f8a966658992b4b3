use crate::config::{Config, SolverConfig};
use crate::data::{read_waypoints, Waypoint};
use crate::interfaces::{Interface, Message};
use crate::optimizers::OptimizationResult;
use crate::Error;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::fmt::Display;
use std::fs::{create_dir_all, read_to_string, write, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// 命令行参数的定义
#[derive(Parser, Clone)]
#[command(name = "带优先级约束的路径优化系统")]
#[command(author, version, about, long_about)]
#[command(propagate_version = true)]
pub struct CommandLineArgs {
    #[command(subcommand)]
    pub command: Command,
    /// 配置文件，默认为 config.yaml
    pub config: Option<PathBuf>,
    /// 坐标点表，CSV 格式，表头为 name,lat,lng,priority,id；默认使用配置文件中的坐标点，或者 points.csv
    #[arg(short, long, value_name = "FILE")]
    pub points: Option<PathBuf>,
    /// 线程数，默认为 1
    #[arg(short, long)]
    pub threads: Option<usize>,
    /// 随机种子，覆盖配置文件中的设置
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// 命令行中所有可用的子命令
#[derive(Subcommand, Clone)]
pub enum Command {
    /// 优化访问顺序，结果保存在输出目录中
    Optimize,
    /// 计算不经优化的路径长度（优先点在前，普通点按输入顺序）
    Evaluate,
    /// 列出内置的孟加拉国城市坐标
    Presets,
    /// 作为 HTTP 服务运行
    Serve {
        #[arg(long, default_value_t = 3200)]
        port: u16,
    },
}

impl CommandLineArgs {
    fn is_multithreaded(&self) -> bool {
        self.threads.is_some_and(|threads| threads > 1)
    }

    /// 读入配置文件和坐标点表
    ///
    /// 没有指定配置文件且 config.yaml 不存在时使用默认配置
    pub fn prepare_input(&self) -> Result<(SolverConfig, Vec<Waypoint>), Error> {
        let config: Config = match &self.config {
            Some(path) => serde_yaml::from_str(&read_to_string(path)?)?,
            None => {
                let path = PathBuf::from("config.yaml");
                if path.exists() {
                    serde_yaml::from_str(&read_to_string(path)?)?
                } else {
                    Config::default()
                }
            }
        };
        let mut solver = config.optimization.clone().unwrap_or_default();
        let SolverConfig::Genetic(genetic) = &mut solver;
        genetic.seed = self.seed.or(genetic.seed);
        let points = match (&self.points, config.points) {
            (Some(path), _) => read_waypoints(File::open(path)?)?,
            (None, Some(points)) => points,
            (None, None) => {
                let path = PathBuf::from("points.csv");
                if !path.exists() {
                    return Err("没有提供坐标点：请使用 --points 指定坐标点表，或者在配置文件中填写 points".into());
                }
                read_waypoints(File::open(path)?)?
            }
        };
        Ok((solver, points))
    }
}

/// 通过命令行来使用 libroute 的入口，实现了界面特征
///
/// 进度先暂存起来，到 checkpoint 时才写出，因此输出频率由 report_interval 决定
pub struct CommandLine {
    pub args: CommandLineArgs,
    pub output_dir: PathBuf,
    pending: RefCell<Option<String>>,
}

impl CommandLine {
    /// 没有指定输出目录时用当前时间戳生成一个
    pub fn new(args: CommandLineArgs, maybe_output_dir: Option<PathBuf>) -> Result<Self, Error> {
        let output_dir = maybe_output_dir.unwrap_or_else(|| {
            let time = Local::now().format("%m-%d+%H_%M_%S").to_string();
            PathBuf::from(format!("output-{time}"))
        });
        create_dir_all(&output_dir)?;
        Ok(Self {
            args,
            output_dir,
            pending: RefCell::new(None),
        })
    }

    pub fn make_child(&self, index: usize) -> Result<CommandLine, Error> {
        let child_dir = self.output_dir.join(format!("{index}"));
        CommandLine::new(self.args.clone(), Some(child_dir))
    }

    pub fn report_metric<M: Display>(metric: M) {
        print!("{metric}");
    }

    /// 保存 result.json 和 result.txt
    pub fn write_result(&self, result: &OptimizationResult) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(&result.to_export())?;
        write(self.output_dir.join("result.json"), json)?;
        write(self.output_dir.join("result.txt"), result.metric().to_string())?;
        println!(
            "优化结果保存在 {} 中",
            self.output_dir.join("result.json").display()
        );
        Ok(())
    }

    fn writer(&self) -> Result<Box<dyn Write>, Error> {
        if self.args.is_multithreaded() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.output_dir.join("log.txt"))?;
            Ok(Box::new(file))
        } else {
            Ok(Box::new(std::io::stdout()))
        }
    }
}

impl Interface for CommandLine {
    fn post(&self, message: Message) {
        let multithreaded = self.args.is_multithreaded();
        if let Message::Progress {
            generation,
            progress,
            best_distance,
        } = message
        {
            let line =
                format!("第 {generation} 代，进度 {progress:.1}%，当前最短 {best_distance:.3} km");
            *self.pending.borrow_mut() = Some(line);
            return;
        }
        if let Message::Finished { .. } = message {
            self.checkpoint();
        }
        let Ok(mut writer) = self.writer() else {
            return;
        };
        let result = match message {
            Message::Progress { .. } => Ok(()),
            Message::BetterSolution {
                generation,
                distance,
                ..
            } if multithreaded => writeln!(
                &mut writer,
                "{} 第 {generation} 代找到了更短的路径：{distance:.3} km",
                Local::now().format("%H:%M:%S")
            ),
            Message::BetterSolution { .. } => Ok(()),
            Message::Elapsed { time } => writeln!(&mut writer, "计算一代用时：{time} μs"),
            Message::Finished {
                generation,
                distance,
                cancelled,
            } => {
                let prefix = if multithreaded { "" } else { "\n" };
                let status = if cancelled { "已取消" } else { "已完成" };
                writeln!(
                    &mut writer,
                    "{prefix}优化{status}，共 {generation} 代，总距离 {distance:.3} km"
                )
            }
        };
        let _ = result;
    }

    /// 写出最近一次的进度：单线程时覆盖终端的同一行，多线程时追加到 log.txt
    fn checkpoint(&self) {
        let Some(line) = self.pending.borrow_mut().take() else {
            return;
        };
        let Ok(mut writer) = self.writer() else {
            return;
        };
        let result = if self.args.is_multithreaded() {
            writeln!(&mut writer, "{line}")
        } else {
            write!(&mut writer, "\r{line}").and_then(|_| writer.flush())
        };
        let _ = result;
    }
}
