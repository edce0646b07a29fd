//! # Motion CLI
//!
//! 声明式动画指令的命令行工具。
//!
//! ## 用法
//!
//! ```bash
//! # 查看单条指令的编译结果
//! cargo run -p motion-cli -- compile "x-motion.in-view.duration.300ms" "{x: 100}"
//!
//! # 回放演示页面，输出引擎事件流
//! cargo run -p motion-cli -- run demos/pages/hero.json
//! cargo run -p motion-cli -- --verbose run demos/pages/hero.json
//! ```

mod config;
mod host;
mod page;
mod runner;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use config::{CliConfig, DEFAULT_CONFIG_PATH};
use page::Page;

#[derive(Parser)]
#[command(name = "motion")]
#[command(about = "声明式动画指令工具 - 编译指令、回放演示页面")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（不存在时使用默认配置）
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// 输出 debug 级别日志（覆盖配置文件）
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 编译一条指令属性，输出选项模板与诊断
    Compile {
        /// 属性名（如 `x-motion:card.in-view.opacity.0`）
        attribute: String,

        /// 属性值（表达式）
        #[arg(default_value = "")]
        expression: String,
    },

    /// 回放页面脚本，输出引擎事件流
    Run {
        /// 页面 JSON 文件
        page: PathBuf,

        /// 存在 Error 级别诊断时以非零状态退出
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(&cli.config)?;
    config.validate()?;

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.level()?
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if !cli.config.exists() {
        tracing::info!(path = %cli.config.display(), "配置文件不存在，使用默认配置");
    }

    match cli.command {
        Commands::Compile {
            attribute,
            expression,
        } => {
            let report = runner::compile_report(&attribute, &expression, &config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Run { page, strict } => run_page(&page, strict, &config)?,
    }

    Ok(())
}

fn run_page(path: &Path, strict: bool, config: &CliConfig) -> anyhow::Result<()> {
    let page = Page::load(path)?;
    tracing::info!(
        path = %path.display(),
        elements = page.elements.len(),
        steps = page.script.len(),
        "回放页面"
    );

    let report = runner::run_page(&page, config);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if strict && report.error_count > 0 {
        anyhow::bail!("页面产生了 {} 条错误诊断", report.error_count);
    }
    Ok(())
}
