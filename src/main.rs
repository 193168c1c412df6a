use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

// 导入库模块
use distplan::api::{PlanBundle, PlanOutput};
use distplan::config::Config;
use distplan::query::planner::DistributedRewriter;
use distplan::utils::logging;

#[derive(Parser)]
#[clap(version = "0.1.0", author = "DistPlan Contributors")]
enum Cli {
    /// Rewrite and validate a distributed plan bundle
    Check {
        /// Plan bundle (JSON)
        #[clap(short, long)]
        input: String,
        #[clap(short, long)]
        config: Option<String>,
        /// Write the rewritten plan here instead of stdout
        #[clap(short, long)]
        output: Option<String>,
    },
    /// Print the default configuration
    DefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli {
        Cli::Check {
            input,
            config,
            output,
        } => {
            let config = match config {
                Some(path) => Config::load(&path)
                    .map_err(|e| anyhow::anyhow!("加载配置 {} 失败: {}", path, e))?,
                None => Config::default(),
            };
            logging::init(&config.log).map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))?;

            let result = check(&input, output.as_deref(), &config);
            if let Err(e) = &result {
                log::error!("{:#}", e);
            }
            logging::shutdown();
            result?;
        }
        Cli::DefaultConfig => {
            print!("{}", toml::to_string_pretty(&Config::default())?);
        }
    }

    Ok(())
}

fn check(input: &str, output: Option<&str>, config: &Config) -> Result<()> {
    let bundle = PlanBundle::load(input).map_err(|e| anyhow::anyhow!("读取 {} 失败: {}", input, e))?;
    let mut plan = bundle.to_distributed_plan()?;

    let rewriter = DistributedRewriter::from_state(
        config.planner.clone(),
        Arc::new(bundle.registry),
        &bundle.state,
        &plan,
    )?;
    let summary = rewriter
        .rewrite(&mut plan)
        .context("分布式计划编译失败")?;

    let json = PlanOutput { summary, plan }.to_json()?;
    match output {
        Some(path) => fs::write(path, json).with_context(|| format!("写入 {} 失败", path))?,
        None => println!("{}", json),
    }
    Ok(())
}
