use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::query::planner::distributed::rules::DEFAULT_MAX_ITERATION_ROUNDS;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub planner: PlannerConfig,
}

/// 日志配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
    pub file: String,
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "distplan".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 5,
        }
    }
}

/// 分布式计划重写配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlannerConfig {
    /// 要求不动点执行的节点规则最多执行的轮数
    pub max_iteration_rounds: usize,
    /// 是否并行处理各 agent 的 fragment
    pub parallel_fragments: bool,
    pub annotate_limits: bool,
    pub validate_udf_placement: bool,
    /// `AllAggregator` 执行者的 UDTF 是否直接报错
    pub strict_udtf_executor: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iteration_rounds: DEFAULT_MAX_ITERATION_ROUNDS,
            parallel_fragments: true,
            annotate_limits: true,
            validate_udf_placement: true,
            strict_udtf_executor: true,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.planner.max_iteration_rounds == 0 {
            return Err("planner.max_iteration_rounds 必须大于 0".into());
        }
        if self.log.max_files == 0 {
            return Err("log.max_files 必须大于 0".into());
        }
        Ok(())
    }
}
