use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};

use crate::cell::{column_name_to_number, column_number_to_name};

pub const CONFIG_FILE: &str = "fill_ids_config.txt";

/// 工作表布局：ID 列、四个触发列、表头行数（列号均为 1-based）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// None 表示工作簿的活动工作表
    pub sheet: Option<String>,
    pub id_column: u32,
    pub trigger_columns: [u32; 4],
    pub header_rows: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            sheet: None,
            id_column: 10,
            trigger_columns: [1, 2, 3, 4],
            header_rows: 1,
        }
    }
}

impl Layout {
    /// 读取 `fill_ids_config.txt`，文件不存在时使用默认布局。
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("无法读取配置文件: {}", config_path.display()))?;
        let layout = Self::parse(&content)
            .with_context(|| format!("配置文件格式错误: {}", config_path.display()))?;
        tracing::info!(path = %config_path.display(), ?layout, "loaded layout config");
        Ok(layout)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut layout = Self::default();

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| anyhow!("第 {line_no} 行缺少 '=': {line}"))?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "sheet" => {
                    layout.sheet = (!value.is_empty()).then(|| value.to_string());
                }
                "id_column" => {
                    layout.id_column = parse_column(value)
                        .with_context(|| format!("第 {line_no} 行 id_column 无效"))?;
                }
                "trigger_columns" => {
                    let columns = value
                        .split(',')
                        .map(parse_column)
                        .collect::<Result<Vec<_>>>()
                        .with_context(|| format!("第 {line_no} 行 trigger_columns 无效"))?;
                    layout.trigger_columns = columns.try_into().map_err(|v: Vec<u32>| {
                        anyhow!("第 {line_no} 行 trigger_columns 需要 4 列，实际 {} 列", v.len())
                    })?;
                }
                "header_rows" => {
                    let rows: u32 = value
                        .parse()
                        .with_context(|| format!("第 {line_no} 行 header_rows 不是整数: {value}"))?;
                    if rows == 0 {
                        bail!("第 {line_no} 行 header_rows 至少为 1");
                    }
                    layout.header_rows = rows;
                }
                other => bail!("第 {line_no} 行未知配置项: {other}"),
            }
        }

        if layout.trigger_columns.contains(&layout.id_column) {
            bail!(
                "ID 列 {} 不能同时作为触发列",
                column_number_to_name(layout.id_column)
            );
        }
        Ok(layout)
    }
}

fn parse_column(value: &str) -> Result<u32> {
    column_name_to_number(value).ok_or_else(|| anyhow!("不是有效的列名: {value:?}"))
}
