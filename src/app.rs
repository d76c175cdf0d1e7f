//! 会话状态：选择文件 → 生成 ID → 选择导出位置 → 保存。

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assign;
use crate::config::Layout;
use crate::error::FillError;
use crate::workbook;

pub const RULES: &str = "\
仅对【从最后一条旧数据之后追加的新行】生成 ID
插入在中间的行不会生成 ID
满足 C+D 或 A+B+C+D 任一才写入 ID
新 ID 从已有最大 ID + 1 开始递增";

const SUPPORTED_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// 导出位置来源。返回 None 表示用户取消。
pub trait DestinationPrompt {
    fn ask(&mut self, source: &Path) -> anyhow::Result<Option<PathBuf>>;
}

/// 事先给定的导出位置（命令行第二个参数）。
impl DestinationPrompt for Option<PathBuf> {
    fn ask(&mut self, _source: &Path) -> anyhow::Result<Option<PathBuf>> {
        Ok(self.take())
    }
}

/// 从终端读取导出位置，直接回车即取消。
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> DestinationPrompt for LinePrompt<R, W> {
    fn ask(&mut self, source: &Path) -> anyhow::Result<Option<PathBuf>> {
        write!(
            self.output,
            "请输入导出文件路径（源文件: {}，直接回车取消）: ",
            source.display()
        )?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line).context("无法读取导出路径")?;
        let line = line.trim();
        Ok((!line.is_empty()).then(|| PathBuf::from(line)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Saved {
        path: PathBuf,
        filled: usize,
        first_id: Option<u64>,
    },
    SaveCancelled,
}

/// 没有扩展名时补上 `.xlsx`。
pub fn with_default_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("xlsx")
    }
}

/// 去掉拖拽路径两端的花括号（含空格的路径会被包成 `{...}`）。
pub fn normalize_dropped_path(raw: &str) -> PathBuf {
    PathBuf::from(raw.trim().trim_matches(|c| c == '{' || c == '}'))
}

/// 当前选中的文件与布局。
#[derive(Debug, Default)]
pub struct Session {
    layout: Layout,
    selected: Option<PathBuf>,
}

impl Session {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    /// 选择（或拖入）一个文件。失败时保留之前的选择。
    pub fn select(&mut self, raw: &str) -> Result<&Path, FillError> {
        let path = normalize_dropped_path(raw);
        if !path.is_file() {
            return Err(FillError::NotAFile(path));
        }
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(e))
            });
        if !supported {
            return Err(FillError::UnsupportedFile(path));
        }

        tracing::info!(path = %path.display(), "file selected");
        Ok(self.selected.insert(path).as_path())
    }

    /// 生成 ID 并导出。重复 ID 时不写任何文件；取消导出不算错误。
    pub fn process(&self, prompt: &mut dyn DestinationPrompt) -> Result<Outcome, FillError> {
        let input = self.selected.as_deref().ok_or(FillError::NoFileSelected)?;

        let sheet = workbook::load_sheet(input, &self.layout)?;
        let plan = assign::plan(&sheet.range, &self.layout)?;

        let Some(dest) = prompt.ask(input)? else {
            tracing::info!("export cancelled");
            return Ok(Outcome::SaveCancelled);
        };
        let dest = with_default_extension(dest);

        workbook::apply_ids_and_save(
            input,
            &sheet.name,
            self.layout.id_column,
            &plan.assignments,
            &dest,
        )?;

        Ok(Outcome::Saved {
            path: dest,
            filled: plan.assignments.len(),
            first_id: plan.assignments.first().map(|a| a.id),
        })
    }
}
