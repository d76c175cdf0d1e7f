use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FillError {
    #[error("Excel 中出现重复 ID：{}\n\n请修复后再导出，否则导入数据库会失败。", format_ids(.0))]
    DuplicateIds(BTreeSet<u64>),

    #[error("请先选择文件")]
    NoFileSelected,

    #[error("拖拽的不是文件: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("不支持的文件类型（仅支持 .xlsx / .xlsm）: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("处理失败")]
    Processing(#[from] anyhow::Error),
}

fn format_ids(ids: &BTreeSet<u64>) -> String {
    let joined = ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}
