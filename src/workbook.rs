use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::assign::Assignment;
use crate::cell::to_a1;
use crate::config::Layout;

/// 读取到内存中的工作表。
pub struct LoadedSheet {
    pub name: String,
    pub range: Range<Data>,
}

pub fn load_sheet(file_path: &Path, layout: &Layout) -> Result<LoadedSheet> {
    let mut workbook = open_workbook_auto(file_path)
        .with_context(|| format!("无法打开文件: {}", file_path.display()))?;

    let name = match &layout.sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|n| n == name) {
                return Err(anyhow!("找不到工作表: {name}"));
            }
            name.clone()
        }
        None => active_sheet_name(file_path)?,
    };

    let mut range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("无法读取工作表: {name}"))?;
    let formulas = workbook
        .worksheet_formula(&name)
        .with_context(|| format!("无法读取工作表公式: {name}"))?;
    overlay_formulas(&mut range, &formulas);

    tracing::info!(
        sheet = %name,
        size = ?range.get_size(),
        end = ?range.end(),
        "loaded worksheet"
    );
    Ok(LoadedSheet { name, range })
}

/// Excel 打开时显示的工作表。
fn active_sheet_name(file_path: &Path) -> Result<String> {
    let book = umya_spreadsheet::reader::xlsx::read(file_path)
        .with_context(|| format!("无法打开文件: {}", file_path.display()))?;
    Ok(book.get_active_sheet().get_name().to_string())
}

/// 公式单元格按公式文本（`=...`）参与判断，而不是缓存的计算结果：
/// 有值、非空白、也不是数字 ID。
pub fn overlay_formulas(range: &mut Range<Data>, formulas: &Range<String>) {
    let Some((start_row, start_col)) = formulas.start() else {
        return;
    };
    for (row, col, formula) in formulas.cells() {
        if formula.is_empty() {
            continue;
        }
        range.set_value(
            (start_row + row as u32, start_col + col as u32),
            Data::String(format!("={formula}")),
        );
    }
}

/// 在原工作簿上只改写 ID 列单元格，另存到 `output_path`。
pub fn apply_ids_and_save(
    file_path: &Path,
    sheet_name: &str,
    id_column: u32,
    assignments: &[Assignment],
    output_path: &Path,
) -> Result<()> {
    let mut book = umya_spreadsheet::reader::xlsx::read(file_path)
        .with_context(|| format!("无法打开文件(写入模式): {}", file_path.display()))?;

    let sheet = book
        .get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| anyhow!("找不到工作表: {sheet_name}"))?;

    // umya 的坐标是 1-based；ID 不超过 MAX_ID，转 f64 无损
    for assignment in assignments {
        let addr = to_a1(id_column, assignment.row + 1);
        sheet
            .get_cell_mut(addr.as_str())
            .set_value_number(assignment.id as f64);
    }

    umya_spreadsheet::writer::xlsx::write(&book, output_path)
        .with_context(|| format!("无法保存文件: {}", output_path.display()))?;

    tracing::info!(
        output = %output_path.display(),
        written = assignments.len(),
        "saved workbook"
    );
    Ok(())
}
