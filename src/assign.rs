//! 追加行 ID 分配：只读扫描，生成待写入的 ID 列表。
//!
//! 行列坐标一律使用 calamine 的绝对坐标（0-based），写入时再换成 1-based。

use std::collections::{BTreeSet, HashSet};

use anyhow::anyhow;
use calamine::{Data, Range};

use crate::cell::{datatype_to_string, is_blank, is_filled, parse_identifier};
use crate::config::Layout;
use crate::error::FillError;

/// 新 ID 以数值写入单元格，超过 2^53 - 1 后 f64 无法精确表示。
pub const MAX_ID: u64 = (1 << 53) - 1;

/// 已有的 ID 及其所在行。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingId {
    pub row: u32,
    pub id: u64,
}

/// 一个待写入的新 ID。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub row: u32,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPlan {
    /// 最后一个已有 ID 所在行；没有已有 ID 时为最后一个表头行
    pub boundary_row: u32,
    /// 最大 ID 已到 u64 上限时为 None
    pub first_new_id: Option<u64>,
    pub existing: Vec<ExistingId>,
    pub assignments: Vec<Assignment>,
}

impl IdPlan {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// C+D 或 A+B+C+D 满足其一即可写入 ID。
pub fn is_eligible([a, b, c, d]: [bool; 4]) -> bool {
    (c && d) || (a && b && c && d)
}

/// 收集 ID 列中的数字 ID（跳过表头），按行顺序返回。
pub fn scan_existing_ids(range: &Range<Data>, layout: &Layout) -> Vec<ExistingId> {
    let Some((last_row, _)) = range.end() else {
        return Vec::new();
    };
    let id_col = layout.id_column - 1;

    let mut existing = Vec::new();
    for row in layout.header_rows..=last_row {
        let cell = range.get_value((row, id_col));
        match parse_identifier(cell) {
            Some(id) => existing.push(ExistingId { row, id }),
            None if !is_blank(cell) => {
                tracing::debug!(
                    row = row + 1,
                    value = %datatype_to_string(cell),
                    "ignoring non-numeric identifier cell"
                );
            }
            None => {}
        }
    }
    existing
}

/// 出现两次及以上的 ID。
pub fn find_duplicates(existing: &[ExistingId]) -> BTreeSet<u64> {
    let mut seen = HashSet::new();
    existing
        .iter()
        .filter(|e| !seen.insert(e.id))
        .map(|e| e.id)
        .collect()
}

/// 最大 ID + 1；没有已有 ID 时从 1 开始。溢出时返回 None。
pub fn next_identifier(existing: &[ExistingId]) -> Option<u64> {
    existing
        .iter()
        .map(|e| e.id)
        .max()
        .map_or(Some(1), |max| max.checked_add(1))
}

fn out_of_range(row: u32) -> FillError {
    FillError::Processing(anyhow!(
        "ID 超出范围：第 {} 行需要的新 ID 超过 {MAX_ID}",
        row + 1
    ))
}

/// 计算整张表的 ID 分配。存在重复 ID 时返回错误，不产生任何分配。
pub fn plan(range: &Range<Data>, layout: &Layout) -> Result<IdPlan, FillError> {
    let existing = scan_existing_ids(range, layout);

    let duplicates = find_duplicates(&existing);
    if !duplicates.is_empty() {
        tracing::warn!(?duplicates, "duplicate identifiers found, aborting");
        return Err(FillError::DuplicateIds(duplicates));
    }

    let first_new_id = next_identifier(&existing);
    let boundary_row = existing
        .last()
        .map_or(layout.header_rows - 1, |e| e.row);

    let mut assignments = Vec::new();
    if let Some((last_row, _)) = range.end() {
        let id_col = layout.id_column - 1;
        let mut next_id = first_new_id;

        // 只处理最后一个旧 ID 之后追加的行
        for row in boundary_row + 1..=last_row {
            let flags = layout
                .trigger_columns
                .map(|col| is_filled(range.get_value((row, col - 1))));
            if is_eligible(flags) && is_blank(range.get_value((row, id_col))) {
                let id = next_id
                    .filter(|id| *id <= MAX_ID)
                    .ok_or_else(|| out_of_range(row))?;
                assignments.push(Assignment { row, id });
                next_id = id.checked_add(1);
            }
        }
    }

    tracing::info!(
        existing = existing.len(),
        boundary_row = boundary_row + 1,
        ?first_new_id,
        filled = assignments.len(),
        "planned identifier assignment"
    );

    Ok(IdPlan {
        boundary_row,
        first_new_id,
        existing,
        assignments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 按 (A1 风格的 1-based 行, 1-based 列, 值) 构造一张表
    fn sheet(last_row_1based: u32, cells: &[(u32, u32, Data)]) -> Range<Data> {
        let mut range = Range::new((0, 0), (last_row_1based - 1, 9));
        range.set_value((0, 0), Data::String("header".into()));
        for (row, col, value) in cells {
            range.set_value((row - 1, col - 1), value.clone());
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.into())
    }

    fn cd(row: u32) -> [(u32, u32, Data); 2] {
        [(row, 3, s("c")), (row, 4, s("d"))]
    }

    #[test]
    fn eligibility_rule() {
        assert!(is_eligible([false, false, true, true]));
        assert!(is_eligible([true, true, true, true]));
        assert!(is_eligible([true, false, true, true]));
        assert!(!is_eligible([true, true, true, false]));
        assert!(!is_eligible([true, true, false, true]));
        assert!(!is_eligible([false, false, false, false]));
    }

    #[test]
    fn fills_rows_after_last_identifier() {
        let mut cells = vec![(2, 10, Data::Float(5.0))];
        cells.extend(cd(2));
        cells.extend(cd(3));
        cells.extend(cd(4));
        let plan = plan(&sheet(4, &cells), &Layout::default()).unwrap();

        assert_eq!(plan.boundary_row, 1);
        assert_eq!(plan.first_new_id, Some(6));
        assert_eq!(
            plan.assignments,
            vec![Assignment { row: 2, id: 6 }, Assignment { row: 3, id: 7 }]
        );
    }

    #[test]
    fn duplicates_abort_with_full_set() {
        let cells = vec![
            (2, 10, Data::Float(3.0)),
            (3, 10, s("3")),
            (4, 10, Data::Float(8.0)),
            (5, 10, s("8")),
            (6, 10, s("1")),
            (7, 3, s("c")),
            (7, 4, s("d")),
        ];
        match plan(&sheet(7, &cells), &Layout::default()) {
            Err(FillError::DuplicateIds(ids)) => assert_eq!(ids, BTreeSet::from([3, 8])),
            other => panic!("expected duplicates, got {other:?}"),
        }
    }

    #[test]
    fn header_only_sheet_starts_at_one() {
        let plan = plan(&sheet(1, &[]), &Layout::default()).unwrap();
        assert_eq!(plan.first_new_id, Some(1));
        assert!(plan.is_empty());

        let plan = super::plan(&sheet(2, &cd(2)), &Layout::default()).unwrap();
        assert_eq!(plan.boundary_row, 0);
        assert_eq!(plan.assignments, vec![Assignment { row: 1, id: 1 }]);
    }

    #[test]
    fn empty_range_has_no_work() {
        let plan = plan(&Range::<Data>::empty(), &Layout::default()).unwrap();
        assert_eq!(plan.first_new_id, Some(1));
        assert!(plan.existing.is_empty());
        assert!(plan.is_empty());
    }

    #[test]
    fn rows_before_boundary_are_never_touched() {
        // 第 3 行满足条件且 ID 为空，但位于最后一个旧 ID（第 5 行）之前
        let mut cells = vec![(2, 10, s("1")), (5, 10, s("2"))];
        cells.extend(cd(3));
        cells.extend(cd(6));
        let plan = plan(&sheet(6, &cells), &Layout::default()).unwrap();

        assert_eq!(plan.boundary_row, 4);
        assert_eq!(plan.assignments, vec![Assignment { row: 5, id: 3 }]);
    }

    #[test]
    fn new_ids_follow_max_not_last() {
        let mut cells = vec![(2, 10, Data::Float(40.0)), (3, 10, Data::Float(7.0))];
        cells.extend(cd(4));
        let plan = plan(&sheet(4, &cells), &Layout::default()).unwrap();
        assert_eq!(plan.assignments, vec![Assignment { row: 3, id: 41 }]);
    }

    #[test]
    fn skips_ineligible_and_occupied_rows() {
        let cells = vec![
            (2, 10, s("1")),
            // 只有 A+B+C
            (3, 1, s("a")),
            (3, 2, s("b")),
            (3, 3, s("c")),
            // 满足条件但 ID 列已有文本
            (4, 3, s("c")),
            (4, 4, s("d")),
            (4, 10, s("待定")),
            // 满足条件，ID 列只有空白
            (5, 3, s("c")),
            (5, 4, s("d")),
            (5, 10, s("   ")),
            // A+B+C+D
            (6, 1, s("a")),
            (6, 2, s("b")),
            (6, 3, s("c")),
            (6, 4, Data::Float(1.0)),
            // D 为 0，视为空
            (7, 3, s("c")),
            (7, 4, Data::Float(0.0)),
        ];
        let plan = plan(&sheet(7, &cells), &Layout::default()).unwrap();
        assert_eq!(
            plan.assignments,
            vec![Assignment { row: 4, id: 2 }, Assignment { row: 5, id: 3 }]
        );
    }

    #[test]
    fn non_numeric_identifiers_do_not_move_boundary() {
        let mut cells = vec![(2, 10, s("9")), (3, 10, s("N/A"))];
        cells.extend(cd(3));
        cells.extend(cd(4));
        let plan = plan(&sheet(4, &cells), &Layout::default()).unwrap();
        assert_eq!(plan.boundary_row, 1);
        assert_eq!(plan.assignments, vec![Assignment { row: 3, id: 10 }]);
    }

    #[test]
    fn respects_custom_layout() {
        let layout = Layout {
            sheet: None,
            id_column: 6,
            trigger_columns: [1, 2, 7, 8],
            header_rows: 2,
        };
        let cells = vec![
            // 第 2 行是表头，不参与
            (2, 6, s("100")),
            (3, 7, s("g")),
            (3, 8, s("h")),
        ];
        let plan = plan(&sheet(3, &cells), &layout).unwrap();
        assert_eq!(plan.first_new_id, Some(1));
        assert_eq!(plan.assignments, vec![Assignment { row: 2, id: 1 }]);
    }

    #[test]
    fn huge_existing_id_is_rejected_not_wrapped() {
        let mut cells = vec![(2, 10, s("18446744073709551615"))];
        cells.extend(cd(3));
        let err = plan(&sheet(3, &cells), &Layout::default()).unwrap_err();
        assert!(matches!(err, FillError::Processing(_)), "{err:?}");
        assert_eq!(
            next_identifier(&[ExistingId {
                row: 1,
                id: u64::MAX
            }]),
            None
        );
    }

    #[test]
    fn new_ids_stay_exact_as_numbers() {
        let mut cells = vec![(2, 10, s(&(MAX_ID - 1).to_string()))];
        cells.extend(cd(3));
        cells.extend(cd(4));
        let err = plan(&sheet(4, &cells), &Layout::default()).unwrap_err();
        let msg = format!("{:#}", anyhow::Error::from(err));
        assert!(msg.contains("第 4 行"), "{msg}");

        // 最大 ID 太大但没有需要填写的行时不报错
        let cells = vec![(2, 10, s("18446744073709551615"))];
        let plan = plan(&sheet(2, &cells), &Layout::default()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.first_new_id, None);
    }
}
