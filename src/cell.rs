//! 单元格取值判断与列地址换算。

use calamine::Data;

/// 1 -> A, 26 -> Z, 27 -> AA ...
pub fn column_number_to_name(mut column: u32) -> String {
    let mut name = String::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    name
}

/// A -> 1, Z -> 26, AA -> 27。大小写不敏感，非字母返回 None。
pub fn column_name_to_number(name: &str) -> Option<u32> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let mut column: u32 = 0;
    for ch in name.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        column = column.checked_mul(26)?.checked_add(digit)?;
    }
    Some(column)
}

pub fn to_a1(col_1based: u32, row_1based: u32) -> String {
    format!("{}{}", column_number_to_name(col_1based), row_1based)
}

/// 触发列是否“有值”。空串、数值 0、false 视为空。
pub fn is_filled(cell: Option<&Data>) -> bool {
    match cell {
        None | Some(Data::Empty) => false,
        Some(Data::String(s)) => !s.is_empty(),
        Some(Data::Float(n)) => *n != 0.0,
        Some(Data::Int(n)) => *n != 0,
        Some(Data::Bool(b)) => *b,
        Some(_) => true,
    }
}

/// ID 列是否为空（含仅有空白字符的文本）。
pub fn is_blank(cell: Option<&Data>) -> bool {
    match cell {
        None | Some(Data::Empty) => true,
        Some(Data::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// 把单元格解析为非负整数 ID：纯数字文本，或非负整数值。
pub fn parse_identifier(cell: Option<&Data>) -> Option<u64> {
    match cell? {
        Data::String(s) => {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse().ok()
        }
        Data::Int(n) => u64::try_from(*n).ok(),
        Data::Float(n) => {
            if n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64 {
                Some(*n as u64)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// 用于日志和提示信息的单元格文本。
pub fn datatype_to_string(cell: Option<&Data>) -> String {
    match cell {
        None => String::new(),
        Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(n)) => {
            if n.fract() == 0.0 {
                format!("{:.0}", n)
            } else {
                n.to_string()
            }
        }
        Some(Data::Int(n)) => n.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(Data::Error(e)) => format!("{e:?}"),
        Some(other) => format!("{other:?}"),
    }
}
