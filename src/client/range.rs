//! A1 记法的区域地址, 如 `'Reformatted'!A1:D`、`Sheet1!A:G`

/// 拼接区域地址, 页签名总是加引号 (名字里可能有空格)
pub fn a1(sheet: &str, cells: &str) -> String {
    format!("'{}'!{}", sheet.replace('\'', "''"), cells)
}

/// 解析后的区域, 行列均从 0 开始, 结束位置含边界
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: Option<String>,
    pub start_col: usize,
    pub start_row: usize,
    pub end_col: Option<usize>,
    pub end_row: Option<usize>,
}

impl A1Range {
    pub fn parse(range: &str) -> Option<Self> {
        let (sheet, cells) = match range.rsplit_once('!') {
            Some((sheet, cells)) => (Some(unquote(sheet)), cells),
            None => (None, range),
        };

        let (start, end) = match cells.split_once(':') {
            Some((s, e)) => (s, Some(e)),
            None => (cells, None),
        };

        let (start_col, start_row) = parse_cell(start)?;
        let start_col = start_col?;
        let start_row = start_row.unwrap_or(0);

        let (end_col, end_row) = match end {
            Some(e) => parse_cell(e)?,
            // 单个单元格作为写入起点, 不限制大小
            None => (None, None),
        };

        Some(Self {
            sheet,
            start_col,
            start_row,
            end_col,
            end_row,
        })
    }

    pub fn contains_col(&self, col: usize) -> bool {
        col >= self.start_col && self.end_col.map_or(true, |end| col <= end)
    }

    pub fn contains_row(&self, row: usize) -> bool {
        row >= self.start_row && self.end_row.map_or(true, |end| row <= end)
    }
}

/// 区域容纳不下 `rows` 行时把结束行向下延伸, 如 `A1:G1000` 写 1500 行 -> `A1:G1500`
pub fn fit_rows(cells: &str, rows: usize) -> String {
    let Some(area) = A1Range::parse(cells) else {
        return cells.to_string();
    };
    let (Some(end_row), Some((start, end))) = (area.end_row, cells.split_once(':')) else {
        return cells.to_string();
    };
    if end_row + 1 >= area.start_row + rows {
        return cells.to_string();
    }

    let end_col = end.trim_end_matches(|c: char| c.is_ascii_digit());
    format!("{}:{}{}", start, end_col, area.start_row + rows)
}

fn unquote(sheet: &str) -> String {
    match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => sheet.to_string(),
    }
}

/// "B12" -> (Some(1), Some(11)); "C" -> (Some(2), None); "7" -> (None, Some(6))
fn parse_cell(cell: &str) -> Option<(Option<usize>, Option<usize>)> {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];

    if letters.is_empty() && digits.is_empty() {
        return None;
    }

    let col = if letters.is_empty() {
        None
    } else {
        let mut n = 0usize;
        for c in letters.chars() {
            n = n * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
        }
        Some(n - 1)
    };

    let row = if digits.is_empty() {
        None
    } else {
        let n: usize = digits.parse().ok()?;
        if n == 0 {
            return None;
        }
        Some(n - 1)
    };

    Some((col, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_quotes_sheet_name() {
        assert_eq!(a1("copy of reformatted", "A:D"), "'copy of reformatted'!A:D");
        assert_eq!(a1("Bob's", "A1"), "'Bob''s'!A1");
    }

    #[test]
    fn test_parse_ranges() {
        let r = A1Range::parse("'copy of reformatted'!A:D").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("copy of reformatted"));
        assert_eq!((r.start_col, r.start_row, r.end_col, r.end_row), (0, 0, Some(3), None));

        let r = A1Range::parse("Sheet1!A1:G1000").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Sheet1"));
        assert_eq!((r.start_col, r.start_row, r.end_col, r.end_row), (0, 0, Some(6), Some(999)));

        let r = A1Range::parse("'Bob''s'!B2").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Bob's"));
        assert_eq!((r.start_col, r.start_row, r.end_col, r.end_row), (1, 1, None, None));

        let r = A1Range::parse("AA10:AB").unwrap();
        assert_eq!(r.sheet, None);
        assert_eq!((r.start_col, r.start_row, r.end_col), (26, 9, Some(27)));
    }

    #[test]
    fn test_fit_rows_grows_end_row_only() {
        assert_eq!(fit_rows("A1:G1000", 1000), "A1:G1000");
        assert_eq!(fit_rows("A1:G1000", 1001), "A1:G1001");
        assert_eq!(fit_rows("B3:H5", 4), "B3:H6");
        // 未限定结束行的区域本身就不限行数
        assert_eq!(fit_rows("A1:G", 5000), "A1:G");
        assert_eq!(fit_rows("A1", 5000), "A1");
    }

    #[test]
    fn test_parse_rejects_bad_ranges() {
        assert!(A1Range::parse("Sheet1!").is_none());
        assert!(A1Range::parse("Sheet1!A0").is_none());
        assert!(A1Range::parse("Sheet1!12:14").is_none());
    }
}
