use super::range::A1Range;
use super::sheets::SheetsApi;
use crate::error::SyncError;
use crate::models::{SheetProperties, SheetRow};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct MemorySheet {
    properties: SheetProperties,
    cells: Vec<SheetRow>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sheets: Vec<MemorySheet>,
    next_id: i64,
}

/// 内存电子表格, 行为尽量贴近 Sheets API (同名页签报错、读取时去掉尾部空单元格)
#[derive(Debug, Default)]
pub struct MemorySheets {
    state: Mutex<MemoryState>,
}

fn bad_request(message: impl Into<String>) -> SyncError {
    SyncError::Status {
        status: 400,
        body: message.into(),
    }
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个页签及其内容
    pub fn with_sheet(self, title: &str, rows: Vec<SheetRow>) -> Self {
        {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.sheets.push(MemorySheet {
                properties: SheetProperties {
                    sheet_id: id,
                    title: title.to_string(),
                },
                cells: rows,
            });
        }
        self
    }

    pub fn sheet_titles(&self) -> Vec<String> {
        self.lock()
            .sheets
            .iter()
            .map(|s| s.properties.title.clone())
            .collect()
    }

    /// 页签当前内容 (已去掉尾部空单元格/空行)
    pub fn rows(&self, title: &str) -> Option<Vec<SheetRow>> {
        self.lock()
            .sheets
            .iter()
            .find(|s| s.properties.title == title)
            .map(|s| trimmed(&s.cells))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // 测试替身: 锁中毒说明另一个测试线程已 panic
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn resolve<'a>(
        state: &'a mut MemoryState,
        range: &str,
    ) -> Result<(&'a mut MemorySheet, A1Range), SyncError> {
        let parsed = A1Range::parse(range)
            .ok_or_else(|| bad_request(format!("Unable to parse range: {}", range)))?;
        let sheet = match &parsed.sheet {
            Some(title) => state.sheets.iter_mut().find(|s| &s.properties.title == title),
            None => state.sheets.first_mut(),
        }
        .ok_or_else(|| bad_request(format!("Unable to parse range: {}", range)))?;
        Ok((sheet, parsed))
    }
}

fn trimmed(cells: &[SheetRow]) -> Vec<SheetRow> {
    let mut rows: Vec<SheetRow> = cells
        .iter()
        .map(|row| {
            let len = row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
            row[..len].to_vec()
        })
        .collect();
    while rows.last().map_or(false, |r| r.is_empty()) {
        rows.pop();
    }
    rows
}

#[async_trait]
impl SheetsApi for MemorySheets {
    async fn get_range(&self, range: &str) -> Result<Vec<SheetRow>, SyncError> {
        let mut state = self.lock();
        let (sheet, area) = Self::resolve(&mut state, range)?;

        let window: Vec<SheetRow> = sheet
            .cells
            .iter()
            .enumerate()
            .filter(|(r, _)| area.contains_row(*r))
            .map(|(_, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(c, _)| area.contains_col(*c))
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect();
        Ok(trimmed(&window))
    }

    async fn clear_range(&self, range: &str) -> Result<(), SyncError> {
        let mut state = self.lock();
        let (sheet, area) = Self::resolve(&mut state, range)?;

        for (r, row) in sheet.cells.iter_mut().enumerate() {
            if !area.contains_row(r) {
                continue;
            }
            for (c, cell) in row.iter_mut().enumerate() {
                if area.contains_col(c) {
                    cell.clear();
                }
            }
        }
        Ok(())
    }

    async fn update_range(&self, range: &str, rows: &[SheetRow]) -> Result<usize, SyncError> {
        let mut state = self.lock();
        let (sheet, area) = Self::resolve(&mut state, range)?;

        let mut written = 0usize;
        for (i, row) in rows.iter().enumerate() {
            let r = area.start_row + i;
            if !area.contains_row(r) || (!row.is_empty() && !area.contains_col(area.start_col + row.len() - 1)) {
                return Err(bad_request(format!(
                    "Requested writing within range [{}], but tried writing to row [{}]",
                    range,
                    r + 1
                )));
            }
            if sheet.cells.len() <= r {
                sheet.cells.resize(r + 1, Vec::new());
            }
            let target = &mut sheet.cells[r];
            if target.len() < area.start_col + row.len() {
                target.resize(area.start_col + row.len(), String::new());
            }
            for (j, cell) in row.iter().enumerate() {
                target[area.start_col + j] = cell.clone();
            }
            written += row.len();
        }
        Ok(written)
    }

    async fn list_sheets(&self) -> Result<Vec<SheetProperties>, SyncError> {
        Ok(self
            .lock()
            .sheets
            .iter()
            .map(|s| s.properties.clone())
            .collect())
    }

    async fn add_sheet(&self, title: &str) -> Result<SheetProperties, SyncError> {
        let mut state = self.lock();
        if state.sheets.iter().any(|s| s.properties.title == title) {
            return Err(bad_request(format!(
                "A sheet with the name \"{}\" already exists",
                title
            )));
        }
        let properties = SheetProperties {
            sheet_id: state.next_id,
            title: title.to_string(),
        };
        state.next_id += 1;
        state.sheets.push(MemorySheet {
            properties: properties.clone(),
            cells: Vec::new(),
        });
        Ok(properties)
    }

    async fn delete_sheet(&self, sheet_id: i64) -> Result<(), SyncError> {
        let mut state = self.lock();
        let before = state.sheets.len();
        state.sheets.retain(|s| s.properties.sheet_id != sheet_id);
        if state.sheets.len() == before {
            return Err(bad_request(format!("No sheet with id: {}", sheet_id)));
        }
        Ok(())
    }
}
