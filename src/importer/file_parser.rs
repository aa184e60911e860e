// ==========================================
// BolsaGO - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xls) / CSV (.csv, 分隔符 ',' 或 ';')
// ==========================================

use crate::domain::import::{FieldMap, RawRow};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

// 检查文件存在
fn ensure_exists(path: &Path) -> ImporterResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// 把一行单元格按表头组装为 RawRow;完全空白的行返回 None
fn build_row<I>(headers: &[String], cells: I, row_number: usize) -> Option<RawRow>
where
    I: Iterator<Item = String>,
{
    let mut fields = FieldMap::new();
    for (col_idx, value) in cells.enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if header.is_empty() {
                continue;
            }
            fields.insert(header.clone(), value.trim().to_string());
        }
    }

    // 跳过完全空白的行（行号仍然占位）
    if fields.values().all(|v| v.is_empty()) {
        return None;
    }
    Some(RawRow::new(row_number, fields))
}

// 字节偏移 → 源文件行号（1 起始）
// csv 记录位置指向上一条记录结束处,需先跳过其后的换行/空行;
// 偏移只能递增,计数从上次位置继续
struct LineCounter<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, byte: usize) -> usize {
        let start = self.bytes[byte.min(self.bytes.len())..]
            .iter()
            .position(|b| *b != b'\r' && *b != b'\n')
            .map(|offset| byte + offset)
            .unwrap_or(self.bytes.len());

        while self.pos < start {
            match self.bytes[self.pos] {
                b'\n' => self.line += 1,
                // 单独的 CR 也是行终止符
                b'\r' if self.bytes.get(self.pos + 1) != Some(&b'\n') => self.line += 1,
                _ => {}
            }
            self.pos += 1;
        }
        self.line
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 从表头行推断分隔符（巴西地区常见 ';'）
    fn detect_delimiter(content: &str) -> u8 {
        let header_line = content.lines().next().unwrap_or("");
        let semicolons = header_line.matches(';').count();
        let commas = header_line.matches(',').count();
        if semicolons > commas {
            b';'
        } else {
            b','
        }
    }

    /// 解析 CSV 文本
    pub fn parse_str(&self, content: &str) -> ImporterResult<Vec<RawRow>> {
        // 去除 UTF-8 BOM
        let content = content.trim_start_matches('\u{feff}');
        let delimiter = Self::detect_delimiter(content);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true) // 允许行长度不一致
            .from_reader(content.as_bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // csv 会跳过纯空行;行号按源文件行位置计算（表头之后第一行为 1）
        let mut lines = LineCounter::new(content.as_bytes());
        let header_line = lines.line_at(0);

        // 读取所有行
        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|p| lines.line_at(p.byte() as usize) - header_line)
                .unwrap_or(row_idx + 1);
            let cells = record.iter().map(|v| v.to_string());
            if let Some(row) = build_row(&headers, cells, row_number) {
                rows.push(row);
            }
        }

        debug!(rows = rows.len(), delimiter = %char::from(delimiter), "CSV 解析完成");
        Ok(rows)
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImporterResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        // 检查扩展名
        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let content = fs::read_to_string(file_path)?;
        self.parse_str(&content)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImporterResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        // 检查扩展名
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // 打开 Excel 文件
        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("planilha sem abas".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut sheet_rows = range.rows();
        let header_row = match sheet_rows.next() {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        // 读取数据行
        let mut rows = Vec::new();
        for (row_idx, data_row) in sheet_rows.enumerate() {
            let cells = data_row.iter().map(|cell| cell.to_string());
            if let Some(row) = build_row(&headers, cells, row_idx + 1) {
                rows.push(row);
            }
        }

        debug!(sheet = %sheet_name, rows = rows.len(), "Excel 解析完成");
        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImporterResult<Vec<RawRow>> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_rows(file_path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_rows(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
