use crate::columns::{COL_COLLECTOR, COL_EQUIPMENT, COL_GATEWAY, COL_TAG, COL_TIME, COL_VALUE};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use telehub_types::DataPoint;
use tracing::{debug, warn};

/// 时序后端响应解析器
///
/// 响应是带注解的 CSV 文本，一份文档可能串联多个结果表，
/// 每个表自带表头行，列位置会在文档中途变化。
/// 解析过程中列索引作为局部可变状态随新表头重算，
/// 解析器本身无状态，可被并发调用复用。
#[derive(Debug, Clone, Default)]
pub struct FluxResponseParser;

/// 当前表头解析出的列索引；缺失的列为 None
#[derive(Debug, Clone, Copy, Default)]
struct ColumnIndices {
    time: Option<usize>,
    value: Option<usize>,
    collector: Option<usize>,
    gateway: Option<usize>,
    equipment: Option<usize>,
    tag: Option<usize>,
}

impl ColumnIndices {
    fn resolve(cells: &[String]) -> Self {
        let find = |name: &str| {
            cells
                .iter()
                .position(|cell| cell.eq_ignore_ascii_case(name))
        };

        Self {
            time: find(COL_TIME),
            value: find(COL_VALUE),
            collector: find(COL_COLLECTOR),
            gateway: find(COL_GATEWAY),
            equipment: find(COL_EQUIPMENT),
            tag: find(COL_TAG),
        }
    }
}

impl FluxResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析数据点
    ///
    /// 单行损坏只跳过该行，绝不让整个查询失败；
    /// 完全无法解析的响应退化为空结果。
    pub fn parse_data_points(&self, response: &str) -> Vec<DataPoint> {
        let lines: Vec<&str> = response
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();

        if lines.is_empty() {
            return Vec::new();
        }

        // 首行是类型注解时，表头在第二行
        let header_index = if lines[0].starts_with('#') { 1 } else { 0 };
        let header = match lines.get(header_index) {
            Some(line) => line,
            None => {
                warn!("Response contains annotations but no header line");
                return Vec::new();
            }
        };

        let mut indices = ColumnIndices::resolve(&Self::split_cells(header));
        let mut points = Vec::new();

        for line in lines.iter().skip(header_index + 1) {
            // 表间注解行
            if line.starts_with('#') {
                continue;
            }

            let cells = Self::split_cells(line);

            // 新表开始：首字段为空且同时含时间列和值列标记
            if Self::is_header_line(&cells) {
                indices = ColumnIndices::resolve(&cells);
                continue;
            }

            points.push(Self::point_from_cells(&cells, &indices));
        }

        debug!(count = points.len(), "Parsed data points from response");
        points
    }

    /// 提取单表响应中某一列的去重值集合（用于发现，不走多表逻辑）
    pub fn parse_distinct_values(&self, response: &str, column_name: &str) -> Vec<String> {
        let lines: Vec<&str> = response
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();

        if lines.is_empty() {
            return Vec::new();
        }

        let header_index = if lines[0].starts_with('#') { 1 } else { 0 };
        let header_cells = match lines.get(header_index) {
            Some(line) => Self::split_cells(line),
            None => return Vec::new(),
        };

        let column = match header_cells
            .iter()
            .position(|cell| cell.eq_ignore_ascii_case(column_name))
        {
            Some(index) => index,
            None => {
                warn!(column = %column_name, "Column not present in response header");
                return Vec::new();
            }
        };

        let mut values = Vec::new();
        for line in lines.iter().skip(header_index + 1) {
            if line.starts_with('#') {
                continue;
            }

            let cells = Self::split_cells(line);
            if let Some(value) = cells.get(column) {
                if !value.is_empty() && !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }

        values
    }

    fn split_cells(line: &str) -> Vec<String> {
        line.split(',')
            .map(|cell| Self::unquote(cell.trim()))
            .collect()
    }

    /// 表头判定：首字段为空，且单元格中同时出现时间列与值列标记（忽略大小写）
    fn is_header_line(cells: &[String]) -> bool {
        let leading_empty = cells.first().map(|c| c.is_empty()).unwrap_or(false);
        if !leading_empty {
            return false;
        }

        let has_time = cells.iter().any(|c| c.eq_ignore_ascii_case(COL_TIME));
        let has_value = cells.iter().any(|c| c.eq_ignore_ascii_case(COL_VALUE));
        has_time && has_value
    }

    fn point_from_cells(cells: &[String], indices: &ColumnIndices) -> DataPoint {
        DataPoint {
            time: Self::parse_timestamp(&Self::cell(cells, indices.time)),
            collector_id: Self::cell(cells, indices.collector),
            gateway_id: Self::cell(cells, indices.gateway),
            equipment_id: Self::cell(cells, indices.equipment),
            tag_id: Self::cell(cells, indices.tag),
            value: Self::cell(cells, indices.value),
            aggregation_kind: None,
            time_window: None,
        }
    }

    /// 索引缺失或越界时返回空字符串
    fn cell(cells: &[String], index: Option<usize>) -> String {
        index
            .and_then(|i| cells.get(i))
            .cloned()
            .unwrap_or_default()
    }

    /// 剥掉一层对称引号或单边悬挂引号
    fn unquote(cell: &str) -> String {
        if cell.len() >= 2 && cell.starts_with('"') && cell.ends_with('"') {
            cell[1..cell.len() - 1].to_string()
        } else if let Some(stripped) = cell.strip_prefix('"') {
            stripped.to_string()
        } else if let Some(stripped) = cell.strip_suffix('"') {
            stripped.to_string()
        } else {
            cell.to_string()
        }
    }

    /// 时间戳解析失败时以当前时间兜底，而不是丢弃该行
    fn parse_timestamp(raw: &str) -> DateTime<Utc> {
        let text = raw.trim();

        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return parsed.with_timezone(&Utc);
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Utc.from_utc_datetime(&naive);
            }
        }

        if !text.is_empty() {
            warn!(value = %text, "Unparseable timestamp, substituting current time");
        }
        Utc::now()
    }
}
