use sea_orm::{DatabaseBackend, Statement, Value};
use telehub_types::{AggregateFunction, QueryParams, TableSchema, TimeWindow};

/// SQL 查询构建器
///
/// 基于 [`TableSchema`] 列映射构建参数化语句，
/// 所有来自 [`QueryParams`] 的值一律绑定参数，绝不拼接。
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    /// 列映射
    pub schema: TableSchema,

    /// 目标数据库方言
    pub backend: DatabaseBackend,
}

impl SqlQueryBuilder {
    pub fn new(schema: TableSchema, backend: DatabaseBackend) -> Self {
        Self { schema, backend }
    }

    /// 连通性测试查询
    pub fn build_test_query(&self) -> Statement {
        Statement::from_string(self.backend, "SELECT 1".to_string())
    }

    /// 参数是否有效（开始时间必须早于结束时间）
    pub fn validate_params(&self, params: &QueryParams) -> bool {
        params.has_valid_range()
    }

    /// 构建明细数据查询
    ///
    /// 输出列统一别名为规范列名，行映射不依赖物理列名。
    pub fn build_data_query(&self, params: &QueryParams) -> Statement {
        let s = &self.schema;
        let mut sql = format!(
            "SELECT {time} AS time, {collector} AS collector_id, {gateway} AS gateway_id, \
             {equipment} AS equipment_id, {tag} AS tag_id, {value} AS value FROM {table} \
             WHERE {time} >= {p1} AND {time} <= {p2}",
            time = s.time_column,
            collector = s.collector_column,
            gateway = s.gateway_column,
            equipment = s.equipment_column,
            tag = s.tag_column,
            value = s.value_column,
            table = s.table,
            p1 = self.placeholder(1),
            p2 = self.placeholder(2),
        );

        let mut values: Vec<Value> = vec![params.start_time.into(), params.end_time.into()];
        self.push_level_filters(&mut sql, &mut values, params);

        sql.push_str(&format!(" ORDER BY {} DESC", s.time_column));

        if let Some(limit) = params.limit {
            sql.push_str(&format!(" LIMIT {}", self.placeholder(values.len() + 1)));
            values.push((limit as i64).into());
        }

        Statement::from_sql_and_values(self.backend, sql, values)
    }

    /// 构建窗口聚合查询（原生时间分桶 + 按桶和全部层次列分组）
    pub fn build_windowed_query(
        &self,
        params: &QueryParams,
        function: AggregateFunction,
        window: TimeWindow,
    ) -> Statement {
        let s = &self.schema;
        let interval = Self::interval_literal(window.as_str());
        let aggregate = Self::aggregate_expr(function, &s.value_column, &s.time_column);

        let mut sql = format!(
            "SELECT time_bucket('{interval}', {time}) AS time, {collector} AS collector_id, \
             {gateway} AS gateway_id, {equipment} AS equipment_id, {tag} AS tag_id, \
             {aggregate} AS value FROM {table} WHERE {time} >= {p1} AND {time} <= {p2}",
            interval = interval,
            time = s.time_column,
            collector = s.collector_column,
            gateway = s.gateway_column,
            equipment = s.equipment_column,
            tag = s.tag_column,
            aggregate = aggregate,
            table = s.table,
            p1 = self.placeholder(1),
            p2 = self.placeholder(2),
        );

        let mut values: Vec<Value> = vec![params.start_time.into(), params.end_time.into()];
        self.push_level_filters(&mut sql, &mut values, params);

        sql.push_str(&format!(
            " GROUP BY 1, {}, {}, {}, {} ORDER BY 1 DESC",
            s.collector_column, s.gateway_column, s.equipment_column, s.tag_column
        ));

        Statement::from_sql_and_values(self.backend, sql, values)
    }

    /// 短文本时长转原生区间字面量
    ///
    /// `"5m"` -> `"5 minutes"`，数量为 1 时用单数；未识别的单位按分钟处理。
    pub fn interval_literal(window_period: &str) -> String {
        let trimmed = window_period.trim();
        let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
        let unit: String = trimmed.chars().skip(digits.len()).collect();

        let count: i64 = digits.parse().unwrap_or(1);
        let word = match unit.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" => "second",
            "h" | "hr" => "hour",
            "d" => "day",
            // 默认按分钟
            _ => "minute",
        };

        if count == 1 {
            format!("{} {}", count, word)
        } else {
            format!("{} {}s", count, word)
        }
    }

    /// 值列转浮点后的聚合表达式；first/last 需要伴随时间列
    fn aggregate_expr(function: AggregateFunction, value_column: &str, time_column: &str) -> String {
        let cast = format!("CAST({} AS double precision)", value_column);
        match function {
            AggregateFunction::First => format!("first({}, {})", cast, time_column),
            AggregateFunction::Last => format!("last({}, {})", cast, time_column),
            other => format!("{}({})", other.sql_name(), cast),
        }
    }

    /// 四级层次过滤：单值等值、多值 IN、空过滤不加条件
    fn push_level_filters(&self, sql: &mut String, values: &mut Vec<Value>, params: &QueryParams) {
        let s = &self.schema;
        let levels = [
            (s.collector_column.clone(), params.collector_ids.as_deref()),
            (s.gateway_column.clone(), params.gateway_ids.as_deref()),
            (s.equipment_column.clone(), params.equipment_ids.as_deref()),
            (s.tag_column.clone(), params.tag_ids.as_deref()),
        ];

        for (column, filter) in levels {
            let ids = match filter {
                Some(raw) => QueryParams::split_filter(raw),
                None => continue,
            };

            match ids.len() {
                0 => {}
                1 => {
                    sql.push_str(&format!(
                        " AND {} = {}",
                        column,
                        self.placeholder(values.len() + 1)
                    ));
                    values.push(ids[0].clone().into());
                }
                _ => {
                    let placeholders: Vec<String> = (0..ids.len())
                        .map(|i| self.placeholder(values.len() + 1 + i))
                        .collect();
                    sql.push_str(&format!(
                        " AND {} IN ({})",
                        column,
                        placeholders.join(", ")
                    ));
                    for id in ids {
                        values.push(id.into());
                    }
                }
            }
        }
    }

    fn placeholder(&self, index: usize) -> String {
        match self.backend {
            DatabaseBackend::Postgres => format!("${}", index),
            _ => "?".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_params() -> QueryParams {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        QueryParams::new(start, end)
    }

    fn builder() -> SqlQueryBuilder {
        SqlQueryBuilder::new(TableSchema::default(), DatabaseBackend::Postgres)
    }

    #[test]
    fn test_validate_params() {
        let b = builder();
        assert!(b.validate_params(&sample_params()));

        let mut bad = sample_params();
        bad.start_time = bad.end_time;
        assert!(!b.validate_params(&bad));
    }

    #[test]
    fn test_data_query_binds_time_range() {
        let stmt = builder().build_data_query(&sample_params());

        assert!(stmt.sql.contains("WHERE time >= $1 AND time <= $2"));
        assert!(stmt.sql.contains("ORDER BY time DESC"));
        assert_eq!(stmt.values.as_ref().unwrap().0.len(), 2);
    }

    #[test]
    fn test_multi_value_filter_compiles_to_in() {
        let params = sample_params().with_collectors("10, 20,30");
        let stmt = builder().build_data_query(&params);

        assert!(stmt.sql.contains("collector_id IN ($3, $4, $5)"));
        assert_eq!(stmt.values.as_ref().unwrap().0.len(), 5);
    }

    #[test]
    fn test_single_value_filter_is_equality() {
        let params = sample_params().with_tags("2001");
        let stmt = builder().build_data_query(&params);

        assert!(stmt.sql.contains("tag_id = $3"));
    }

    #[test]
    fn test_empty_filter_adds_no_condition() {
        let params = sample_params().with_gateways("  ,  ");
        let stmt = builder().build_data_query(&params);

        assert!(!stmt.sql.contains("gateway_id ="));
        assert!(!stmt.sql.contains("gateway_id IN"));
        assert_eq!(stmt.values.as_ref().unwrap().0.len(), 2);
    }

    #[test]
    fn test_limit_is_bound() {
        let params = sample_params().with_limit(50);
        let stmt = builder().build_data_query(&params);

        assert!(stmt.sql.ends_with("LIMIT $3"));
        assert_eq!(stmt.values.as_ref().unwrap().0.len(), 3);
    }

    #[test]
    fn test_mysql_placeholders() {
        let b = SqlQueryBuilder::new(TableSchema::default(), DatabaseBackend::MySql);
        let stmt = b.build_data_query(&sample_params().with_collectors("1,2"));

        assert!(stmt.sql.contains("WHERE time >= ? AND time <= ?"));
        assert!(stmt.sql.contains("collector_id IN (?, ?)"));
    }

    #[test]
    fn test_windowed_query() {
        let stmt = builder().build_windowed_query(
            &sample_params(),
            AggregateFunction::Mean,
            TimeWindow::FiveMinutes,
        );

        assert!(stmt.sql.contains("time_bucket('5 minutes', time)"));
        assert!(stmt.sql.contains("AVG(CAST(value AS double precision))"));
        assert!(stmt.sql.contains("GROUP BY 1, collector_id, gateway_id, equipment_id, tag_id"));
        assert!(stmt.sql.contains("ORDER BY 1 DESC"));
    }

    #[test]
    fn test_windowed_query_first_last() {
        let stmt = builder().build_windowed_query(
            &sample_params(),
            AggregateFunction::Last,
            TimeWindow::SixtyMinutes,
        );

        assert!(stmt.sql.contains("time_bucket('60 minutes', time)"));
        assert!(stmt.sql.contains("last(CAST(value AS double precision), time)"));
    }

    #[test]
    fn test_interval_literal() {
        assert_eq!(SqlQueryBuilder::interval_literal("5m"), "5 minutes");
        assert_eq!(SqlQueryBuilder::interval_literal("60m"), "60 minutes");
        assert_eq!(SqlQueryBuilder::interval_literal("1h"), "1 hour");
        assert_eq!(SqlQueryBuilder::interval_literal("2h"), "2 hours");
        assert_eq!(SqlQueryBuilder::interval_literal("1m"), "1 minute");
        // 未识别单位默认按分钟
        assert_eq!(SqlQueryBuilder::interval_literal("7x"), "7 minutes");
    }

    #[test]
    fn test_custom_schema_mapping() {
        let schema = TableSchema {
            table: "hist_data".to_string(),
            time_column: "ts".to_string(),
            value_column: "val".to_string(),
            collector_column: "c1".to_string(),
            gateway_column: "c2".to_string(),
            equipment_column: "c3".to_string(),
            tag_column: "c4".to_string(),
        };
        let b = SqlQueryBuilder::new(schema, DatabaseBackend::Postgres);
        let stmt = b.build_data_query(&sample_params());

        assert!(stmt.sql.contains("FROM hist_data"));
        assert!(stmt.sql.contains("ts AS time"));
        assert!(stmt.sql.contains("c4 AS tag_id"));
    }
}
