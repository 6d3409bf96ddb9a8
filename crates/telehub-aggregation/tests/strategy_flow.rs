//! 聚合策略与工厂的端到端行为测试（使用记录查询的模拟连接）

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use telehub_aggregation::{AggregationError, AggregationStrategy, PushDownStrategy, StrategyFactory};
use telehub_connection::{
    ConnectionError, DataSourceConnection, SupportsAggregation,
};
use telehub_types::{
    AggregateFunction, AggregationConfiguration, AggregationKind, BackendKind, ConnectionInfo,
    ConnectionResult, DataPoint, QueryParams, TimeWindow,
};

fn point(tag_id: &str, value: &str, time: DateTime<Utc>) -> DataPoint {
    DataPoint::new(time, value).with_hierarchy("1001", "2001", "3001", tag_id)
}

fn sample_params() -> QueryParams {
    let now = Utc::now();
    QueryParams::new(now - Duration::hours(1), now)
}

/// 记录每次下推查询并按函数返回预置数据的模拟连接
struct MockAggregationConnection {
    calls: Arc<Mutex<Vec<(AggregateFunction, TimeWindow)>>>,
    data: HashMap<AggregateFunction, Vec<DataPoint>>,
    fail_on: Option<AggregateFunction>,
}

impl MockAggregationConnection {
    fn new(data: HashMap<AggregateFunction, Vec<DataPoint>>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            data,
            fail_on: None,
        }
    }

    fn failing_on(mut self, function: AggregateFunction) -> Self {
        self.fail_on = Some(function);
        self
    }
}

#[async_trait]
impl DataSourceConnection for MockAggregationConnection {
    async fn test_connection(&self) -> ConnectionResult {
        ConnectionResult::success("mock", 0)
    }

    async fn query_data(
        &self,
        _params: &QueryParams,
    ) -> telehub_connection::Result<Vec<DataPoint>> {
        Ok(Vec::new())
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo::new("mock", BackendKind::InfluxDb)
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::InfluxDb
    }

    fn as_aggregation(&self) -> Option<&dyn SupportsAggregation> {
        Some(self)
    }
}

#[async_trait]
impl SupportsAggregation for MockAggregationConnection {
    async fn query_aggregated_data(
        &self,
        _params: &QueryParams,
        function: AggregateFunction,
        window: TimeWindow,
    ) -> telehub_connection::Result<Vec<DataPoint>> {
        self.calls.lock().unwrap().push((function, window));

        if self.fail_on == Some(function) {
            return Err(ConnectionError::Transport("simulated failure".to_string()));
        }

        Ok(self.data.get(&function).cloned().unwrap_or_default())
    }
}

/// 仅支持明细查询的模拟连接（预聚合存储），记录收到的参数
struct MockPlainConnection {
    last_params: Arc<Mutex<Option<QueryParams>>>,
    rows: Vec<DataPoint>,
}

impl MockPlainConnection {
    fn new(rows: Vec<DataPoint>) -> Self {
        Self {
            last_params: Arc::new(Mutex::new(None)),
            rows,
        }
    }
}

#[async_trait]
impl DataSourceConnection for MockPlainConnection {
    async fn test_connection(&self) -> ConnectionResult {
        ConnectionResult::success("mock", 0)
    }

    async fn query_data(
        &self,
        params: &QueryParams,
    ) -> telehub_connection::Result<Vec<DataPoint>> {
        *self.last_params.lock().unwrap() = Some(params.clone());
        Ok(self.rows.clone())
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo::new("mock", BackendKind::Postgres)
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Postgres
    }
}

#[tokio::test]
async fn test_minmax_five_minutes_issues_exactly_two_queries() {
    let time = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let mut data = HashMap::new();
    data.insert(AggregateFunction::Min, vec![point("T1", "1.0", time)]);
    data.insert(AggregateFunction::Max, vec![point("T1", "9.0", time)]);

    let mock = MockAggregationConnection::new(data);
    let calls = mock.calls.clone();
    let strategy =
        StrategyFactory::create_strategy(BackendKind::InfluxDb, Arc::new(mock)).unwrap();

    let config = AggregationConfiguration::new(
        vec![AggregationKind::MinMax],
        vec![TimeWindow::FiveMinutes],
        BackendKind::InfluxDb,
    );
    let points = strategy.apply(&sample_params(), &config).await.unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            (AggregateFunction::Min, TimeWindow::FiveMinutes),
            (AggregateFunction::Max, TimeWindow::FiveMinutes),
        ]
    );

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].aggregation_kind.as_deref(), Some("minmax_min"));
    assert_eq!(points[1].aggregation_kind.as_deref(), Some("minmax_max"));
    assert!(points.iter().all(|p| p.time_window.as_deref() == Some("5m")));
}

#[tokio::test]
async fn test_firstlast_tags_both_halves() {
    let time = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let mut data = HashMap::new();
    data.insert(AggregateFunction::First, vec![point("T1", "2.0", time)]);
    data.insert(AggregateFunction::Last, vec![point("T1", "4.0", time)]);

    let strategy = PushDownStrategy::new(Arc::new(MockAggregationConnection::new(data)));
    let config = AggregationConfiguration::new(
        vec![AggregationKind::FirstLast],
        vec![TimeWindow::ThirtyMinutes],
        BackendKind::InfluxDb,
    );
    let points = strategy.apply(&sample_params(), &config).await.unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].aggregation_kind.as_deref(), Some("firstlast_first"));
    assert_eq!(points[1].aggregation_kind.as_deref(), Some("firstlast_last"));
    assert!(points.iter().all(|p| p.time_window.as_deref() == Some("30m")));
}

#[tokio::test]
async fn test_delta_joins_by_tag_and_formats_two_decimals() {
    let first_time = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let last_time = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

    let mut data = HashMap::new();
    data.insert(
        AggregateFunction::First,
        vec![
            point("T1", "10", first_time),
            // last 侧没有 T2，应被内联丢弃
            point("T2", "3.0", first_time),
        ],
    );
    data.insert(
        AggregateFunction::Last,
        vec![
            point("T1", "14.5", last_time),
            // first 侧没有 T3，应被内联丢弃
            point("T3", "8.0", last_time),
        ],
    );

    let strategy = PushDownStrategy::new(Arc::new(MockAggregationConnection::new(data)));
    let config = AggregationConfiguration::new(
        vec![AggregationKind::Delta],
        vec![TimeWindow::SixtyMinutes],
        BackendKind::InfluxDb,
    );
    let points = strategy.apply(&sample_params(), &config).await.unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].tag_id, "T1");
    assert_eq!(points[0].value, "4.50");
    assert_eq!(points[0].time, last_time);
    assert_eq!(points[0].aggregation_kind.as_deref(), Some("delta"));
}

#[tokio::test]
async fn test_delta_drops_non_numeric_rows() {
    let time = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let mut data = HashMap::new();
    data.insert(AggregateFunction::First, vec![point("T1", "n/a", time)]);
    data.insert(AggregateFunction::Last, vec![point("T1", "5.0", time)]);

    let strategy = PushDownStrategy::new(Arc::new(MockAggregationConnection::new(data)));
    let config = AggregationConfiguration::new(
        vec![AggregationKind::Delta],
        vec![TimeWindow::FiveMinutes],
        BackendKind::InfluxDb,
    );
    let points = strategy.apply(&sample_params(), &config).await.unwrap();

    assert!(points.is_empty());
}

#[tokio::test]
async fn test_single_pair_failure_does_not_abort_batch() {
    let time = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let mut data = HashMap::new();
    data.insert(AggregateFunction::Mean, vec![point("T1", "6.0", time)]);

    let mock = MockAggregationConnection::new(data).failing_on(AggregateFunction::Sum);
    let strategy = PushDownStrategy::new(Arc::new(mock));

    let config = AggregationConfiguration::new(
        vec![AggregationKind::Average, AggregationKind::Total],
        vec![TimeWindow::FiveMinutes],
        BackendKind::InfluxDb,
    );
    let points = strategy.apply(&sample_params(), &config).await.unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].aggregation_kind.as_deref(), Some("average"));
}

#[tokio::test]
async fn test_push_down_requires_capability() {
    let strategy = PushDownStrategy::new(Arc::new(MockPlainConnection::new(Vec::new())));
    let config = AggregationConfiguration::new(
        vec![AggregationKind::Average],
        vec![TimeWindow::FiveMinutes],
        BackendKind::Postgres,
    );

    let result = strategy.apply(&sample_params(), &config).await;
    assert!(matches!(result, Err(AggregationError::CapabilityMissing)));
}

#[tokio::test]
async fn test_invalid_configuration_rejected_before_any_query() {
    let mock = MockAggregationConnection::new(HashMap::new());
    let calls = mock.calls.clone();
    let strategy = PushDownStrategy::new(Arc::new(mock));

    let config =
        AggregationConfiguration::new(vec![], vec![TimeWindow::FiveMinutes], BackendKind::InfluxDb);
    let result = strategy.apply(&sample_params(), &config).await;

    assert!(matches!(
        result,
        Err(AggregationError::InvalidConfiguration(_))
    ));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_local_filter_keeps_matching_metadata_only() {
    let time = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let rows = vec![
        point("average_60m", "1.0", time),
        point("min_max_5m", "2.0", time),
        point("total_60m", "3.0", time),
        point("nounderscore", "4.0", time),
        point("_5m", "5.0", time),
    ];

    let mock = MockPlainConnection::new(rows);
    let last_params = mock.last_params.clone();
    let strategy =
        StrategyFactory::create_strategy(BackendKind::Postgres, Arc::new(mock)).unwrap();

    let params = sample_params()
        .with_equipments("3001")
        .with_tags("4001");
    let config = AggregationConfiguration::new(
        vec![AggregationKind::Average],
        vec![TimeWindow::SixtyMinutes],
        BackendKind::Postgres,
    );
    let points = strategy.apply(&params, &config).await.unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].tag_id, "average_60m");
    assert_eq!(points[0].aggregation_kind.as_deref(), Some("average"));
    assert_eq!(points[0].time_window.as_deref(), Some("60m"));

    // 携带聚合元数据的两级过滤必须在查询前清掉
    let issued = last_params.lock().unwrap().clone().unwrap();
    assert!(issued.equipment_ids.is_none());
    assert!(issued.tag_ids.is_none());
    assert_eq!(issued.start_time, params.start_time);
}

#[tokio::test]
async fn test_local_filter_expands_composite_kinds() {
    let time = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let rows = vec![
        point("min_5m", "1.0", time),
        point("max_5m", "2.0", time),
        point("average_5m", "3.0", time),
    ];

    let strategy = StrategyFactory::create_strategy(
        BackendKind::Postgres,
        Arc::new(MockPlainConnection::new(rows)),
    )
    .unwrap();

    let config = AggregationConfiguration::new(
        vec![AggregationKind::MinMax],
        vec![TimeWindow::FiveMinutes],
        BackendKind::Postgres,
    );
    let points = strategy.apply(&sample_params(), &config).await.unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].aggregation_kind.as_deref(), Some("min"));
    assert_eq!(points[1].aggregation_kind.as_deref(), Some("max"));
}

#[tokio::test]
async fn test_strategy_factory_rejects_unsupported_kind() {
    let result = StrategyFactory::create_strategy(
        BackendKind::Mysql,
        Arc::new(MockPlainConnection::new(Vec::new())),
    );

    match result {
        Err(AggregationError::NotSupported { kind, supported }) => {
            assert_eq!(kind, "mysql");
            assert!(supported.contains("influxdb"));
        }
        _ => panic!("expected NotSupported error"),
    }
}

#[test]
fn test_strategy_descriptions_differ() {
    let push_down = StrategyFactory::aggregation_description(BackendKind::InfluxDb);
    let local = StrategyFactory::aggregation_description(BackendKind::Postgres);
    assert_ne!(push_down, local);
}
