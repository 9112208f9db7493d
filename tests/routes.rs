use axum::{
    body::to_bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use sheet_explorer::config::Config;
use sheet_explorer::error::AppError;
use sheet_explorer::routes::datasets::{
    create_dataset, delete_dataset, get_chart, get_profiles, get_quality, get_rows, get_statistics,
    upload_xlsx, CreateDatasetRequest, RowsQuery,
};
use sheet_explorer::services::explorer::{ChartKind, ChartRequest};
use sheet_explorer::AppState;

fn state() -> Arc<AppState> {
    Arc::new(AppState::new(Config::default()))
}

fn sales_request() -> CreateDatasetRequest {
    serde_json::from_value(json!({
        "columns": ["Data", "Loja", "Vendas"],
        "rows": [
            { "Data": "2024-01-01", "Loja": "Centro", "Vendas": "1.500,00" },
            { "Data": "2024-02-01", "Loja": "Norte", "Vendas": "2.000,00" },
            { "Data": "2024-03-01", "Loja": "Centro", "Vendas": null }
        ]
    }))
    .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(state: &Arc<AppState>) -> String {
    let Json(created) = create_dataset(State(state.clone()), Json(sales_request()))
        .await
        .unwrap();
    assert_eq!(created.row_count, 3);
    assert_eq!(created.column_count, 3);
    created.id
}

#[tokio::test]
async fn created_dataset_exposes_profiles_and_quality() {
    let state = state();
    let id = create(&state).await;

    let Json(profiles) = get_profiles(State(state.clone()), Path(id.clone())).await.unwrap();
    let types: Vec<Value> = profiles
        .iter()
        .map(|p| serde_json::to_value(p).unwrap()["type"].clone())
        .collect();
    assert_eq!(types, [json!("Date"), json!("Categorical"), json!("Numeric")]);

    let Json(quality) = get_quality(State(state.clone()), Path(id.clone())).await.unwrap();
    assert_eq!(quality.empty_cells, 1);
    assert_eq!(quality.total_cells, 9);

    let Json(stats) = get_statistics(State(state), Path(id)).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].summary.count, 2);
    assert_eq!(stats[0].summary.mean, 1750.0);
}

#[tokio::test]
async fn rows_follow_sort_toggle() {
    let state = state();
    let id = create(&state).await;

    let query = RowsQuery {
        toggle: Some("Vendas".into()),
        ..RowsQuery::default()
    };
    let response = get_rows(State(state), Path(id), Query(query)).await.unwrap();
    let body = body_json(response).await;

    assert_eq!(body["sort"]["column"], json!("Vendas"));
    assert_eq!(body["sort"]["direction"], json!("asc"));
    assert_eq!(body["total_pages"], json!(1));
    assert_eq!(body["rows"][2][2], Value::Null);
}

#[tokio::test]
async fn chart_endpoint_projects_series() {
    let state = state();
    let id = create(&state).await;

    let request = ChartRequest {
        x: Some("Data".into()),
        y: Some("Vendas".into()),
        kind: ChartKind::Line,
        trend: true,
    };
    let response = get_chart(State(state), Path(id), Query(request)).await.unwrap();
    let body = body_json(response).await;

    let ys: Vec<f64> = body["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["y"].as_f64().unwrap())
        .collect();
    assert_eq!(ys, [1500.0, 2000.0, 0.0]);
    assert!(body["trend"]["slope"].as_f64().unwrap() > 0.0);
    assert!(body.get("pie_groups").is_none());
}

#[tokio::test]
async fn unknown_and_deleted_datasets_are_404() {
    let state = state();
    let missing = get_profiles(State(state.clone()), Path("ds_missing".into())).await;
    let err = missing.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let id = create(&state).await;
    let status = delete_dataset(State(state.clone()), Path(id.clone())).await.unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(get_quality(State(state), Path(id)).await.is_err());
}

#[tokio::test]
async fn malformed_uploads_are_rejected() {
    let state = state();

    let duplicate_columns: CreateDatasetRequest =
        serde_json::from_value(json!({ "columns": ["a", "a"], "rows": [] })).unwrap();
    let result = create_dataset(State(state.clone()), Json(duplicate_columns)).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));

    let empty = upload_xlsx(State(state.clone()), bytes::Bytes::new()).await;
    assert!(matches!(empty, Err(AppError::InvalidInput(_))));

    let garbage = upload_xlsx(State(state), bytes::Bytes::from_static(b"plain text")).await;
    assert!(matches!(garbage, Err(AppError::FileProcessingError(_))));
}

#[test]
fn handlers_run_on_a_blocking_executor() {
    let state = state();
    let id = tokio_test::block_on(create(&state));
    let result = tokio_test::block_on(get_profiles(State(state), Path(id)));
    assert!(result.is_ok());
}
