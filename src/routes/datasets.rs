use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::AppError,
    models::{Cell, Dataset},
    services::{
        explorer::{
            ChartRequest, ColumnProfile, ColumnStatistics, QualityReport, SortDirection, SortState,
        },
        ingest,
    },
    AppState,
};

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/datasets", post(create_dataset))
        .route(
            "/datasets/xlsx",
            post(upload_xlsx).layer(DefaultBodyLimit::max(max_file_size)),
        )
        .route("/datasets/:id", axum::routing::delete(delete_dataset))
        .route("/datasets/:id/profiles", get(get_profiles))
        .route("/datasets/:id/quality", get(get_quality))
        .route("/datasets/:id/statistics", get(get_statistics))
        .route("/datasets/:id/rows", get(get_rows))
        .route("/datasets/:id/chart", get(get_chart))
}

#[derive(Debug, Deserialize)]
pub struct CreateDatasetRequest {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, Cell>>,
}

#[derive(Debug, Serialize)]
pub struct DatasetCreated {
    pub id: String,
    pub row_count: usize,
    pub column_count: usize,
    pub profiles: Vec<ColumnProfile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RowsQuery {
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
    /// Column the user clicked; applies the tri-state toggle to `sort`/`direction`.
    pub toggle: Option<String>,
    pub page: Option<usize>,
}

impl RowsQuery {
    pub fn sort_state(&self) -> SortState {
        let current = match &self.sort {
            Some(column) => SortState::by(column, self.direction.unwrap_or(SortDirection::Asc)),
            None => SortState::unsorted(),
        };
        match &self.toggle {
            Some(column) => current.toggle(column),
            None => current,
        }
    }
}

pub async fn create_dataset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDatasetRequest>,
) -> Result<Json<DatasetCreated>, AppError> {
    tracing::info!(
        "Creating dataset with {} columns and {} rows",
        request.columns.len(),
        request.rows.len()
    );
    let dataset = ingest::dataset_from_objects(request.columns, request.rows)?;
    Ok(Json(store_dataset(&state, dataset)))
}

pub async fn upload_xlsx(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<DatasetCreated>, AppError> {
    if body.is_empty() {
        return Err(AppError::InvalidInput("No file provided".to_string()));
    }
    let dataset = ingest::dataset_from_xlsx(body)?;
    Ok(Json(store_dataset(&state, dataset)))
}

pub async fn delete_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.store.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("dataset {}", id)))
    }
}

pub async fn get_profiles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ColumnProfile>>, AppError> {
    let explorer = state.store.get(&id)?;
    Ok(Json(explorer.profiles().to_vec()))
}

pub async fn get_quality(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QualityReport>, AppError> {
    let explorer = state.store.get(&id)?;
    Ok(Json(explorer.quality().clone()))
}

pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ColumnStatistics>>, AppError> {
    let explorer = state.store.get(&id)?;
    Ok(Json(explorer.statistics().to_vec()))
}

pub async fn get_rows(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<RowsQuery>,
) -> Result<Response, AppError> {
    let explorer = state.store.get(&id)?;
    let sort = query.sort_state();
    let page = explorer.page(&sort, query.page.unwrap_or(0));
    Ok(Json(page).into_response())
}

pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(request): Query<ChartRequest>,
) -> Result<Response, AppError> {
    let explorer = state.store.get(&id)?;
    let projection = explorer.chart(&request);
    Ok(Json(projection.as_ref()).into_response())
}

fn store_dataset(state: &AppState, dataset: Dataset) -> DatasetCreated {
    let (id, explorer) = state.store.insert(dataset);
    let dataset = explorer.dataset();
    DatasetCreated {
        row_count: dataset.row_count(),
        column_count: dataset.column_count(),
        profiles: explorer.profiles().to_vec(),
        id,
    }
}
