//! Projects API Example - cursor pagination over HTTP
//!
//! Serves `GET /projects?after=<token>&limit=<n>` from an in-memory list, so
//! no database is needed.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example projects-api
//! ```
//!
//! ## Testing the API
//!
//! ```bash
//! # First page
//! curl "http://localhost:8080/projects?limit=3"
//!
//! # Next page: pass the previous response's nextToken
//! curl "http://localhost:8080/projects?limit=3&after=<nextToken>"
//!
//! # Only one owner's projects
//! curl "http://localhost:8080/projects?owner=2"
//!
//! # A malformed cursor is a 400
//! curl -i "http://localhost:8080/projects?after=garbage"
//! ```

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use seekpage::prelude::*;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Project {
    id: i64,
    title: String,
    owner_id: i64,
    updated_at: DateTime<Utc>,
}

impl Record for Project {
    fn field(&self, name: &str) -> Option<FilterValue> {
        match name {
            "id" => Some(self.id.into()),
            "title" => Some(self.title.clone().into()),
            "ownerId" => Some(self.owner_id.into()),
            "updatedAt" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProjectFilter {
    owner: Option<i64>,
}

#[derive(Clone)]
struct AppState {
    paginator: Arc<CursorPaginator>,
    executor: MemoryExecutor<Project>,
    pagination: PaginationConfig,
}

async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    Query(filter): Query<ProjectFilter>,
) -> Result<PageResponse<Project>> {
    let filters = filter
        .owner
        .map(|owner| vec![FilterCondition::eq("ownerId", owner)])
        .unwrap_or_default();

    let request = query.to_request_for(&state.pagination, state.paginator.spec(), filters)?;
    let page = state.paginator.paginate(&state.executor, request).await?;
    Ok(page.into())
}

fn seed() -> Vec<Project> {
    let base = Utc.with_ymd_and_hms(2025, 4, 8, 9, 0, 0).single().unwrap_or_default();
    (1..=25)
        .map(|id| Project {
            id,
            title: format!("Project {}", id),
            owner_id: id % 3,
            // Projects share timestamps in pairs; ties are broken by id
            updated_at: base + Duration::minutes(id / 2),
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let spec = SortSpec::new(vec![
        SortField::desc("updatedAt", FieldType::Date),
        SortField::desc("id", FieldType::Number).unique(),
    ])?;

    let state = AppState {
        paginator: Arc::new(config.pagination.paginator(spec)),
        executor: MemoryExecutor::new(seed()),
        pagination: config.pagination.clone(),
    };

    let app = Router::new()
        .route("/projects", get(list_projects))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    info!("Listening on http://localhost:8080/projects");
    axum::serve(listener, app).await?;

    Ok(())
}
