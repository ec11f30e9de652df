use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::board::{self, BoardStore};
use crate::discovery::{BOARD_FILE_SUFFIX, BoardDiscovery, ListBoardsOptions};
use crate::errors::{BoardError, DiscoveryError};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub discovery: Arc<BoardDiscovery>,
    pub boards: Arc<dyn BoardStore>,
    pub recursive_default: bool,
}

pub type SharedState = Arc<AppState>;

// ── Request / response types ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct DirectoriesQuery {
    pub path: Option<String>,
}

#[derive(Deserialize)]
pub struct BoardsQuery {
    pub path: Option<String>,
    pub recursive: Option<String>,
    pub force: Option<String>,
}

#[derive(Serialize)]
pub struct CwdResponse {
    pub cwd: String,
}

#[derive(Serialize)]
pub struct DirectoriesResponse {
    pub directories: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub knbn_web: &'static str,
    pub board_suffix: &'static str,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<DiscoveryError> for ApiError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::AccessDenied { .. } => {
                ApiError::Forbidden("Access denied: Path outside working directory".into())
            }
            DiscoveryError::NotFound { .. } | DiscoveryError::NotADirectory { .. } => {
                ApiError::NotFound("Directory not found".into())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::Discovery(inner) => inner.into(),
            BoardError::NotFound { .. } => ApiError::NotFound("Board file not found".into()),
            BoardError::InvalidPath { .. } => ApiError::NotFound("Board file not found".into()),
            other => ApiError::Internal(format!("Failed to load board content: {}", other)),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/version", get(get_version))
        .route("/api/cwd", get(get_cwd))
        .route("/api/directories", get(list_directories))
        .route("/api/boards", get(list_boards))
        .route("/api/boards/{*board_path}", get(get_board))
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Run blocking filesystem work off the async runtime.
async fn blocking<F, R, E>(f: F) -> Result<R, ApiError>
where
    F: FnOnce() -> Result<R, E> + Send + 'static,
    R: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::from(DiscoveryError::WorkerPanicked(e.to_string())))?
        .map_err(Into::into)
}

/// Parse an optional boolean query flag. Absent or empty means `None`.
fn parse_flag(name: &str, value: Option<&str>) -> Result<Option<bool>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(Some(false)),
        Some(v) => Err(ApiError::BadRequest(format!(
            "Invalid value for '{}': expected true or false, got '{}'",
            name, v
        ))),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        knbn_web: env!("CARGO_PKG_VERSION"),
        board_suffix: BOARD_FILE_SUFFIX,
    })
}

async fn get_cwd(State(state): State<SharedState>) -> Json<CwdResponse> {
    Json(CwdResponse {
        cwd: state.discovery.working_root().to_string_lossy().into_owned(),
    })
}

async fn list_directories(
    State(state): State<SharedState>,
    Query(query): Query<DirectoriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let discovery = state.discovery.clone();
    let path = query.path.unwrap_or_default();
    let directories = blocking(move || discovery.list_directories(&path)).await?;
    Ok(Json(DirectoriesResponse { directories }))
}

async fn list_boards(
    State(state): State<SharedState>,
    Query(query): Query<BoardsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let options = ListBoardsOptions {
        recursive: parse_flag("recursive", query.recursive.as_deref())?
            .unwrap_or(state.recursive_default),
        force_refresh: parse_flag("force", query.force.as_deref())?.unwrap_or(false),
    };
    let discovery = state.discovery.clone();
    let path = query.path.unwrap_or_default();
    let boards = blocking(move || discovery.list_boards(&path, options)).await?;
    Ok(Json(boards))
}

async fn get_board(
    State(state): State<SharedState>,
    Path(board_path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let discovery = state.discovery.clone();
    let store = state.boards.clone();
    let content = blocking(move || -> Result<_, BoardError> {
        let path = board::locate_board(discovery.sandbox(), &board_path)?;
        store.load(&path)
    })
    .await?;
    Ok(Json(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::YamlBoardStore;
    use crate::discovery::DEFAULT_CACHE_TTL;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("team/.archive")).unwrap();
        fs::create_dir_all(dir.path().join("alpha")).unwrap();
        fs::write(dir.path().join("root.knbn"), "configuration:\n  name: Root\ntasks: {}\n").unwrap();
        fs::write(dir.path().join("team/sprint.knbn"), "configuration:\n  name: Sprint\n").unwrap();
        fs::write(dir.path().join("team/.archive/old.knbn"), "").unwrap();

        let state = Arc::new(AppState {
            discovery: Arc::new(BoardDiscovery::new(dir.path(), DEFAULT_CACHE_TTL).unwrap()),
            boards: Arc::new(YamlBoardStore),
            recursive_default: false,
        });
        (dir, api_router().with_state(state))
    }

    async fn get(app: Router, uri: &str) -> Response {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn board_names(boards: &[serde_json::Value]) -> Vec<String> {
        let mut names: Vec<String> = boards
            .iter()
            .map(|b| b["name"].as_str().unwrap().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_dir, app) = test_app();
        let response = get(app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_version() {
        let (_dir, app) = test_app();
        let response = get(app, "/api/version").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["knbnWeb"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["boardSuffix"], ".knbn");
    }

    #[tokio::test]
    async fn test_cwd_reports_canonical_root() {
        let (dir, app) = test_app();
        let response = get(app, "/api/cwd").await;
        let body: serde_json::Value = body_json(response.into_body()).await;
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(body["cwd"], expected.to_str().unwrap());
    }

    #[tokio::test]
    async fn test_list_directories_root() {
        let (_dir, app) = test_app();
        let response = get(app, "/api/directories").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["directories"], serde_json::json!(["alpha", "team"]));
    }

    #[tokio::test]
    async fn test_list_directories_missing_is_empty() {
        let (_dir, app) = test_app();
        let response = get(app, "/api/directories?path=does/not/exist").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["directories"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_list_boards_shallow() {
        let (_dir, app) = test_app();
        let response = get(app, "/api/boards").await;
        assert_eq!(response.status(), StatusCode::OK);
        let boards: Vec<serde_json::Value> = body_json(response.into_body()).await;
        assert_eq!(board_names(&boards), vec!["root.knbn"]);
    }

    #[tokio::test]
    async fn test_list_boards_recursive() {
        let (_dir, app) = test_app();
        let response = get(app, "/api/boards?recursive=true").await;
        assert_eq!(response.status(), StatusCode::OK);
        let boards: Vec<serde_json::Value> = body_json(response.into_body()).await;
        let sprint = std::path::Path::new("team")
            .join("sprint.knbn")
            .to_string_lossy()
            .into_owned();
        assert_eq!(board_names(&boards), vec!["root.knbn".to_string(), sprint]);
    }

    #[tokio::test]
    async fn test_list_boards_in_subdirectory() {
        let (_dir, app) = test_app();
        let response = get(app, "/api/boards?path=team/&force=true").await;
        assert_eq!(response.status(), StatusCode::OK);
        let boards: Vec<serde_json::Value> = body_json(response.into_body()).await;
        assert_eq!(board_names(&boards), vec!["sprint.knbn"]);
    }

    #[tokio::test]
    async fn test_list_boards_missing_directory_is_404() {
        let (_dir, app) = test_app();
        for uri in ["/api/boards?path=nope", "/api/boards?path=nope&recursive=true"] {
            let response = get(app.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let body: serde_json::Value = body_json(response.into_body()).await;
            assert_eq!(body["error"], "Directory not found");
        }
    }

    #[tokio::test]
    async fn test_list_boards_rejects_bad_flag() {
        let (_dir, app) = test_app();
        let response = get(app, "/api/boards?recursive=maybe").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_escape_via_symlink_is_403() {
        let (dir, app) = test_app();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let response = get(app.clone(), "/api/boards?path=link").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "Access denied: Path outside working directory");

        let response = get(app, "/api/directories?path=link").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_traversal_is_neutralised() {
        let (_dir, app) = test_app();
        let response = get(app, "/api/boards?path=../../..").await;
        assert_eq!(response.status(), StatusCode::OK);
        let boards: Vec<serde_json::Value> = body_json(response.into_body()).await;
        assert_eq!(board_names(&boards), vec!["root.knbn"]);
    }

    #[tokio::test]
    async fn test_get_board_by_relative_path() {
        let (_dir, app) = test_app();
        let response = get(app, "/api/boards/team%2Fsprint.knbn").await;
        assert_eq!(response.status(), StatusCode::OK);
        let board: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(board["configuration"]["name"], "Sprint");
    }

    #[tokio::test]
    async fn test_get_board_by_listed_absolute_path() {
        let (_dir, app) = test_app();
        let response = get(app.clone(), "/api/boards").await;
        let boards: Vec<serde_json::Value> = body_json(response.into_body()).await;
        let path = boards[0]["path"].as_str().unwrap().replace('/', "%2F");

        let response = get(app, &format!("/api/boards/{}", path)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let board: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(board["configuration"]["name"], "Root");
    }

    #[tokio::test]
    async fn test_get_board_missing_is_404() {
        let (_dir, app) = test_app();
        let response = get(app.clone(), "/api/boards/missing.knbn").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = get(app, "/api/boards/notes.txt").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("x", None).unwrap(), None);
        assert_eq!(parse_flag("x", Some("")).unwrap(), None);
        assert_eq!(parse_flag("x", Some("TRUE")).unwrap(), Some(true));
        assert_eq!(parse_flag("x", Some("0")).unwrap(), Some(false));
        assert!(matches!(parse_flag("x", Some("yes")), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_discovery_error_mapping() {
        let denied = ApiError::from(DiscoveryError::AccessDenied {
            path: "/etc".into(),
        });
        assert!(matches!(denied, ApiError::Forbidden(_)));
        let missing = ApiError::from(DiscoveryError::NotFound { path: "/x".into() });
        assert!(matches!(missing, ApiError::NotFound(_)));
    }
}
