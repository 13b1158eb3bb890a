//! HTTP service for the diagram editor front end.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/diagram` | generate a diagram draft from `{query}` |
//! | `POST /api/diagram-image` | upload a diagram image and transcribe it |
//! | `POST /api/upload-image` | store an image |
//! | `GET /uploads/{name}` | serve a stored image |
//! | `POST /api/export` | Spring Boot project for a diagram, as a zip |
//! | `GET /health` | liveness |
//!
//! Failures are answered with a JSON envelope (see [`ApiError`]). Calls to
//! the language model block, so they run on tokio's blocking pool.

use std::{
    path::{Path as FsPath, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use umlcanvas::{
    ImageTranscription, UmlCanvasError, Workbench,
    config::AppConfig,
    llm::{DiagramGenerator, ImageInput, OpenRouterClient},
    semantic::DraftDiagram,
    store::DiagramStore,
};

/// Largest accepted request body.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared state of all handlers.
pub struct ServerState {
    workbench: Workbench,
    generator: Arc<dyn DiagramGenerator + Send + Sync>,
    uploads_dir: PathBuf,
    debug_errors: bool,
}

impl ServerState {
    pub fn new(config: AppConfig, generator: Arc<dyn DiagramGenerator + Send + Sync>) -> Self {
        let uploads_dir = config.server().uploads_dir().to_path_buf();
        let debug_errors = config.server().debug_errors();
        Self {
            workbench: Workbench::new(config),
            generator,
            uploads_dir,
            debug_errors,
        }
    }

    fn error(&self, err: UmlCanvasError) -> ApiError {
        ApiError::from_error(err, self.debug_errors)
    }
}

pub type AppState = Arc<ServerState>;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            raw: None,
            stack: None,
        }
    }
}

/// A failed request.
#[derive(Debug)]
pub enum ApiError {
    /// The request itself is unusable.
    BadRequest(String),
    /// The language model service answered with a non-2xx status.
    Upstream { status: u16, details: String },
    /// The model answered, but not with a usable diagram.
    MalformedOutput { message: String, raw: Option<String> },
    NotFound,
    Internal { message: String, stack: Option<String> },
}

impl ApiError {
    /// Classify a library error; `debug` adds the error chain to 500s.
    pub fn from_error(err: UmlCanvasError, debug: bool) -> Self {
        if err.is_user_error() {
            return Self::BadRequest(err.to_string());
        }
        match err {
            UmlCanvasError::Upstream { status, details } => Self::Upstream { status, details },
            UmlCanvasError::ModelOutput(ref output) => Self::MalformedOutput {
                message: err.to_string(),
                raw: output.raw().map(str::to_string),
            },
            UmlCanvasError::EmptyCompletion { ref raw } => Self::MalformedOutput {
                message: err.to_string(),
                raw: Some(raw.clone()),
            },
            other => Self::Internal {
                message: other.to_string(),
                stack: debug.then(|| format!("{other:?}")),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MalformedOutput { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(self) -> ErrorResponse {
        match self {
            Self::BadRequest(message) => ErrorResponse::new(message),
            Self::Upstream { status, details } => ErrorResponse {
                details: Some(details),
                ..ErrorResponse::new(format!("Language model service error: {status}"))
            },
            Self::MalformedOutput { message, raw } => ErrorResponse {
                raw,
                ..ErrorResponse::new(message)
            },
            Self::NotFound => ErrorResponse::new("Not found"),
            Self::Internal { message, stack } => ErrorResponse {
                stack,
                ..ErrorResponse::new(message)
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), err:? = self; "Request failed");
        } else {
            warn!(status = status.as_u16(), err:? = self; "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal {
            message: err.to_string(),
            stack: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DiagramQuery {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDiagramResponse {
    pub message: String,
    pub image_url: String,
    pub result: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
    pub uml_version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "UML diagram service running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uml_version: "2.5".to_string(),
    })
}

/// `POST /api/diagram`
pub async fn generate_diagram(
    State(state): State<AppState>,
    body: Result<Json<DiagramQuery>, JsonRejection>,
) -> Result<Json<DraftDiagram>, ApiError> {
    let Json(request) = body?;
    let query = request
        .query
        .filter(|query| !query.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing query".to_string()))?;

    info!(chars = query.len(); "Diagram generation requested");

    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        // The front end sends the diagram context inside the query
        worker
            .workbench
            .generate_draft(&DiagramStore::new(), &query, worker.generator.as_ref())
    })
    .await?;

    result.map(Json).map_err(|err| state.error(err))
}

/// `POST /api/diagram-image`
pub async fn diagram_from_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImageDiagramResponse>, ApiError> {
    let upload = read_image(multipart).await?;
    let file_name = store_upload(&state.uploads_dir, &upload).await?;
    let image_url = format!("/uploads/{file_name}");

    let worker = Arc::clone(&state);
    let transcription = tokio::task::spawn_blocking(move || {
        let image = ImageInput::new(&upload.mime_type, &upload.bytes);
        worker
            .workbench
            .transcribe_image(image, worker.generator.as_ref())
    })
    .await?
    .map_err(|err| state.error(err))?;

    let result = match transcription {
        ImageTranscription::Parsed(draft) => serde_json::to_value(draft)
            .map_err(|err| state.error(UmlCanvasError::Json(err)))?,
        ImageTranscription::Raw(raw) => serde_json::json!({ "raw": raw }),
    };

    Ok(Json(ImageDiagramResponse {
        message: "Image processed".to_string(),
        image_url,
        result,
    }))
}

/// `POST /api/upload-image`
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let upload = read_image(multipart).await?;
    let file_name = store_upload(&state.uploads_dir, &upload).await?;
    Ok(Json(UploadResponse {
        url: format!("/uploads/{file_name}"),
        file_name,
    }))
}

/// `GET /uploads/{name}`
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    if !is_plain_file_name(&name) {
        return Err(ApiError::NotFound);
    }
    let path = state.uploads_dir.join(&name);
    let bytes = tokio::fs::read(&path).await.map_err(|_| ApiError::NotFound)?;
    Ok(([(header::CONTENT_TYPE, mime_for(&name))], bytes).into_response())
}

/// `POST /api/export`
///
/// Takes a diagram as `{name, classes, connections}` or as
/// `{name, tables}`.
pub async fn export_project(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = body?;
    let diagram = state
        .workbench
        .load_diagram_value(payload)
        .map_err(|err| state.error(err))?;
    let project_name = diagram
        .name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "demo".to_string());

    info!(project_name = project_name.as_str(), classes = diagram.classes.len(); "Export requested");

    let bytes = state
        .workbench
        .export_spring_boot(&diagram, &project_name)
        .map_err(|err| state.error(err))?;

    let disposition = format!("attachment; filename=\"{}.zip\"", sanitize_file_name(&project_name));
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// An image read from a multipart `image` field.
#[derive(Debug)]
struct Upload {
    original_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

async fn read_image(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("image").to_string();
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| mime_for(&original_name).to_string());
        let bytes = field.bytes().await?.to_vec();
        if bytes.is_empty() {
            break;
        }
        return Ok(Upload {
            original_name,
            mime_type,
            bytes,
        });
    }
    Err(ApiError::BadRequest("No image uploaded".to_string()))
}

async fn store_upload(dir: &FsPath, upload: &Upload) -> Result<String, ApiError> {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let file_name = format!("{stamp}-{}", sanitize_file_name(&upload.original_name));

    let io_error = |err: std::io::Error| ApiError::from_error(UmlCanvasError::Io(err), false);
    tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
    tokio::fs::write(dir.join(&file_name), &upload.bytes)
        .await
        .map_err(io_error)?;

    info!(file_name = file_name.as_str(), bytes = upload.bytes.len(); "Upload stored");
    Ok(file_name)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn mime_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// All routes over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/diagram", post(generate_diagram))
        .route("/api/diagram-image", post(diagram_from_image))
        .route("/api/upload-image", post(upload_image))
        .route("/uploads/{name}", get(serve_upload))
        .route("/api/export", post(export_project))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve until the process is stopped.
pub async fn serve(config: AppConfig) -> Result<(), UmlCanvasError> {
    let address = format!("{}:{}", config.server().host(), config.server().port());
    if config.llm().api_key().is_none() {
        warn!("OPENROUTER_API_KEY is not set; generation requests will fail");
    }

    let generator = Arc::new(OpenRouterClient::new(config.llm().clone()));
    let state = Arc::new(ServerState::new(config, generator));
    tokio::fs::create_dir_all(&state.uploads_dir).await?;

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = address.as_str(); "UML diagram service listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct CannedModel {
        reply: Result<&'static str, u16>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn new(reply: Result<&'static str, u16>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn state(reply: Result<&'static str, u16>, config: AppConfig) -> AppState {
            Self::serving(Self::new(reply), config)
        }

        fn serving(model: Arc<Self>, config: AppConfig) -> AppState {
            Arc::new(ServerState::new(config, model))
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().map(|prompts| prompts.clone()).unwrap_or_default()
        }

        fn answer(&self) -> Result<String, UmlCanvasError> {
            self.reply
                .map(str::to_string)
                .map_err(|status| UmlCanvasError::Upstream {
                    status,
                    details: "quota exceeded".to_string(),
                })
        }
    }

    impl DiagramGenerator for CannedModel {
        fn generate(&self, prompt: &str) -> Result<String, UmlCanvasError> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            self.answer()
        }

        fn describe_image(&self, _image: ImageInput<'_>) -> Result<String, UmlCanvasError> {
            self.answer()
        }
    }

    fn query(text: Option<&str>) -> Result<Json<DiagramQuery>, JsonRejection> {
        Ok(Json(DiagramQuery {
            query: text.map(str::to_string),
        }))
    }

    #[tokio::test]
    async fn test_health() {
        let Json(health) = health_check().await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.uml_version, "2.5");
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let state = CannedModel::state(Ok("{}"), AppConfig::default());
        for text in [None, Some(""), Some("   ")] {
            let err = generate_diagram(State(Arc::clone(&state)), query(text))
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_generated_draft() {
        let model = CannedModel::new(Ok(r#"```json
{"classes": [{"name": "Curso"}], "connections": [{"from": "Curso", "to": "Profesor", "type": "1:n"}]}
```"#));
        let state = CannedModel::serving(Arc::clone(&model), AppConfig::default());

        let request = "CURRENT DIAGRAM CONTEXT: {} NEW USER REQUEST: A course and its instructor";
        let Json(draft) = generate_diagram(State(state), query(Some(request)))
            .await
            .unwrap();
        assert_eq!(draft.classes[0].name, "Curso");
        assert_eq!(draft.connections[0].to, "Profesor");

        // The front end embeds its own context, so the query goes out unchanged
        assert_eq!(model.prompts(), [request]);
    }

    #[tokio::test]
    async fn test_rejected_query_never_reaches_the_model() {
        let model = CannedModel::new(Ok("{}"));
        let state = CannedModel::serving(Arc::clone(&model), AppConfig::default());

        let err = generate_diagram(State(state), query(Some("  ")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_status_is_passed_through() {
        let state = CannedModel::state(Err(429), AppConfig::default());
        let err = generate_diagram(State(state), query(Some("anything")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = err.body();
        assert_eq!(body.details.as_deref(), Some("quota exceeded"));
    }

    #[tokio::test]
    async fn test_unparseable_output_returns_raw() {
        let state = CannedModel::state(Ok("Sorry, no diagram today."), AppConfig::default());
        let err = generate_diagram(State(state), query(Some("anything")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body().raw.as_deref(), Some("Sorry, no diagram today."));
    }

    #[test]
    fn test_stack_only_with_debug_errors() {
        let quiet = ApiError::from_error(UmlCanvasError::Transport("refused".to_string()), false);
        assert!(quiet.body().stack.is_none());

        let verbose = ApiError::from_error(UmlCanvasError::Transport("refused".to_string()), true);
        let body = verbose.body();
        assert_eq!(body.error, "Transport error: refused");
        assert!(body.stack.is_some());
    }

    #[tokio::test]
    async fn test_export_returns_zip() {
        let state = CannedModel::state(Ok("{}"), AppConfig::default());
        let diagram = serde_json::json!({
            "name": "Escuela",
            "classes": [{"id": 1700000000123_u64, "name": "Curso"}],
            "connections": []
        });

        let response = export_project(State(state), Ok(Json(diagram))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/zip"
        );
        assert!(
            response.headers()[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap()
                .contains("Escuela.zip")
        );
    }

    #[tokio::test]
    async fn test_export_without_classes_is_a_bad_request() {
        let state = CannedModel::state(Ok("{}"), AppConfig::default());
        let err = export_project(State(state), Ok(Json(serde_json::json!({}))))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_accepts_tables() {
        let state = CannedModel::state(Ok("{}"), AppConfig::default());
        let payload = serde_json::json!({
            "name": "Tienda",
            "tables": [{
                "id": 1700000000123_u64,
                "name": "Producto",
                "columns": [
                    {"name": "id", "type": "INT", "pk": true, "nullable": false},
                    {"name": "precio", "type": "DECIMAL(10,2)", "pk": false, "nullable": true}
                ]
            }],
            "relations": []
        });

        let response = export_project(State(state), Ok(Json(payload))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap()
                .contains("Tienda.zip")
        );
    }

    #[tokio::test]
    async fn test_export_rejects_malformed_tables() {
        let state = CannedModel::state(Ok("{}"), AppConfig::default());
        let payload = serde_json::json!({"tables": "Producto"});
        let err = export_project(State(state), Ok(Json(payload)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_uploads_are_served_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.server_mut().set_uploads_dir(dir.path());
        let state = CannedModel::state(Ok("{}"), config);

        let upload = Upload {
            original_name: "my diagram.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: b"\x89PNG".to_vec(),
        };
        let file_name = store_upload(&state.uploads_dir, &upload).await.unwrap();
        assert!(file_name.ends_with("-my_diagram.png"));

        let response = serve_upload(State(Arc::clone(&state)), Path(file_name))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let missing = serve_upload(State(state), Path("../secret".to_string())).await;
        assert!(matches!(missing, Err(ApiError::NotFound)));
    }

    #[test]
    fn test_file_name_helpers() {
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("a/b.png"));
        assert!(is_plain_file_name("1700-a.png"));
        assert_eq!(sanitize_file_name("../x y.png"), "_x_y.png");
        assert_eq!(mime_for("photo.JPG"), "image/jpeg");
    }
}
