//! Template listing endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::Result;
use crate::server::state::AppState;
use crate::template::TemplateCacheStats;

/// Template listing response
#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<String>,
    pub cache: TemplateCacheStats,
}

/// GET /api/templates - List available templates and cache stats
pub async fn list_templates(State(state): State<AppState>) -> Result<Json<TemplateListResponse>> {
    let templates = state.templates().list()?;
    Ok(Json(TemplateListResponse {
        templates,
        cache: state.templates().stats(),
    }))
}
