//! The resume render endpoint. Normalizes the stored form data and hands
//! it to the selected layout.

use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::documents::handlers::stored_selection;
use crate::documents::store;
use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::state::AppState;
use crate::templates::order::{parse_id_list, SectionOrder};
use crate::templates::standard::StandardResume;
use crate::templates::theme::{palette, theme_names, DEFAULT_THEME};
use crate::templates::ResumeTemplate;

#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    pub template: Option<String>,
    pub theme: Option<String>,
    /// Comma-separated section ids for the main area.
    pub main: Option<String>,
    /// Comma-separated section ids for the sidebar area.
    pub sidebar: Option<String>,
}

/// GET /api/documents/resume/:uuid/render?template=&theme=
pub async fn handle_render_resume(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Query(query): Query<RenderQuery>,
) -> Result<Html<String>, AppError> {
    let document = store::get_document(&state.db, uuid).await?;
    if document.kind() != Some(DocumentKind::Resume) {
        return Err(AppError::NotFound(format!("Resume {uuid} not found")));
    }
    let (_, selection) = stored_selection(&document)?;

    let template = match query.template.as_deref() {
        None => ResumeTemplate::Gazette,
        Some(name) => ResumeTemplate::parse(name)
            .ok_or_else(|| AppError::Validation(format!("unknown template: {name}")))?,
    };

    let theme_name = query.theme.as_deref().unwrap_or(DEFAULT_THEME);
    let theme = palette(theme_name).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown theme: {theme_name} (available: {})",
            theme_names().join(", ")
        ))
    })?;

    let order = match (&query.main, &query.sidebar) {
        (None, None) => template.default_order(),
        (main, sidebar) => SectionOrder::from_lists(
            main.as_deref().map(parse_id_list).unwrap_or_default(),
            sidebar.as_deref().map(parse_id_list).unwrap_or_default(),
        )
        .map_err(AppError::Validation)?,
    };

    let resume = StandardResume::from_form(&document.form_data, &selection);
    Ok(Html(template.render(&resume, theme, &order)))
}
