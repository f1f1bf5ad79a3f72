use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header::CACHE_CONTROL};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::application::error::{AppError, ErrorReport};
use crate::application::scope::FetchScope;
use crate::application::views::Visit;
use crate::infra::http::cookies::{post_visit, site_visit};
use crate::domain::error::DomainError;
use crate::domain::types::CounterKey;

use super::error::{ApiError, codes};
use super::models::{PostViewsResponse, ProjectResponse, TotalViewsResponse};
use super::state::ApiState;

const PROJECT_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

/// -------- Page views --------
pub async fn get_page_views(
    State(state): State<ApiState>,
) -> Result<Json<TotalViewsResponse>, ApiError> {
    let total_views = state
        .views
        .current(&CounterKey::SiteTotal)
        .await
        .map_err(|err| ApiError::internal(codes::VIEWS, "Failed to fetch total page views", &err))?;

    Ok(Json(TotalViewsResponse { total_views }))
}

pub async fn record_page_view(
    State(state): State<ApiState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TotalViewsResponse>), ApiError> {
    let visit = site_visit(&jar);
    let total_views = state
        .views
        .record(&CounterKey::SiteTotal, visit)
        .await
        .map_err(|err| {
            ApiError::internal(codes::VIEWS, "Failed to update total page views", &err)
        })?;

    let jar = state.cookies.open_site_window(jar, visit);
    Ok((jar, Json(TotalViewsResponse { total_views })))
}

/// -------- Post views --------
pub async fn get_post_views(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
) -> Result<Json<PostViewsResponse>, ApiError> {
    let key = post_key(&slug)?;
    let views = state
        .views
        .current(&key)
        .await
        .map_err(|err| ApiError::internal(codes::VIEWS, "Failed to fetch view count", &err))?;

    Ok(Json(PostViewsResponse { views }))
}

pub async fn record_post_view(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<PostViewsResponse>), ApiError> {
    let key = post_key(&slug)?;
    let CounterKey::Post(slug) = &key else {
        return Err(ApiError::bad_request("Slug not found"));
    };

    let visit = post_visit(&jar, slug);
    let views = state.views.record(&key, visit).await.map_err(|err| {
        let message = match visit {
            Visit::FirstInWindow => "Failed to update view count",
            Visit::Repeat => "Failed to fetch view count",
        };
        ApiError::internal(codes::VIEWS, message, &err)
    })?;

    let jar = state.cookies.open_post_window(jar, slug, visit);
    Ok((jar, Json(PostViewsResponse { views })))
}

pub async fn missing_slug() -> ApiError {
    ApiError::bad_request("Slug not found")
}

fn post_key(slug: &str) -> Result<CounterKey, ApiError> {
    CounterKey::post(slug).map_err(|_| ApiError::bad_request("Slug not found"))
}

/// -------- Projects --------
pub async fn list_projects(State(state): State<ApiState>) -> Response {
    let mut scope = FetchScope::new();
    match state.content.projects(&mut scope).await {
        Ok(projects) => {
            let body: Vec<ProjectResponse> = projects.into_iter().map(Into::into).collect();
            Json(body).into_response()
        }
        Err(err) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            let mut response = (status, Json(Vec::<ProjectResponse>::new())).into_response();
            ErrorReport::from_error("infra::http::api::list_projects", status, &err)
                .attach(&mut response);
            response
        }
    }
}

pub async fn get_project(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let mut scope = FetchScope::new();
    let project = state
        .content
        .project_by_slug(&mut scope, &slug)
        .await
        .map_err(project_error)?;

    let mut response = Json(ProjectResponse::from(project)).into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(PROJECT_CACHE_CONTROL));
    Ok(response)
}

pub async fn missing_project_slug() -> ApiError {
    ApiError::bad_request("Project slug is required")
}

fn project_error(err: AppError) -> ApiError {
    match err {
        AppError::Domain(DomainError::Validation { .. }) => {
            ApiError::bad_request("Project slug is required")
        }
        AppError::Domain(DomainError::NotFound { .. }) => ApiError::not_found("Project not found"),
        other => ApiError::internal(codes::CONTENT, "Internal server error", &other),
    }
}
