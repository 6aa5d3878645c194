//! Route handlers.

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::media::mime_from_name;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use glowworm_core::{recommend, AnalysisOutcome, FileRecord, MediaFile};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_USER: &str = "anonymous";

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "Glow Worm media analysis",
        "version": glowworm_core::VERSION,
        "llmProvider": state.llm_provider,
        "sandbox": state.sandbox_enabled,
        "videoGeneration": state.video.is_some(),
        "endpoints": {
            "POST /api/analyze": "Analyze one uploaded file",
            "POST /api/batch-analyze": "Analyze several uploaded files",
            "POST /api/generate-video": "Start a video generation",
            "GET /api/check-video": "Poll a video generation",
            "POST /api/search": "Rank file records against a query",
            "POST /api/recommendations": "Records similar to one record"
        }
    }))
}

/// Files and the optional `userId` field of a multipart upload.
struct Upload {
    files: Vec<MediaFile>,
    user_id: String,
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    let mut files = Vec::new();
    let mut user_id = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload.bin").to_string();
                let mime_type = field
                    .content_type()
                    .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
                    .map(str::to_string)
                    .unwrap_or_else(|| mime_from_name(&name).to_string());
                let bytes = field.bytes().await?;
                files.push(MediaFile::new(name, mime_type, bytes.to_vec()));
            }
            Some("userId") => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    user_id = Some(value.trim().to_string());
                }
            }
            _ => {}
        }
    }

    Ok(Upload {
        files,
        user_id: user_id.unwrap_or_else(|| DEFAULT_USER.to_string()),
    })
}

pub async fn analyze(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<Value>> {
    let Upload { files, user_id } = read_upload(multipart).await?;
    let file = files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    tracing::info!(
        file = %file.descriptor.name,
        size_mb = %format!("{:.1}", file.descriptor.size_mb()),
        "Analyze request"
    );

    let outcome = state.analyzer.analyze(&file, &user_id).await;
    let degraded = match &outcome {
        AnalysisOutcome::Degraded(_, reason) => Some(reason.clone()),
        _ => None,
    };
    let mut result = outcome.into_result()?;
    state.analyzer.add_suggested_tags(&mut result).await;

    let mut metadata = json!({
        "fileName": file.descriptor.name,
        "fileSize": file.descriptor.byte_size,
        "fileType": file.descriptor.mime_type,
        "processingMethod": result.processing_method,
        "complexity": result.complexity,
        "processingTime": result.processing_time,
    });
    if let Some(reason) = degraded {
        metadata["degraded"] = Value::String(reason);
    }

    Ok(Json(json!({
        "success": true,
        "analysis": result,
        "metadata": metadata,
    })))
}

pub async fn batch_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let Upload { files, user_id } = read_upload(multipart).await?;
    if files.is_empty() {
        return Err(ApiError::BadRequest("No files provided".to_string()));
    }

    tracing::info!(files = files.len(), "Batch analyze request");
    let results = state.batch.batch_analyze(files, &user_id).await;
    Ok(Json(json!({ "success": true, "results": results })))
}

#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    #[serde(default)]
    prompt: Option<String>,
}

pub async fn generate_video(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let prompt = request
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Prompt is required".to_string()))?;
    let generator = state.video_generator()?;

    let generation = generator.generate(&prompt).await?;
    Ok(Json(json!({
        "success": true,
        "generationId": generation.id,
        "status": generation.state,
        "message": "Video generation started",
    })))
}

#[derive(Debug, Deserialize)]
pub struct CheckVideoQuery {
    id: Option<String>,
}

pub async fn check_video(
    State(state): State<AppState>,
    Query(query): Query<CheckVideoQuery>,
) -> ApiResult<Json<Value>> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Generation ID is required".to_string()))?;
    let generator = state.video_generator()?;

    let generation = generator.status(&id).await?;
    Ok(Json(json!({
        "success": true,
        "id": generation.id,
        "status": generation.state,
        "videoUrl": generation.video_url,
        "thumbnailUrl": generation.thumbnail_url,
        "prompt": generation.prompt,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    files: Vec<FileRecord>,
}

pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let query = request.query.unwrap_or_default();
    let results = state.search.search(&query, &request.files).await?;
    Ok(Json(json!({ "results": results })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsRequest {
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    files: Vec<FileRecord>,
}

pub async fn recommendations(
    payload: Result<Json<RecommendationsRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let file_id = request
        .file_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("File ID is required".to_string()))?;
    let recommendations = recommend(&file_id, &request.files)?;
    Ok(Json(json!({ "recommendations": recommendations })))
}
