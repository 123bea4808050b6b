use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_secret;
use crate::models::BlogPost;
use crate::state::AppState;

#[derive(Serialize)]
pub struct BlogResponse {
    id: String,
    title: String,
    content: String,
    created_at: String,
}

impl From<BlogPost> for BlogResponse {
    fn from(p: BlogPost) -> Self {
        Self {
            id: p.id,
            title: p.title,
            content: p.content,
            created_at: p.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// GET /api/blogs
pub async fn list_blogs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlogResponse>>, AppError> {
    let posts = {
        let db = state.db.lock().unwrap();
        queries::list_blogs(&db)?
    };

    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

// POST /api/blogs
#[derive(Deserialize)]
pub struct CreateBlogRequest {
    pub secret: String,
    pub title: String,
    pub content: String,
}

pub async fn create_blog(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBlogRequest>,
) -> Result<(StatusCode, Json<BlogResponse>), AppError> {
    check_secret(&state, &body.secret)?;

    let post = BlogPost {
        id: Uuid::new_v4().to_string(),
        title: body.title,
        content: body.content,
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_blog(&db, &post)?;
    }

    Ok((StatusCode::CREATED, Json(post.into())))
}

// DELETE /api/blogs/:id
#[derive(Deserialize)]
pub struct DeleteBlogRequest {
    pub secret: String,
}

pub async fn delete_blog(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<DeleteBlogRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_secret(&state, &body.secret)?;

    let removed = {
        let db = state.db.lock().unwrap();
        queries::delete_blog(&db, &id)?
    };

    if removed {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("blog post {id}")))
    }
}
