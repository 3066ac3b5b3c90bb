use actix_web::{web, HttpResponse};
use memo_core::{
    Memo, MemoId, MemoPatch, MemoQuery, MemoService, MemoServiceResult, NewMemo, Priority,
    SqliteMemoRepository,
};
use serde::Deserialize;

use super::{ApiError, ApiResponse};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    // `/tags` is registered ahead of `/{id}` so it is never parsed as an id.
    cfg.service(
        web::scope("/memos")
            .route("", web::get().to(list_memos))
            .route("", web::post().to(create_memo))
            .route("/tags", web::get().to(list_tags))
            .route("/{id}", web::get().to(get_memo))
            .route("/{id}", web::put().to(update_memo))
            .route("/{id}", web::delete().to(delete_memo)),
    );
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    search: Option<String>,
    priority: Option<String>,
    tag: Option<String>,
}

impl ListQuery {
    /// Empty parameters and `priority=all` mean "no criterion".
    ///
    /// Returns `None` for a priority no memo can carry; such a list is empty.
    fn into_memo_query(self) -> Option<MemoQuery> {
        let present = |value: Option<String>| value.filter(|value| !value.is_empty());

        let priority = match present(self.priority) {
            None => None,
            Some(raw) if raw == "all" => None,
            Some(raw) => Some(Priority::parse(&raw)?),
        };

        Some(MemoQuery {
            search: present(self.search),
            priority,
            tag: present(self.tag),
        })
    }
}

fn parse_id(raw: &str) -> Result<MemoId, ApiError> {
    raw.trim()
        .parse::<MemoId>()
        .map_err(|_| ApiError::InvalidId(raw.to_string()))
}

/// Runs one service call on the blocking pool.
async fn run<T, F>(data: &web::Data<AppState>, operation: &'static str, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&MemoService<SqliteMemoRepository>) -> MemoServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = data.clone();
    web::block(move || call(&state.memos))
        .await
        .map_err(|err| {
            log::error!(
                "event=api_blocking_error module=api status=error operation=\"{}\" error={}",
                operation,
                err
            );
            ApiError::Database(operation)
        })?
        .map_err(|err| ApiError::from_service(err, operation))
}

/// List memos, optionally filtered by `search`, `priority` and `tag`.
async fn list_memos(
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let Some(query) = query.into_inner().into_memo_query() else {
        return Ok(HttpResponse::Ok().json(ApiResponse::ok(Vec::<Memo>::new())));
    };
    let memos = run(&data, "Failed to list memos", move |memos| {
        memos.search_memos(&query)
    })
    .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(memos)))
}

async fn list_tags(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let tags = run(&data, "Failed to list tags", |memos| memos.list_tags()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(tags)))
}

async fn get_memo(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let memo = run(&data, "Failed to get memo", move |memos| memos.get_memo(id)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(memo)))
}

async fn create_memo(
    data: web::Data<AppState>,
    body: web::Json<NewMemo>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();
    let memo = run(&data, "Failed to create memo", move |memos| {
        memos.create_memo(&input)
    })
    .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(memo)))
}

async fn update_memo(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<MemoPatch>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let patch = body.into_inner();
    let memo = run(&data, "Failed to update memo", move |memos| {
        memos.update_memo(id, &patch)
    })
    .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(memo)))
}

async fn delete_memo(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    run(&data, "Failed to delete memo", move |memos| memos.delete_memo(id)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Memo deleted successfully")))
}
