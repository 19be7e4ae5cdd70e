/// User CRUD and avatar upload endpoints
use crate::{
    avatar::resize,
    context::AppContext,
    error::{DirectoryError, DirectoryResult},
    user_store::{User, UserId, UserInput, UserPage},
    validation::{validate_user_input, validation_errors_to_directory_error},
};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Multipart field carrying the avatar image
pub const AVATAR_FIELD: &str = "image";

/// Allowance for multipart framing on top of the file size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build user routes
pub fn routes(max_avatar_bytes: usize) -> Router<AppContext> {
    Router::new()
        .route("/user", get(list_users).post(upsert_user))
        .route("/user/delete", post(delete_user))
        .route("/user/:id", get(get_user))
        .route(
            "/user/:id/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(
                max_avatar_bytes.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
}

/// Query parameters for listing users
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page_num: Option<i64>,
    pub page_size: Option<i64>,
}

/// Body of a delete request
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub user_id: UserId,
}

/// Avatar upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct AvatarUploadResponse {
    pub url: String,
}

/// List one page of users
async fn list_users(
    State(ctx): State<AppContext>,
    Query(query): Query<ListQuery>,
) -> DirectoryResult<Json<UserPage>> {
    let page_num = query.page_num.unwrap_or(1);
    let page_size = query
        .page_size
        .unwrap_or(ctx.config.pagination.default_page_size);

    let page = ctx.users.get_users(page_num, page_size).await?;
    Ok(Json(page))
}

/// Get a single user
async fn get_user(
    State(ctx): State<AppContext>,
    Path(id): Path<UserId>,
) -> DirectoryResult<Json<User>> {
    ctx.users
        .get_user_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| DirectoryError::NotFound(format!("User not found: {}", id)))
}

/// Insert or replace a user
///
/// A saved record whose avatar cleanup failed is reported as
/// `AvatarCleanupFailed`, distinct from a failed save.
async fn upsert_user(
    State(ctx): State<AppContext>,
    Json(input): Json<UserInput>,
) -> DirectoryResult<Json<User>> {
    validate_user_input(&input).map_err(validation_errors_to_directory_error)?;

    let outcome = ctx.users.upsert_user(input).await?;
    let user = outcome.into_result()?;

    tracing::info!(user_id = user.id, "user saved");
    Ok(Json(user))
}

/// Delete a user; unknown ids are not an error
async fn delete_user(
    State(ctx): State<AppContext>,
    Json(request): Json<DeleteRequest>,
) -> DirectoryResult<StatusCode> {
    ctx.users.delete_user(request.user_id).await?;
    Ok(StatusCode::OK)
}

/// Upload an avatar image for a user
///
/// Accepts a multipart form with exactly one file under `image`. Returns the
/// relative URL the client should store on the user record.
async fn upload_avatar(
    State(ctx): State<AppContext>,
    Path(user_id): Path<UserId>,
    mut multipart: Multipart,
) -> DirectoryResult<Json<AvatarUploadResponse>> {
    let _permit = ctx.upload_gate.try_acquire(user_id)?;
    let max_bytes = ctx.config.uploads.max_avatar_bytes;

    let mut upload: Option<(Vec<u8>, Option<String>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.file_name().is_none() && field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        if field.name() != Some(AVATAR_FIELD) || upload.is_some() {
            return Err(DirectoryError::Validation(
                "Exactly one file is accepted, under field 'image'".to_string(),
            ));
        }

        let file_name = field.file_name().map(String::from);
        let data = field.bytes().await.map_err(multipart_error)?;
        if data.len() > max_bytes {
            return Err(DirectoryError::PayloadTooLarge(format!(
                "Avatar exceeds maximum size of {} bytes",
                max_bytes
            )));
        }
        upload = Some((data.to_vec(), file_name));
    }

    let (mut data, file_name) = upload.ok_or_else(|| {
        DirectoryError::Validation("Missing file field 'image'".to_string())
    })?;

    if let Some(max_side) = ctx.config.uploads.avatar_max_dimension {
        data = tokio::task::spawn_blocking(move || resize::downscale(data, max_side))
            .await
            .map_err(|e| DirectoryError::Internal(format!("Avatar resize task failed: {}", e)))?;
    }

    let url = ctx
        .users
        .upload_avatar(user_id, &data, file_name.as_deref())
        .await?;

    Ok(Json(AvatarUploadResponse { url }))
}

/// Map a multipart parsing error onto the directory error space
fn multipart_error(e: MultipartError) -> DirectoryError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DirectoryError::PayloadTooLarge(e.body_text())
    } else {
        DirectoryError::Validation(format!("Could not parse multipart form: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_created() {
        let _router = routes(2_000_000);
    }

    #[test]
    fn test_list_query_uses_camel_case() {
        let query: ListQuery = serde_json::from_str(r#"{"pageNum": 2, "pageSize": 5}"#).unwrap();
        assert_eq!(query.page_num, Some(2));
        assert_eq!(query.page_size, Some(5));
    }

    #[test]
    fn test_delete_request_uses_camel_case() {
        let request: DeleteRequest = serde_json::from_str(r#"{"userId": 4}"#).unwrap();
        assert_eq!(request.user_id, 4);
    }
}
