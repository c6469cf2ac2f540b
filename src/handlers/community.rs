use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    config::Config,
    error::AppError,
    extract::AppQuery,
    models::post::PostListParams,
    services::community::{self, MediaUpload},
    state::{DynMedia, DynStore},
    utils::jwt::Claims,
    views::Viewer,
};

/// List posts (newest first), 10 per page.
pub async fn list_posts(
    State(store): State<DynStore>,
    State(media): State<DynMedia>,
    Extension(viewer): Extension<Viewer>,
    AppQuery(params): AppQuery<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = community::list_posts(
        store.as_ref(),
        media.as_ref(),
        viewer,
        params.page.unwrap_or(1),
    )
    .await?;

    Ok(Json(page))
}

/// Get a single post by ID.
pub async fn get_post(
    State(store): State<DynStore>,
    State(media): State<DynMedia>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = community::get_post(store.as_ref(), media.as_ref(), viewer, id).await?;
    Ok(Json(post))
}

/// Create a new post from a multipart form with `caption` (optional) and `media` (required).
pub async fn create_post(
    State(store): State<DynStore>,
    State(media): State<DynMedia>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let mut caption: Option<String> = None;
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("caption") => {
                caption = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("media") => {
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some((content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (content_type, bytes) =
        upload.ok_or_else(|| AppError::invalid_field("media", "The media field is required."))?;
    let upload = validate_media(content_type.as_deref(), bytes, config.max_upload_bytes)?;

    let post =
        community::create_post(store.as_ref(), media.as_ref(), user_id, caption, upload).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Delete a post along with its comments and likes.
/// Requires: Login + Author.
pub async fn delete_post(
    State(store): State<DynStore>,
    State(media): State<DynMedia>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    community::delete_post(store.as_ref(), media.as_ref(), claims.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accepts JPEG, PNG and WEBP up to `max_bytes`.
fn validate_media(
    content_type: Option<&str>,
    bytes: Vec<u8>,
    max_bytes: usize,
) -> Result<MediaUpload, AppError> {
    let extension = match content_type {
        Some("image/jpeg") | Some("image/jpg") => "jpg",
        Some("image/png") => "png",
        Some("image/webp") => "webp",
        _ => {
            return Err(AppError::invalid_field(
                "media",
                "The media must be a file of type: jpeg, png, webp.",
            ));
        }
    };

    if bytes.is_empty() {
        return Err(AppError::invalid_field("media", "The media field is required."));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::invalid_field(
            "media",
            format!("The media may not be greater than {} kilobytes.", max_bytes / 1024),
        ));
    }

    Ok(MediaUpload { bytes, extension })
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::invalid_field("media", "The media is too large.");
    }
    AppError::BadRequest(err.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_and_size_rules() {
        assert_eq!(
            validate_media(Some("image/png"), vec![1; 10], 10).unwrap().extension,
            "png"
        );
        assert_eq!(
            validate_media(Some("image/webp"), vec![1], 10).unwrap().extension,
            "webp"
        );
        assert!(validate_media(Some("image/gif"), vec![1], 10).is_err());
        assert!(validate_media(None, vec![1], 10).is_err());
        assert!(validate_media(Some("image/jpeg"), vec![1; 11], 10).is_err());
        assert!(validate_media(Some("image/jpeg"), Vec::new(), 10).is_err());
    }
}
