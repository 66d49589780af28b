//! HTTP handlers for the photo API.
//! Parse the request, delegate to `PhotoService`, and shape the JSON reply.

use crate::{
    errors::AppError,
    models::photo::{DeleteResponse, PhotoRecord, UploadResponse},
    services::photo_service::{PhotoService, UploadedFile},
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
};

/// Multipart field carrying the image.
const PHOTO_FIELD: &str = "photo";
/// Optional multipart text field with the caption.
const DESCRIPTION_FIELD: &str = "description";

/// `GET /api/photos` — every stored record.
pub async fn list_photos(
    State(service): State<PhotoService>,
) -> Result<Json<Vec<PhotoRecord>>, AppError> {
    let photos = service.list().await?;
    Ok(Json(photos))
}

/// `POST /api/upload` — multipart `photo` file plus optional `description`.
pub async fn upload_photo(
    State(service): State<PhotoService>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file = None;
    let mut description = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(PHOTO_FIELD) => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some(DESCRIPTION_FIELD) => {
                description = Some(field.text().await.map_err(multipart_error)?);
            }
            other => tracing::debug!(field = ?other, "ignoring unknown multipart field"),
        }
    }

    let record = service.upload(file, description).await?;
    Ok(Json(UploadResponse {
        success: true,
        s3_url: record.s3_url,
    }))
}

/// `DELETE /api/photos/{image_id}`
pub async fn delete_photo(
    State(service): State<PhotoService>,
    Path(image_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    service.delete(&image_id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// Client-side multipart problems keep axum's status and text; a body that
/// fails mid-read is a server-side upload failure.
fn multipart_error(err: MultipartError) -> AppError {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(error = %err, "reading multipart body failed");
        return AppError::new(status, "Upload failed");
    }
    AppError::new(status, err.body_text())
}

#[cfg(test)]
mod tests {
    use crate::{routes::routes::routes, services::photo_service::tests::service};
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use bytes::Bytes;
    use serde_json::Value;
    use std::{io, sync::atomic::Ordering};
    use tower::ServiceExt;

    const BOUNDARY: &str = "gallery-test-boundary";

    enum Part<'a> {
        File { name: &'a str, file_name: &'a str, body: &'a [u8] },
        Text { name: &'a str, value: &'a str },
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File { name, file_name, body: bytes } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: image/jpeg\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.expect("router response");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn upload_req(parts: &[Part<'_>]) -> Request<Body> {
        Request::post("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn get_photos() -> Request<Body> {
        Request::get("/api/photos").body(Body::empty()).unwrap()
    }

    fn delete_req(id: &str) -> Request<Body> {
        Request::delete(format!("/api/photos/{id}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn upload_list_delete_scenario() {
        let (svc, _, blobs) = service();
        let app = routes().with_state(svc);

        let (status, body) = send(&app, get_photos()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));

        let (status, body) = send(
            &app,
            upload_req(&[
                Part::File { name: "photo", file_name: "cat.jpg", body: b"JPEGDATA" },
                Part::Text { name: "description", value: "my cat" },
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let url = body["s3Url"].as_str().unwrap().to_string();
        assert!(url.ends_with("/cat.jpg"));
        assert_eq!(&blobs.get("cat.jpg").unwrap().0[..], b"JPEGDATA");

        let (_, body) = send(&app, get_photos()).await;
        let photos = body.as_array().unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0]["description"], "my cat");
        assert_eq!(photos[0]["s3Url"], url.as_str());
        let id = photos[0]["imageID"].as_str().unwrap().to_string();
        assert!(!id.is_empty());

        let (status, body) = send(&app, delete_req(&id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "success": true }));

        let (_, body) = send(&app, get_photos()).await;
        assert_eq!(body, serde_json::json!([]));
        assert!(blobs.get("cat.jpg").is_none());
    }

    #[tokio::test]
    async fn upload_without_photo_field_is_bad_request() {
        let (svc, metadata, blobs) = service();
        let app = routes().with_state(svc);

        let (status, body) =
            send(&app, upload_req(&[Part::Text { name: "description", value: "lonely" }])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(blobs.puts.load(Ordering::SeqCst), 0);
        assert_eq!(metadata.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upload_with_non_multipart_body_is_rejected() {
        let (svc, _, blobs) = service();
        let app = routes().with_state(svc);

        let req = Request::post("/api/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
        assert_eq!(blobs.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_filenames_share_url() {
        let (svc, _, _) = service();
        let app = routes().with_state(svc);

        for caption in ["one", "two"] {
            let (status, _) = send(
                &app,
                upload_req(&[
                    Part::File { name: "photo", file_name: "dup.jpg", body: b"x" },
                    Part::Text { name: "description", value: caption },
                ]),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send(&app, get_photos()).await;
        let photos = body.as_array().unwrap();
        assert_eq!(photos.len(), 2);
        assert_ne!(photos[0]["imageID"], photos[1]["imageID"]);
        assert_eq!(photos[0]["s3Url"], photos[1]["s3Url"]);
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let (svc, _, _) = service();
        let app = routes().with_state(svc);

        let (status, body) = send(&app, delete_req("does-not-exist")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn store_failures_are_opaque_500s() {
        let (svc, metadata, blobs) = service();
        let app = routes().with_state(svc);

        metadata.fail_scan.store(true, Ordering::SeqCst);
        let (status, body) = send(&app, get_photos()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch photos");
        metadata.fail_scan.store(false, Ordering::SeqCst);

        blobs.fail_put.store(true, Ordering::SeqCst);
        let (status, body) = send(
            &app,
            upload_req(&[Part::File { name: "photo", file_name: "cat.jpg", body: b"x" }]),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upload failed");
        assert!(!body["error"].as_str().unwrap().contains("injected"));
        blobs.fail_put.store(false, Ordering::SeqCst);

        let (_, body) = send(
            &app,
            upload_req(&[Part::File { name: "photo", file_name: "cat.jpg", body: b"x" }]),
        )
        .await;
        assert_eq!(body["success"], true);
        let (_, body) = send(&app, get_photos()).await;
        let id = body[0]["imageID"].as_str().unwrap().to_string();

        blobs.fail_delete.store(true, Ordering::SeqCst);
        let (status, body) = send(&app, delete_req(&id)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Delete failed");
        assert!(!body["error"].as_str().unwrap().contains("injected"));
    }

    #[tokio::test]
    async fn broken_body_stream_is_opaque_upload_failure() {
        let (svc, metadata, blobs) = service();
        let app = routes().with_state(svc);

        let head = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"photo\"; filename=\"cat.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\nJPEG"
        );
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from(head)),
            Err(io::Error::other("connection reset")),
        ];
        let req = Request::post("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from_stream(futures::stream::iter(chunks)))
            .unwrap();

        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upload failed");
        assert_eq!(blobs.puts.load(Ordering::SeqCst), 0);
        assert_eq!(metadata.puts.load(Ordering::SeqCst), 0);
    }
}
