//! Defines routes for the photo gallery API.
//!
//! ## Structure
//! - **Photo endpoints**
//!   - `GET    /api/photos`            — list every photo record
//!   - `POST   /api/upload`            — multipart upload (`photo`, `description`)
//!   - `DELETE /api/photos/{image_id}` — delete record and blob
//!
//! - **Probes**
//!   - `GET /healthz`, `GET /readyz`
//!
//! Blob and static file serving are mounted by `main` on top of this router.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        photo_handlers::{delete_photo, list_photos, upload_photo},
    },
    services::photo_service::PhotoService,
};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Build the API router. The router carries `PhotoService` as shared state.
pub fn routes() -> Router<PhotoService> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/photos", get(list_photos))
        .route("/api/upload", post(upload_photo))
        .route("/api/photos/{image_id}", delete(delete_photo))
}
