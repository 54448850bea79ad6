use actix_web::{HttpResponse, web};
use tracing::warn;

use super::error::{Error, Result};
use crate::system::store::SnapshotStore;

pub const NOT_READY: &str = "Stats not available yet";

pub async fn stats(store: web::Data<SnapshotStore>) -> Result<HttpResponse> {
    let Some(snapshot) = store.read() else {
        return Err(Error::Unavailable(NOT_READY.to_string()));
    };

    let body = serde_json::to_vec(snapshot.as_ref()).map_err(|err| {
        warn!("Error encoding stats: {err}");
        Error::Internal("Error encoding stats".to_string())
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}
