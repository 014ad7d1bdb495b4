pub mod boulder;
pub mod speed_finals;
pub mod speed_qualification;

use crate::cache::CachedBody;
use ntex::web::{HttpRequest, HttpResponse};

/// Answers 304 when the client already holds this body.
pub(crate) fn cached_json(req: &HttpRequest, cached: &CachedBody) -> HttpResponse {
    let unchanged = req
        .headers()
        .get("if-none-match")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|tag| tag == cached.etag);
    if unchanged {
        return HttpResponse::NotModified()
            .header("ETag", cached.etag.as_str())
            .finish();
    }
    HttpResponse::Ok()
        .content_type("application/json")
        .header("ETag", cached.etag.as_str())
        .header("Cache-Control", "no-cache")
        .body(cached.body.clone())
}
