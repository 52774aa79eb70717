use tokio::fs;
use tracing::debug;
use valet_config::UiConfig;
use valet_http::Response;

/// Served when no on-disk document exists at any candidate path.
const FALLBACK_INDEX: &str = "<!DOCTYPE html>\n\
<html>\n\
<head><meta charset=\"utf-8\"><title>valet</title></head>\n\
<body>\n\
<h1>valet</h1>\n\
<p>Web assets are not installed. The API is available under /api/.</p>\n\
</body>\n\
</html>\n";

/// Serves the web UI document, falling through the configured candidate
/// locations in order and finally an inline document.
pub(crate) async fn serve_index(ui: &UiConfig) -> Response {
    for candidate in ui.index_candidates() {
        match fs::read_to_string(candidate).await {
            Ok(document) => {
                debug!(
                    target: "valet::assets",
                    path = %candidate,
                    "Serving web document"
                );
                return Response::html(200, document);
            }
            Err(_) => continue,
        }
    }
    Response::html(200, FALLBACK_INDEX.to_string())
}
