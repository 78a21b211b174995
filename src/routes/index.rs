//! Landing page
//!
//! A plain HTML page describing the API, served at `/`. There is no
//! bundled frontend; this keeps a browser hitting the root from getting
//! a bare 404.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

pub fn router() -> Router {
    Router::new().route("/", get(serve_index))
}

async fn serve_index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Vidsplit - API Server</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 720px;
            margin: 0 auto;
            padding: 40px 20px;
            background: #16213e;
            color: #e6e6e6;
        }
        h1 { color: #00d4ff; margin-bottom: 10px; }
        code {
            background: #2a2a4a;
            padding: 2px 8px;
            border-radius: 4px;
            color: #00d4ff;
        }
        pre {
            background: #0d0d1a;
            padding: 15px;
            border-radius: 6px;
            overflow-x: auto;
        }
    </style>
</head>
<body>
    <h1>Vidsplit</h1>
    <p>Upload a video, split it into parts with FFmpeg, download the parts as one zip.</p>

    <h3>Endpoints</h3>
    <ul>
        <li><code>POST /api/jobs</code> - multipart upload: <code>file</code>, <code>mode</code> (count|size), <code>count</code> or <code>size_mb</code></li>
        <li><code>GET /api/jobs/{id}</code> - job status</li>
        <li><code>GET /api/jobs/{id}/download</code> - fetch the zip (removes the job afterwards)</li>
        <li><code>GET /api/health</code> - health check</li>
    </ul>

    <h3>Example</h3>
    <pre>curl -F file=@movie.mp4 -F mode=count -F count=4 http://localhost:3000/api/jobs</pre>
</body>
</html>"#;
