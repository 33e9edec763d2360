use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    routing::post,
    Json, Router,
};
use tracing::info;

use super::json_body;
use crate::dataset::Table;
use crate::models::{AppState, SheetRequest, TablePreview};
use crate::types::{AppError, AppResult};

/// Rows returned by `/upload_csv` after slicing
pub const CSV_PREVIEW_ROWS: usize = 5;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload_csv", post(upload_csv))
        .route("/connect_google_sheet", post(connect_google_sheet))
        .with_state(state)
}

fn parse_row_field(name: &str, text: &str) -> AppResult<Option<usize>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| AppError::InvalidRequest(format!("{} must be a non-negative integer", name)))
}

async fn upload_csv(
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<TablePreview>> {
    let mut multipart = multipart.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let mut file: Option<Bytes> = None;
    let mut start_row = None;
    let mut end_row = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::InvalidRequest(e.body_text()))?,
                );
            }
            "start_row" | "end_row" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
                let value = parse_row_field(&name, &text)?;
                if name == "start_row" {
                    start_row = value;
                } else {
                    end_row = value;
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::InvalidRequest("No file provided.".to_string()))?;
    info!(bytes = file.len(), ?start_row, ?end_row, "CSV upload received");

    let table = Table::from_csv(&file)?;
    let preview = table
        .slice(start_row.unwrap_or(0), end_row)
        .head(CSV_PREVIEW_ROWS);

    Ok(Json(preview.into()))
}

async fn connect_google_sheet(
    State(state): State<AppState>,
    payload: Result<Json<SheetRequest>, JsonRejection>,
) -> AppResult<Json<TablePreview>> {
    let request = json_body(payload)?;

    let sheet_url = request
        .sheet_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Sheet URL missing.".to_string()))?;

    let sheets = state.sheets.as_ref().ok_or_else(|| {
        AppError::Internal("Unexpected error: Google Sheets credentials are not configured".to_string())
    })?;

    let table = sheets.fetch_table(&sheet_url).await?;
    info!(rows = table.rows.len(), columns = table.columns.len(), "Google Sheet loaded");

    let preview = table.slice(request.start_row.unwrap_or(0), request.end_row);
    Ok(Json(preview.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SheetsClient;
    use crate::dataset::sheets::StaticToken;
    use crate::routes::test_support::{json_request, send_json, test_state};
    use axum::{body::Body, http::{Request, StatusCode}};
    use serde_json::json;
    use std::sync::Arc;

    const BOUNDARY: &str = "X-ENTITY-LENS-BOUNDARY";

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match filename {
                Some(filename) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/csv\r\n\r\n",
                    name, filename
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::post("/upload_csv")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    const CSV: &str = "company,city\nA,1\nB,2\nC,3\nD,4\nE,5\nF,6\nG,7\n";

    #[tokio::test]
    async fn test_upload_csv_previews_first_five_rows() {
        let app = router(test_state());
        let (status, body) =
            send_json(app, multipart_request(&[("file", Some("companies.csv"), CSV)])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"], json!(["company", "city"]));
        let preview = body["preview"].as_array().unwrap();
        assert_eq!(preview.len(), 5);
        assert_eq!(preview[0], json!({ "company": "A", "city": 1 }));
    }

    #[tokio::test]
    async fn test_upload_csv_applies_row_range() {
        let app = router(test_state());
        let request = multipart_request(&[
            ("start_row", None, "5"),
            ("end_row", None, "100"),
            ("file", Some("companies.csv"), CSV),
        ]);
        let (status, body) = send_json(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["preview"],
            json!([{ "company": "F", "city": 6 }, { "company": "G", "city": 7 }])
        );
    }

    #[tokio::test]
    async fn test_upload_without_file_is_bad_request() {
        let app = router(test_state());
        let (status, body) = send_json(app, multipart_request(&[("start_row", None, "1")])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file provided.");
    }

    #[tokio::test]
    async fn test_upload_bad_row_number_is_bad_request() {
        let app = router(test_state());
        let request = multipart_request(&[("end_row", None, "-1"), ("file", Some("c.csv"), CSV)]);
        let (status, body) = send_json(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "end_row must be a non-negative integer");
    }

    #[tokio::test]
    async fn test_sheet_url_required() {
        let app = router(test_state());
        let (status, body) =
            send_json(app, json_request("/connect_google_sheet", r#"{"start_row": 1}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Sheet URL missing.");
    }

    #[tokio::test]
    async fn test_sheet_not_found_is_404() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v4/spreadsheets/missing-id")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":404,"message":"Requested entity was not found."}}"#)
            .create_async()
            .await;

        let mut state = test_state();
        state.sheets = Some(Arc::new(SheetsClient::new(
            reqwest::Client::new(),
            Arc::new(StaticToken("t".into())),
            server.url(),
        )));

        let (status, body) = send_json(
            router(state),
            json_request(
                "/connect_google_sheet",
                r#"{"sheet_url": "https://docs.google.com/spreadsheets/d/missing-id/edit"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Spreadsheet not found. Check URL and access.");
    }

    #[tokio::test]
    async fn test_sheet_rows_sliced_and_clamped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v4/spreadsheets/abc123")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"sheets":[{"properties":{"title":"Sheet1"}}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/v4/spreadsheets/abc123/values/'Sheet1'")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"values":[["name"],["Acme"],["Globex"],["Initech"]]}"#)
            .create_async()
            .await;

        let mut state = test_state();
        state.sheets = Some(Arc::new(SheetsClient::new(
            reqwest::Client::new(),
            Arc::new(StaticToken("t".into())),
            server.url(),
        )));

        let (status, body) = send_json(
            router(state),
            json_request(
                "/connect_google_sheet",
                r#"{"sheet_url": "https://docs.google.com/spreadsheets/d/abc123/edit", "start_row": 1, "end_row": 50}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"], json!(["name"]));
        assert_eq!(body["preview"], json!([{ "name": "Globex" }, { "name": "Initech" }]));
    }
}
