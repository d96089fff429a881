//! REST client for the motel housekeeping backend.
//!
//! Every authenticated request carries the bearer token given to
//! [`HousekeepingClient::with_token`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use log::{debug, error, info};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart;

use housekeeping_core::auth::{AuthApi, LoginRequest, LoginResponse};
use housekeeping_core::rooms::{Room, RoomApi, RoomId, RoomListing, RoomPatch, RoomScope};

use crate::error::{payload_detail, ClientError, Result};
use crate::types::*;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Callback receiving upload progress.
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Client for the housekeeping REST API.
#[derive(Debug, Clone)]
pub struct HousekeepingClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HousekeepingClient {
    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the API (e.g., "http://localhost:4000/api")
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attach a bearer token to every subsequent request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authorization header only; multipart requests set their own content type.
    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ClientError::auth("Invalid access token format"))?;
            headers.insert(AUTHORIZATION, auth_value);
        }
        Ok(headers)
    }

    /// Create headers for a JSON API request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = self.auth_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn error_from_body(status: reqwest::StatusCode, body: &str) -> ClientError {
        if let Some(message) = serde_json::from_str::<ApiErrorResponse>(body)
            .ok()
            .and_then(ApiErrorResponse::into_message)
        {
            return ClientError::api(status.as_u16(), message);
        }
        ClientError::api(status.as_u16(), format!("Request failed: {}", body))
    }

    /// Read the body, mapping non-success statuses to API errors.
    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::error_from_body(status, &body));
        }
        Ok(body)
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let body = Self::read_body(response).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body, e
            );
            ClientError::malformed(format!("Failed to parse response: {}", e))
        })
    }

    /// Parse an acknowledgement whose body may be empty or carry `{message}`.
    async fn parse_message(response: reqwest::Response) -> Result<Option<String>> {
        let body = Self::read_body(response).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str::<MessageResponse>(&body)
            .unwrap_or_default()
            .message)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────────

    /// Exchange staff credentials for a bearer token.
    pub async fn authenticate(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let url = self.url("/auth/login");
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rooms
    // ─────────────────────────────────────────────────────────────────────────

    /// List rooms for a scope. Accepts a bare array or a `{data}` wrapper.
    pub async fn fetch_rooms(&self, scope: RoomScope) -> Result<Vec<Room>> {
        let url = match scope {
            RoomScope::All => self.url("/room"),
            RoomScope::Date(date) => self.url(&format!("/room/status/{}", format_date(date))),
        };
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let rooms =
            RoomListing::parse(&body).map_err(|e| ClientError::malformed(payload_detail(e)))?;
        debug!("Fetched {} rooms for {}", rooms.len(), scope);
        Ok(rooms)
    }

    /// Write the changed fields of one room. The response body is ignored.
    pub async fn send_room_update(&self, id: &RoomId, patch: &RoomPatch) -> Result<()> {
        let url = self.url(&format!("/room/{}", urlencoding::encode(id.as_str())));
        let body = patch.request_body();
        debug!("PUT {}", url);

        let response = self
            .client
            .put(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        Self::read_body(response).await?;
        Ok(())
    }

    /// Copy the day's imported PMS data into the housekeeping grid.
    pub async fn request_import(&self, date: NaiveDate) -> Result<Option<String>> {
        let url = self.url("/room/import-to-housekeeping");
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&ImportRequest {
                date: format_date(date),
            })
            .send()
            .await?;

        Self::parse_message(response).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reports and room sheets
    // ─────────────────────────────────────────────────────────────────────────

    /// Upload a PDF occupancy report, streaming it in chunks.
    ///
    /// `progress` is called after each chunk is handed to the transport.
    pub async fn upload_report(
        &self,
        upload: ReportUpload,
        progress: Option<ProgressFn>,
    ) -> Result<Option<String>> {
        if upload.bytes.is_empty() || upload.file_name.trim().is_empty() {
            return Err(ClientError::invalid_request(
                "Please select both a PDF file and report date.",
            ));
        }
        if !upload.is_pdf() {
            return Err(ClientError::invalid_request(format!(
                "{} is not a PDF file",
                upload.file_name
            )));
        }

        let url = self.url("/room/upload-report");
        let total = upload.bytes.len() as u64;
        debug!("POST {} ({} bytes)", url, total);

        let chunks: Vec<Vec<u8>> = upload
            .bytes
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(<[u8]>::to_vec)
            .collect();
        let mut sent = 0_u64;
        let body_stream = stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(progress) = &progress {
                progress(UploadProgress { sent, total });
            }
            Ok::<_, std::io::Error>(chunk)
        });

        let body = reqwest::Body::wrap_stream(body_stream);
        let part = multipart::Part::stream_with_length(body, total)
            .file_name(upload.file_name.clone())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .part("report", part)
            .text("reportDate", format_date(upload.report_date));

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await?;

        let message = Self::parse_message(response).await?;
        info!(
            "Uploaded report {} for {}",
            upload.file_name,
            format_date(upload.report_date)
        );
        Ok(message)
    }

    /// Room sheets generated for a day.
    pub async fn room_sheets(&self, date: NaiveDate) -> Result<Vec<RoomSheet>> {
        let url = self.url(&format!("/room-sheets?date={}", format_date(date)));
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

#[async_trait]
impl RoomApi for HousekeepingClient {
    async fn list_rooms(&self, scope: RoomScope) -> housekeeping_core::Result<Vec<Room>> {
        Ok(self.fetch_rooms(scope).await?)
    }

    async fn update_room(&self, id: &RoomId, patch: &RoomPatch) -> housekeeping_core::Result<()> {
        Ok(self.send_room_update(id, patch).await?)
    }

    async fn import_to_housekeeping(
        &self,
        date: NaiveDate,
    ) -> housekeeping_core::Result<Option<String>> {
        Ok(self.request_import(date).await?)
    }
}

#[async_trait]
impl AuthApi for HousekeepingClient {
    async fn login(&self, request: &LoginRequest) -> housekeeping_core::Result<LoginResponse> {
        Ok(self.authenticate(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use housekeeping_core::rooms::RoomStatus;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex as StdMutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex as TokioMutex;

    #[derive(Debug, Clone)]
    struct CapturedRequest {
        method: String,
        path: String,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    }

    impl CapturedRequest {
        fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).to_string()
        }
    }

    #[derive(Debug, Clone)]
    struct MockResponse {
        status: u16,
        body: String,
    }

    fn respond(status: u16, body: &str) -> MockResponse {
        MockResponse {
            status,
            body: body.to_string(),
        }
    }

    fn header_end_offset(buffer: &[u8]) -> Option<usize> {
        buffer.windows(4).position(|window| window == b"\r\n\r\n")
    }

    fn chunked_body_complete(body: &[u8]) -> bool {
        body.starts_with(b"0\r\n\r\n") || body.windows(7).any(|window| window == b"\r\n0\r\n\r\n")
    }

    async fn read_http_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
        let mut buffer = Vec::new();
        loop {
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                return None;
            }
            buffer.extend_from_slice(&chunk[..read]);
            if header_end_offset(&buffer).is_some() {
                break;
            }
        }

        let header_end = header_end_offset(&buffer)?;
        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let mut lines = head.lines();
        let request_line = lines.next()?.to_string();
        let mut parts = request_line.split_whitespace();
        let method = parts.next()?.to_string();
        let path = parts.next()?.to_string();

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let content_length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok());
        let chunked = headers
            .get("transfer-encoding")
            .is_some_and(|v| v.eq_ignore_ascii_case("chunked"));

        let mut body = buffer[header_end + 4..].to_vec();
        loop {
            let done = match content_length {
                Some(length) => body.len() >= length,
                None if chunked => chunked_body_complete(&body),
                None => true,
            };
            if done {
                break;
            }
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Some(CapturedRequest {
            method,
            path,
            headers,
            body,
        })
    }

    fn status_text(status: u16) -> &'static str {
        match status {
            200 => "OK",
            201 => "Created",
            400 => "Bad Request",
            401 => "Unauthorized",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Error",
        }
    }

    async fn write_http_response(
        stream: &mut tokio::net::TcpStream,
        status: u16,
        body: &str,
    ) -> std::io::Result<()> {
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            status_text(status),
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.flush().await
    }

    async fn start_mock_server(
        responses: Vec<MockResponse>,
    ) -> (
        String,
        Arc<TokioMutex<Vec<CapturedRequest>>>,
        tokio::task::JoinHandle<()>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let captured = Arc::new(TokioMutex::new(Vec::<CapturedRequest>::new()));
        let scripted = Arc::new(TokioMutex::new(VecDeque::from(responses)));
        let captured_clone = Arc::clone(&captured);

        let handle = tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(value) => value,
                    Err(_) => break,
                };
                let Some(request) = read_http_request(&mut stream).await else {
                    continue;
                };
                captured_clone.lock().await.push(request);

                let outcome = scripted
                    .lock()
                    .await
                    .pop_front()
                    .unwrap_or_else(|| respond(500, r#"{"message":"unexpected request"}"#));
                let _ = write_http_response(&mut stream, outcome.status, &outcome.body).await;
            }
        });

        (format!("http://{}/api", addr), captured, handle)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn fetch_rooms_accepts_bare_array_and_sends_bearer() {
        let (base_url, captured, server) = start_mock_server(vec![respond(
            200,
            r#"[{"_id":"A","number":"101","status":"clean"},{"_id":"B","number":"102","status":"dirty"}]"#,
        )])
        .await;

        let client = HousekeepingClient::new(&base_url).unwrap().with_token("jwt-1");
        let rooms = client.fetch_rooms(RoomScope::All).await.unwrap();

        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[1].status, RoomStatus::Dirty);

        let requests = captured.lock().await;
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/api/room");
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer jwt-1")
        );
        server.abort();
    }

    #[tokio::test]
    async fn fetch_rooms_for_date_unwraps_data() {
        let (base_url, captured, server) = start_mock_server(vec![respond(
            200,
            r#"{"data":[{"_id":"A","room":"101","housekeepingStatus":"Dirty","occupancyStatus":"Occupied"}]}"#,
        )])
        .await;

        let client = HousekeepingClient::new(&base_url).unwrap();
        let rooms = client.fetch_rooms(RoomScope::Date(day())).await.unwrap();

        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].number, "101");
        assert_eq!(rooms[0].status, RoomStatus::Dirty);
        let requests = captured.lock().await;
        assert_eq!(requests[0].path, "/api/room/status/2025-05-01");
        assert!(!requests[0].headers.contains_key("authorization"));
        server.abort();
    }

    #[tokio::test]
    async fn unexpected_listing_shape_is_malformed() {
        let (base_url, _captured, server) =
            start_mock_server(vec![respond(200, r#"{"rooms":[]}"#)]).await;

        let client = HousekeepingClient::new(&base_url).unwrap();
        let err = client.fetch_rooms(RoomScope::All).await.unwrap_err();

        assert!(matches!(err, ClientError::MalformedResponse(_)));
        let core: housekeeping_core::Error = err.into();
        assert!(matches!(core, housekeeping_core::Error::MalformedPayload(_)));
        server.abort();
    }

    #[tokio::test]
    async fn backend_message_is_surfaced_verbatim() {
        let (base_url, _captured, server) = start_mock_server(vec![
            respond(404, r#"{"message":"Room not found"}"#),
            respond(500, "upstream exploded"),
        ])
        .await;

        let client = HousekeepingClient::new(&base_url).unwrap();
        let patch = RoomPatch::new("missing").with_status(RoomStatus::Clean);

        let err = client
            .send_room_update(&RoomId::from("missing"), &patch)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        let core: housekeeping_core::Error = err.into();
        assert_eq!(core.user_message(), "Room not found");

        let err = client.fetch_rooms(RoomScope::All).await.unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Request failed: upstream exploded");
            }
            other => panic!("expected API error, got {:?}", other),
        }
        server.abort();
    }

    #[tokio::test]
    async fn room_update_puts_only_changed_fields() {
        let (base_url, captured, server) =
            start_mock_server(vec![respond(200, r#"{"_id":"A","status":"dirty"}"#)]).await;

        let client = HousekeepingClient::new(&base_url).unwrap().with_token("jwt");
        let patch = RoomPatch::new("A").with_status(RoomStatus::Dirty);
        client
            .update_room(&RoomId::from("A"), &patch)
            .await
            .unwrap();

        let requests = captured.lock().await;
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, "/api/room/A");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "dirty" }));
        server.abort();
    }

    #[tokio::test]
    async fn dashboard_room_update_uses_dashboard_field_names() {
        let (base_url, captured, server) = start_mock_server(vec![respond(200, "{}")]).await;

        let room: Room = serde_json::from_value(serde_json::json!({
            "_id": "B",
            "room": "102",
            "housekeepingStatus": "Dirty"
        }))
        .unwrap();
        let mut patch = RoomPatch::for_room(&room).with_status(RoomStatus::Clean);
        patch.number = Some("102A".to_string());

        let client = HousekeepingClient::new(&base_url).unwrap().with_token("jwt");
        client.send_room_update(&room.id, &patch).await.unwrap();

        let requests = captured.lock().await;
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "housekeepingStatus": "Clean", "room": "102A" })
        );
        server.abort();
    }

    #[tokio::test]
    async fn login_returns_token() {
        let (base_url, captured, server) =
            start_mock_server(vec![respond(200, r#"{"token":"jwt-new"}"#)]).await;

        let client = HousekeepingClient::new(&base_url).unwrap();
        let response = client
            .login(&LoginRequest {
                number: "101".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.token, "jwt-new");
        let requests = captured.lock().await;
        assert_eq!(requests[0].path, "/api/auth/login");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["number"], "101");
        server.abort();
    }

    #[tokio::test]
    async fn import_posts_date_and_returns_message() {
        let (base_url, captured, server) = start_mock_server(vec![
            respond(200, r#"{"message":"Imported 12 rooms"}"#),
            respond(200, ""),
        ])
        .await;

        let client = HousekeepingClient::new(&base_url).unwrap();
        let message = client.import_to_housekeeping(day()).await.unwrap();
        assert_eq!(message.as_deref(), Some("Imported 12 rooms"));
        assert_eq!(client.import_to_housekeeping(day()).await.unwrap(), None);

        let requests = captured.lock().await;
        assert_eq!(requests[0].path, "/api/room/import-to-housekeeping");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({ "date": "2025-05-01" }));
        server.abort();
    }

    #[tokio::test]
    async fn room_sheets_parse_and_error_key_is_used() {
        let (base_url, captured, server) = start_mock_server(vec![
            respond(
                200,
                r#"[{"public_id":"room_sheets/room_sheet_101","secure_url":"https://cdn.example/101.pdf"}]"#,
            ),
            respond(400, r#"{"error":"Date is required"}"#),
        ])
        .await;

        let client = HousekeepingClient::new(&base_url).unwrap();
        let sheets = client.room_sheets(day()).await.unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].label(), "101");

        let err = client.room_sheets(day()).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Api { status: 400, ref message } if message == "Date is required"
        ));
        assert_eq!(captured.lock().await[0].path, "/api/room-sheets?date=2025-05-01");
        server.abort();
    }

    #[tokio::test]
    async fn report_upload_streams_and_reports_progress() {
        let (base_url, captured, server) =
            start_mock_server(vec![respond(200, r#"{"message":"Report uploaded"}"#)]).await;

        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.resize(UPLOAD_CHUNK_BYTES * 2 + 10, b'x');
        let total = pdf.len() as u64;

        let seen = Arc::new(StdMutex::new(Vec::<UploadProgress>::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressFn = Arc::new(move |update| sink.lock().unwrap().push(update));

        let client = HousekeepingClient::new(&base_url).unwrap().with_token("jwt");
        let message = client
            .upload_report(ReportUpload::new(day(), "report.pdf", pdf), Some(progress))
            .await
            .unwrap();
        assert_eq!(message.as_deref(), Some("Report uploaded"));

        let updates = seen.lock().unwrap().clone();
        assert_eq!(updates.len(), 3);
        assert!(updates.windows(2).all(|pair| pair[0].sent < pair[1].sent));
        assert_eq!(updates.last().map(|update| update.sent), Some(total));
        assert_eq!(updates.last().map(UploadProgress::percent), Some(100));

        let requests = captured.lock().await;
        assert_eq!(requests[0].path, "/api/room/upload-report");
        assert!(requests[0]
            .headers
            .get("content-type")
            .is_some_and(|v| v.starts_with("multipart/form-data")));
        let body = requests[0].body_text();
        assert!(body.contains("name=\"reportDate\""));
        assert!(body.contains("2025-05-01"));
        assert!(body.contains("name=\"report\"; filename=\"report.pdf\""));
        server.abort();
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected_before_sending() {
        let client = HousekeepingClient::new("http://127.0.0.1:9/api").unwrap();

        let err = client
            .upload_report(
                ReportUpload::new(day(), "notes.txt", b"hello".to_vec()),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));

        let err = client
            .upload_report(ReportUpload::new(day(), "empty.pdf", Vec::new()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }
}
