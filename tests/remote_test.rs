//! Remote spreadsheet client tests against a local one-shot HTTP server.

use casemd::{CasemdError, ConverterBuilder, SheetsService, Source};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// 受信したリクエスト
struct CapturedRequest {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// 1回だけ応答するHTTPサーバーを起動し、エンドポイントURLを返す
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/v4/spreadsheets", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        let length: usize = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
            .map(|(_, value)| value.parse().unwrap())
            .unwrap_or(0);
        let mut request_body = vec![0; length];
        reader.read_exact(&mut request_body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
        .unwrap();
        stream.flush().unwrap();

        CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(request_body).unwrap(),
        }
    });

    (endpoint, handle)
}

fn sources() -> Vec<Source<std::io::Cursor<Vec<u8>>>> {
    vec![Source::from_bytes(
        "docs/alpha.md",
        b"## Setup\n### Env\n#### Dep\n1. Install\n* [ ] Done\n".to_vec(),
    )]
}

#[test]
fn test_create_spreadsheet_posts_payload() {
    let (endpoint, server) = serve_once("200 OK", r#"{"spreadsheetId":"sheet-42"}"#);
    let service = SheetsService::new("secret-token")
        .unwrap()
        .with_endpoint(endpoint);
    let converter = ConverterBuilder::new().build().unwrap();

    let id = converter
        .create_spreadsheet(&service, "Casemd Export", sources())
        .unwrap();
    assert_eq!(id, "sheet-42");

    let request = server.join().unwrap();
    assert_eq!(request.request_line, "POST /v4/spreadsheets HTTP/1.1");
    assert_eq!(request.header("Authorization"), Some("Bearer secret-token"));
    assert_eq!(request.header("Content-Type"), Some("application/json"));

    let payload: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(payload["properties"]["title"], "Casemd Export");
    assert_eq!(payload["sheets"][0]["properties"]["title"], "alpha");

    let rows = &payload["sheets"][0]["data"][0]["rowData"];
    assert_eq!(
        rows[0]["values"][0]["userEnteredValue"]["stringValue"],
        "Major Item"
    );
    assert_eq!(rows[1]["values"][3]["userEnteredValue"]["stringValue"], "Install");
    // 空のセルはuserEnteredValueを持たない
    assert_eq!(rows[1]["values"][5], serde_json::json!({}));
}

#[test]
fn test_create_spreadsheet_reports_http_status() {
    let (endpoint, server) = serve_once(
        "403 Forbidden",
        r#"  {"error":{"code":403,"message":"insufficient scopes"}}  "#,
    );
    let service = SheetsService::new("secret-token")
        .unwrap()
        .with_endpoint(endpoint);
    let converter = ConverterBuilder::new().build().unwrap();

    let result = converter.create_spreadsheet(&service, "Casemd Export", sources());
    match result {
        Err(CasemdError::Remote { status, message }) => {
            assert_eq!(status, Some(403));
            assert!(message.starts_with('{'));
            assert!(message.contains("insufficient scopes"));
        }
        other => panic!("Expected Remote error, got {:?}", other),
    }
    server.join().unwrap();
}

#[test]
fn test_create_spreadsheet_requires_spreadsheet_id() {
    let (endpoint, server) = serve_once("200 OK", r#"{"properties":{}}"#);
    let service = SheetsService::new("secret-token")
        .unwrap()
        .with_endpoint(endpoint);
    let converter = ConverterBuilder::new().build().unwrap();

    let result = converter.create_spreadsheet(&service, "Casemd Export", sources());
    assert!(matches!(
        result,
        Err(CasemdError::Remote { status: None, .. })
    ));
    server.join().unwrap();
}
