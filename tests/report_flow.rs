//! End-to-end report flow against a local stub server: URL composition,
//! fetch, outcome classification, and single-flight cancellation.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sippy::client::{Client, ReportFetcher};
use sippy::query::{self, ReportFilter};
use sippy::report::{cancelled_data_table, column_labels, no_data_table, ReportState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn filter() -> ReportFilter {
    ReportFilter::new(
        "4.13",
        date(2023, 4, 1),
        date(2023, 4, 28),
        "4.14",
        date(2023, 8, 1),
        date(2023, 8, 7),
    )
}

/// Serve exactly one request with a canned response, then close.
async fn serve_once(listener: TcpListener, status_line: &'static str, body: String) {
    let (mut sock, _) = listener.accept().await.unwrap();

    // Drain the request headers before answering.
    let mut buf = vec![0u8; 4096];
    let mut read = 0;
    loop {
        let n = sock.read(&mut buf[read..]).await.unwrap();
        read += n;
        if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if read == buf.len() {
            buf.resize(read + 4096, 0);
        }
    }

    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    sock.write_all(response.as_bytes()).await.unwrap();
    sock.flush().await.unwrap();
}

#[tokio::test]
async fn report_fetch_normalizes_columns() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = r#"{"rows":[
        {"component":"[sig-auth]","columns":[
            {"network":"ovn","arch":"amd64","platform":"aws","status":0},
            {"network":"sdn","arch":"amd64","platform":"aws","status":-2}]},
        {"component":"[sig-node]","columns":[
            {"network":"ovn","arch":"amd64","platform":"aws","status":3},
            {"network":"sdn","arch":"amd64","platform":"aws","status":1}]}
    ]}"#;
    tokio::spawn(serve_once(listener, "200 OK", body.to_string()));

    let url = query::main_report_url(&format!("http://{addr}"), &filter());
    assert!(url.contains("baseStartTime=2023-04-01T00:00:00Z"));

    let fetcher = ReportFetcher::new(Client::new());
    let ReportState::Ready(report) = fetcher.fetch(&url).await else {
        panic!("expected ready report");
    };
    assert_eq!(
        column_labels(Some(&report)),
        vec!["ovn amd64 aws", "sdn amd64 aws"]
    );
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[1].subject(), Some("[sig-node]"));
}

#[tokio::test]
async fn empty_200_yields_empty_outcome() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_once(listener, "200 OK", r#"{"rows":[]}"#.to_string()));

    let fetcher = ReportFetcher::new(Client::new());
    let url = query::main_report_url(&format!("http://{addr}"), &filter());
    let state = fetcher.fetch(&url).await;
    assert_eq!(state, ReportState::Empty);
    assert_eq!(state.table(), no_data_table());
}

#[tokio::test]
async fn non_200_yields_failure_with_status_and_url() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_once(
        listener,
        "503 Service Unavailable",
        String::new(),
    ));

    let fetcher = ReportFetcher::new(Client::new());
    let url = query::main_report_url(&format!("http://{addr}"), &filter());
    let ReportState::Failed(message) = fetcher.fetch(&url).await else {
        panic!("expected failure");
    };
    assert!(message.contains("API server returned 503"));
    assert!(message.contains(&url));
}

#[tokio::test]
async fn malformed_body_yields_failure_with_url() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_once(listener, "200 OK", "not json".to_string()));

    let fetcher = ReportFetcher::new(Client::new());
    let url = query::main_report_url(&format!("http://{addr}"), &filter());
    let ReportState::Failed(message) = fetcher.fetch(&url).await else {
        panic!("expected failure");
    };
    assert!(message.contains("API call failed"));
    assert!(message.contains(&url));
}

#[tokio::test]
async fn second_request_cancels_first() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept connections and hold them open without ever responding.
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });

    let fetcher = Arc::new(ReportFetcher::new(Client::new()));
    let url = query::main_report_url(&format!("http://{addr}"), &filter());

    let first = {
        let fetcher = Arc::clone(&fetcher);
        let url = url.clone();
        tokio::spawn(async move { fetcher.fetch(&url).await })
    };
    // Let the first request get in flight before starting the second.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = {
        let fetcher = Arc::clone(&fetcher);
        let url = url.clone();
        tokio::spawn(async move { fetcher.fetch(&url).await })
    };

    let first_state = first.await.unwrap();
    assert_eq!(first_state, ReportState::Cancelled);
    assert_eq!(first_state.table(), cancelled_data_table());

    // Manual cancel resolves the second the same way.
    tokio::time::sleep(Duration::from_millis(50)).await;
    fetcher.lifecycle().cancel();
    assert_eq!(second.await.unwrap(), ReportState::Cancelled);
}
