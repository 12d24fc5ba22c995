use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use bookfind_client::{CatalogClient, ConnectorFn, DynStream, FetchError};

// Connector that hands out the client side of a duplex pair exactly once.
fn one_shot_connector(stream: tokio::io::DuplexStream) -> Arc<ConnectorFn> {
    let shared = Arc::new(Mutex::new(Some(stream)));
    Arc::new(move |_host: &str, _port: u16| {
        let cli = shared.lock().unwrap().take().ok_or(FetchError::Connection);
        Box::pin(async move { cli.map(|s| Box::pin(s) as DynStream) })
            as Pin<Box<dyn Future<Output = Result<DynStream, FetchError>> + Send>>
    })
}

fn http_response(code: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {} WHATEVER\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
        code,
        body.len(),
        body
    )
}

#[tokio::test]
async fn search_maps_success_response() {
    let (mut server, client_side) = tokio::io::duplex(1 << 16);
    let mut client = CatalogClient::new_test(one_shot_connector(client_side));
    client.header_read_chunk = 1;
    let fut = client.search("dune");

    let srv = async move {
        let mut buf = [0u8; 512];
        let _ = server.read(&mut buf).await.unwrap_or(0);
        let body = r#"{"items":[
            {"id":"v1","volumeInfo":{"title":"Dune","authors":["Frank Herbert"]}},
            {"id":"v2","volumeInfo":{"title":"Dune Messiah"}}
        ]}"#;
        server
            .write_all(http_response(200, body).as_bytes())
            .await
            .unwrap();
    };

    let (res, _) = tokio::join!(fut, srv);
    let results = res.expect("search ok");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title.as_deref(), Some("Dune"));
    assert_eq!(results[0].authors, vec!["Frank Herbert".to_string()]);
    assert_eq!(results[1].authors, vec!["Unknown Author".to_string()]);
}

#[tokio::test]
async fn request_carries_fixed_params_and_encoded_query() {
    let (mut server, client_side) = tokio::io::duplex(1 << 16);
    let client = CatalogClient::new_test(one_shot_connector(client_side));
    let fut = client.search("space opera");

    let srv = async move {
        let mut head = Vec::new();
        let mut buf = [0u8; 256];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = server.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let head = String::from_utf8(head).unwrap();
        server
            .write_all(http_response(200, "{}").as_bytes())
            .await
            .unwrap();
        head
    };

    let (res, head) = tokio::join!(fut, srv);
    assert!(res.expect("search ok").is_empty());
    assert!(head.starts_with(
        "GET /books/v1/volumes?langRestrict=en&maxResults=16&q=space%20opera HTTP/1.1\r\n"
    ));
    assert!(head.contains("host: www.googleapis.com\r\n"));
    assert!(head.contains("connection: close\r\n"));
}

#[tokio::test]
async fn non_2xx_surfaces_status() {
    let (mut server, client_side) = tokio::io::duplex(1 << 16);
    let client = CatalogClient::new_test(one_shot_connector(client_side));
    let fut = client.search("dune");

    let srv = async move {
        let mut buf = [0u8; 512];
        let _ = server.read(&mut buf).await.unwrap_or(0);
        server
            .write_all(http_response(500, "").as_bytes())
            .await
            .unwrap();
    };

    let (res, _) = tokio::join!(fut, srv);
    assert_eq!(res, Err(FetchError::Status(500)));
}

#[tokio::test]
async fn unparsable_body_is_zero_results_not_an_error() {
    let (mut server, client_side) = tokio::io::duplex(1 << 16);
    let client = CatalogClient::new_test(one_shot_connector(client_side));
    let fut = client.search("dune");

    let srv = async move {
        let mut buf = [0u8; 512];
        let _ = server.read(&mut buf).await.unwrap_or(0);
        server
            .write_all(http_response(200, "<html>definitely not json</html>").as_bytes())
            .await
            .unwrap();
    };

    let (res, _) = tokio::join!(fut, srv);
    assert_eq!(res, Ok(Vec::new()));
}

#[tokio::test]
async fn oversize_declared_body_errors() {
    let (mut server, client_side) = tokio::io::duplex(1 << 16);
    let client = CatalogClient::new_test(one_shot_connector(client_side));
    let fut = client.search("dune");

    let srv = async move {
        let mut buf = [0u8; 512];
        let _ = server.read(&mut buf).await.unwrap_or(0);
        let resp = format!(
            "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n",
            bookfind_api::limits::MAX_RESPONSE_BYTES + 1
        );
        server.write_all(resp.as_bytes()).await.unwrap();
    };

    let (res, _) = tokio::join!(fut, srv);
    assert_eq!(res, Err(FetchError::Io));
}

#[tokio::test]
async fn body_without_content_length_reads_to_eof() {
    let (mut server, client_side) = tokio::io::duplex(1 << 16);
    let client = CatalogClient::new_test(one_shot_connector(client_side));
    let fut = client.search("dune");

    let srv = async move {
        let mut buf = [0u8; 512];
        let _ = server.read(&mut buf).await.unwrap_or(0);
        let body = r#"{"items":[{"id":"v1","volumeInfo":{"title":"Dune"}}]}"#;
        let resp = format!("HTTP/1.1 200 OK\r\nconnection: close\r\n\r\n{}", body);
        server.write_all(resp.as_bytes()).await.unwrap();
        drop(server);
    };

    let (res, _) = tokio::join!(fut, srv);
    let results = res.expect("search ok");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title.as_deref(), Some("Dune"));
}
