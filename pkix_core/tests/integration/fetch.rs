use pkix_core::fetch::{Conditional, FetchConfig, FetchError, FetchResponse, Fetcher, HttpFetcher};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Raw request heads received by the test server, lowercased.
type Seen = Arc<Mutex<Vec<String>>>;

fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&data).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let head = text[..end].to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                return head;
            }
        }
    }
    String::from_utf8_lossy(&data).to_lowercase()
}

/// Answers `requests` connections, choosing each response from the request
/// head and the attempt number.
fn spawn_test_server<F>(requests: usize, respond: F) -> (SocketAddr, Seen, JoinHandle<()>)
where
    F: Fn(&str, usize) -> Vec<u8> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::default();
    let recorded = seen.clone();
    let handle = std::thread::spawn(move || {
        for attempt in 1..=requests {
            let (mut stream, _) = listener.accept().unwrap();
            let head = read_request(&mut stream);
            let response = respond(&head, attempt);
            recorded.lock().unwrap().push(head);
            stream.write_all(&response).unwrap();
        }
    });
    (addr, seen, handle)
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(FetchConfig::default()).unwrap()
}

#[test]
fn should_revalidate_with_etag() {
    // Given a server that serves a CRL once and then answers 304
    let (addr, seen, server) = spawn_test_server(2, |head, _| {
        if head.contains("if-none-match: \"v1\"") {
            b"HTTP/1.1 304 Not Modified\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_vec()
        } else {
            b"HTTP/1.1 200 OK\r\nETag: \"v1\"\r\nContent-Length: 3\r\nConnection: close\r\n\r\ncrl"
                .to_vec()
        }
    });
    let uri = format!("http://{addr}/ca.crl");
    let fetcher = fetcher();

    // When fetched unconditionally and then with the returned validator
    let first = fetcher.get(&uri, &Conditional::default()).unwrap();
    let FetchResponse::Body { bytes, etag, .. } = first else {
        panic!("expected a body");
    };
    let second = fetcher
        .get(
            &uri,
            &Conditional {
                etag,
                last_modified: None,
            },
        )
        .unwrap();

    // Then the body arrives first and the revalidation is answered 304
    assert_eq!(bytes, b"crl");
    assert!(matches!(second, FetchResponse::NotModified));
    server.join().unwrap();
    assert!(seen.lock().unwrap()[0].starts_with("get /ca.crl"));
}

#[test]
fn should_post_ocsp_request() {
    let (addr, seen, server) = spawn_test_server(1, |_, _| {
        b"HTTP/1.1 200 OK\r\nContent-Type: application/ocsp-response\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok"
            .to_vec()
    });
    let uri = format!("http://{addr}/");

    let body = fetcher()
        .post(&uri, "application/ocsp-request", &[0x30, 0x00])
        .unwrap();

    assert_eq!(body, b"ok");
    server.join().unwrap();
    let head = seen.lock().unwrap()[0].clone();
    assert!(head.starts_with("post / "));
    assert!(head.contains("content-type: application/ocsp-request"));
}

#[test]
fn should_report_http_status() {
    let (addr, _, server) = spawn_test_server(1, |_, _| {
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec()
    });
    let uri = format!("http://{addr}/missing.crl");

    let result = fetcher().get_bytes(&uri);

    assert!(matches!(
        result,
        Err(FetchError::HttpStatus { status: 404, .. })
    ));
    server.join().unwrap();
}

#[test]
fn should_refuse_ldap_distribution_points() {
    let result = fetcher().get_bytes("ldap://ldap.example.com/cn=CA?certificateRevocationList");
    assert!(matches!(result, Err(FetchError::UnsupportedScheme { .. })));
}

#[test]
fn should_retry_get_after_transient_failure() {
    // Given a server that fails once then succeeds
    let (addr, seen, server) = spawn_test_server(2, |_, attempt| {
        if attempt == 1 {
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nRetry-After: 0\r\nConnection: close\r\n\r\n"
                .to_vec()
        } else {
            b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\nConnection: close\r\n\r\ncrl".to_vec()
        }
    });
    let uri = format!("http://{addr}/ca.crl");

    // When the fetcher downloads it
    let bytes = fetcher().get_bytes(&uri).unwrap();

    // Then it should have retried once and returned the successful body
    assert_eq!(bytes, b"crl");
    server.join().unwrap();
    assert_eq!(seen.lock().unwrap().len(), 2);
}
