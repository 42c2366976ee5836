use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stage_http::{HttpCode, MemoryUserStore, Options, Server, UserVerifier};

struct CountingStore {
    inner: MemoryUserStore,
    calls: Arc<AtomicUsize>,
}

impl UserVerifier for CountingStore {
    fn verify(&self, username: &str, password: &str, is_login: bool) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(username, password, is_login)
    }
}

/// Serves `count` connections, answering every request with the resolved
/// path, the verification outcome and the decoded username.
async fn spawn_server(count: usize, options: Options) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = Server::with_options("127.0.0.1:0", options).await.unwrap();
    server.set_verifier(CountingStore {
        inner: MemoryUserStore::with_users([("alice", "wonder land")]),
        calls: calls.clone(),
    });
    let base = format!("http://{}", server.local_addr().unwrap());

    tokio::spawn(async move {
        for _ in 0..count {
            let accept = server.accept().await.unwrap();
            tokio::spawn(async move {
                let mut conn = accept.into_connection();
                loop {
                    match conn.read_request().await {
                        Ok(HttpCode::GetRequest) => {}
                        Ok(HttpCode::BadRequest) => {
                            conn.write_buffer_mut().append_str(
                                "HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            );
                            let _ = conn.flush().await;
                            return;
                        }
                        _ => return,
                    }

                    let request = conn.request();
                    let body = format!(
                        "{} {} {:?} {}",
                        request.method(),
                        request.path(),
                        request.verified(),
                        request.post_field("username").unwrap_or("-")
                    );
                    conn.write_buffer_mut().append_str(&format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
                        body.len(),
                        body
                    ));
                    if conn.flush().await.is_err() || !conn.is_keep_alive() {
                        return;
                    }
                    conn.reset();
                }
            });
        }
    });

    (base, calls)
}

#[tokio::test(flavor = "multi_thread")]
async fn serves_get_requests() {
    let (base, calls) = spawn_server(2, Options::new()).await;
    let client = reqwest::Client::new();

    let text = client.get(format!("{base}/")).send().await.unwrap().text().await.unwrap();
    assert_eq!(text, "GET /index.html None -");

    // Same keep-alive connection.
    let text = client
        .get(format!("{base}/picture?size=large"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(text, "GET /picture.html None -");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn verifies_login_form() {
    let mut options = Options::new();
    options.strict_body_length = true;
    let (base, calls) = spawn_server(1, options).await;
    let client = reqwest::Client::new();

    let text = client
        .post(format!("{base}/login"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("username=alice&password=wonder+land")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(text, "POST /welcome.html Some(true) alice");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn registers_then_rejects_duplicate() {
    let mut options = Options::new();
    options.strict_body_length = true;
    let (base, calls) = spawn_server(2, options).await;
    let client = reqwest::Client::new();

    for expected in [
        "POST /welcome.html Some(true) bob",
        "POST /error.html Some(false) bob",
    ] {
        let text = client
            .post(format!("{base}/register"))
            .header("content-type", "application/x-www-form-urlencoded")
            .body("username=bob&password=builder")
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(text, expected);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejects_malformed_request_line() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let (base, _) = spawn_server(1, Options::new()).await;
    let addr = base.trim_start_matches("http://");
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"GET /x BADVERSION\r\n\r\n").await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 400 Bad Request"));
}
