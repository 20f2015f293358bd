//! 実際にHTTPサーバーを起動してAPIを通しで確認するテスト

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use subscription_service_lib::server::HttpServer;
use subscription_service_lib::shared::config::AppConfig;
use subscription_service_lib::{build_state, AppState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let database_path = dir.path().join("api_test.db").to_string_lossy().to_string();

        let config = AppConfig::from_lookup(&move |key| match key {
            "SERVER_HOST" => Some("127.0.0.1".to_string()),
            "SERVER_PORT" => Some("0".to_string()),
            "DATABASE_PATH" => Some(database_path.clone()),
            _ => None,
        })
        .unwrap();

        let addr = config.server.socket_addr();
        let state: Arc<AppState> = Arc::new(build_state(config).unwrap());
        let server = HttpServer::bind(addr).await.unwrap();
        let addr = server.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .serve(state, async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown: Some(tx),
            handle,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

#[tokio::test]
async fn test_crud_and_total_over_http() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // 作成
    let response = client
        .post(server.url("/subscriptions"))
        .json(&json!({
            "service_name": "Spotify",
            "price": 9,
            "user_id": "60601fee-2bf1-4721-ae6f-7636e79a0cba",
            "start_date": "01-2023",
            "end_date": "06-2023"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let id = response.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // 取得
    let record: Value = client
        .get(server.url(&format!("/subscriptions/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["service_name"], "Spotify");
    assert_eq!(record["price"], 9);
    assert_eq!(record["start_date"], "01-2023");

    // 合計（2023年1月〜3月 → 9*3）
    let total: Value = client
        .get(server.url("/total"))
        .query(&[("from", "01-2023"), ("to", "03-2023")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(total["total_cost"], 27);

    // 対象期間外
    let total: Value = client
        .get(server.url("/total"))
        .query(&[("from", "01-2024"), ("to", "12-2024")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(total["total_cost"], 0);

    // 更新
    let response = client
        .put(server.url(&format!("/subscriptions/{id}")))
        .json(&json!({
            "service_name": "Spotify",
            "price": 10,
            "user_id": "60601fee-2bf1-4721-ae6f-7636e79a0cba",
            "start_date": "01-2023",
            "end_date": "01-2023"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let total: Value = client
        .get(server.url("/total?from=01-2023&to=12-2023&service_name=Spotify"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(total["total_cost"], 10);

    // 削除
    let response = client
        .delete(server.url(&format!("/subscriptions/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .get(server.url(&format!("/subscriptions/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    server.stop().await;
}

#[tokio::test]
async fn test_bad_requests_over_http() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/total?from=13-2023&to=01-2024"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    let response = client
        .post(server.url("/subscriptions/"))
        .header("Content-Type", "application/json")
        .body("{\"service_name\": \"\"}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let list: Value = client
        .get(server.url("/subscriptions/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list, json!([]));

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_request() {
    let mut server = TestServer::start().await;

    let body = r#"{"service_name":"Spotify","price":9,"user_id":"U1","start_date":"01-2023"}"#;
    let (first_half, second_half) = body.split_at(body.len() / 2);

    // ヘッダーと本文の前半だけを送る
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let head = format!(
        "POST /subscriptions HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{first_half}",
        server.addr,
        body.len()
    );
    stream.write_all(head.as_bytes()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // 停止シグナルを送っても、処理中のリクエストがある間は戻らない
    server.shutdown.take().unwrap().send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!server.handle.is_finished());

    // 残りの本文を送るとリクエストが完了する
    stream.write_all(second_half.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 201"), "{response}");

    tokio::time::timeout(Duration::from_secs(5), &mut server.handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_with_idle_server_returns_promptly() {
    let mut server = TestServer::start().await;

    server.shutdown.take().unwrap().send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), &mut server.handle)
        .await
        .unwrap()
        .unwrap();

    // 停止後は新しい接続を受け付けない
    assert!(TcpStream::connect(server.addr).await.is_err());
}
