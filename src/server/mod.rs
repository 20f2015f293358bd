/// リクエストのルーティング
pub mod router;

use crate::shared::errors::{AppError, AppResult, ErrorSeverity};
use crate::AppState;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// 停止時に処理中の接続を待つ上限
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// 接続受け入れに失敗したときの待ち時間
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// ハンドラが返すレスポンス型
pub type HttpResponse = Response<Full<Bytes>>;

/// HTTP APIサーバー
pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    /// 指定アドレスで待ち受けを開始する（ポート0なら空きポートを使う）
    pub async fn bind(addr: SocketAddr) -> AppResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// 実際に待ち受けているアドレス
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// 停止シグナルを受け取るまで接続を受け付ける
    ///
    /// 停止後は新規接続を受け付けず、処理中のリクエストが終わるまで待ってから戻る。
    ///
    /// # 引数
    /// * `state` - 各接続で共有するアプリケーション状態
    /// * `shutdown` - 完了すると新規接続の受け付けを止めるFuture
    pub async fn serve<F>(self, state: Arc<AppState>, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        log::info!("HTTPサーバーを開始しました: http://{}", self.local_addr()?);

        let Self { listener } = self;
        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("停止シグナルを受信したため、新規接続の受け付けを終了します");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let io = TokioIo::new(stream);
                            let state = Arc::clone(&state);
                            let service = service_fn(move |req| {
                                router::handle_request(req, Arc::clone(&state))
                            });
                            let connection =
                                graceful.watch(http1::Builder::new().serve_connection(io, service));

                            tokio::spawn(async move {
                                if let Err(e) = connection.await {
                                    log::error!("接続処理エラー: peer={peer}, {e}");
                                }
                            });
                        }
                        Err(e) => {
                            // ファイルディスクリプタ枯渇などは待てば回復することがある
                            log::error!("接続受け入れエラー: {e}");
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }

        drop(listener);

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, graceful.shutdown()).await {
            Ok(()) => log::info!("処理中の接続がすべて終了しました"),
            Err(_) => log::warn!(
                "{}秒以内に終了しなかった接続を打ち切ります",
                SHUTDOWN_TIMEOUT.as_secs()
            ),
        }

        Ok(())
    }
}

/// JSONレスポンスを作成する
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => build_response(status, Some("application/json"), Bytes::from(bytes)),
        Err(e) => {
            log::error!("レスポンスのシリアライズに失敗しました: {e}");
            build_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                None,
                Bytes::from_static(b"Internal Server Error"),
            )
        }
    }
}

/// 本文のないレスポンスを作成する
pub fn empty_response(status: StatusCode) -> HttpResponse {
    build_response(status, None, Bytes::new())
}

/// エラーレスポンスを作成する（`{"error": "..."}`）
pub fn error_response(error: &AppError) -> HttpResponse {
    let status = error.status_code();
    match error.severity() {
        ErrorSeverity::High => log::error!("リクエスト処理エラー: {}", error.details()),
        ErrorSeverity::Medium => log::warn!("リクエスト処理エラー: {}", error.details()),
        ErrorSeverity::Low => log::info!("リクエストを拒否しました: {}", error.details()),
    }

    json_response(
        status,
        &serde_json::json!({ "error": error.user_message() }),
    )
}

fn build_response(status: StatusCode, content_type: Option<&str>, body: Bytes) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        if let Ok(value) = hyper::header::HeaderValue::from_str(content_type) {
            response
                .headers_mut()
                .insert(hyper::header::CONTENT_TYPE, value);
        }
    }
    response
}
