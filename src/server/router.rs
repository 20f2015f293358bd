use super::{error_response, json_response, HttpResponse};
use crate::features::subscriptions::{handlers, SubscriptionService};
use crate::shared::errors::{AppError, AppResult};
use crate::AppState;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, StatusCode};
use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;

/// 受け付けるリクエスト本文の最大バイト数
pub const MAX_BODY_BYTES: usize = 64 * 1024;

type BoxError = Box<dyn StdError + Send + Sync>;

/// HTTPリクエストを処理する
///
/// 失敗はすべてエラーレスポンスに変換するため、常にOkを返す。
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<HttpResponse, Infallible>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    log::debug!("リクエストを受信: {} {}", req.method(), req.uri());

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match dispatch(req, &state).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    };

    log::debug!("レスポンス: {method} {path} -> {}", response.status());
    Ok(response)
}

/// パスとメソッドからハンドラを選ぶ
async fn dispatch<B>(req: Request<B>, state: &AppState) -> AppResult<HttpResponse>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let query = req.uri().query().map(str::to_string);
    let path = req.uri().path().trim_end_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, segments.as_slice()) {
        (Method::GET, ["health"]) => Ok(json_response(
            StatusCode::OK,
            &serde_json::json!({
                "status": "ok",
                "environment": state.config.environment.environment.as_str(),
            }),
        )),
        (Method::POST, ["subscriptions"]) => {
            let body = read_body(req).await?;
            run_blocking(state, move |service| handlers::create_subscription(service, &body)).await
        }
        (Method::GET, ["subscriptions"]) => run_blocking(state, handlers::list_subscriptions).await,
        (Method::GET, ["subscriptions", id]) => {
            let id = id.to_string();
            run_blocking(state, move |service| handlers::get_subscription(service, &id)).await
        }
        (Method::PUT, ["subscriptions", id]) => {
            let id = id.to_string();
            let body = read_body(req).await?;
            run_blocking(state, move |service| {
                handlers::update_subscription(service, &id, &body)
            })
            .await
        }
        (Method::DELETE, ["subscriptions", id]) => {
            let id = id.to_string();
            run_blocking(state, move |service| handlers::delete_subscription(service, &id)).await
        }
        (Method::GET, ["total"]) => {
            run_blocking(state, move |service| {
                handlers::get_total_cost(service, query.as_deref())
            })
            .await
        }
        (_, ["health"]) | (_, ["subscriptions"]) | (_, ["subscriptions", _]) | (_, ["total"]) => {
            Ok(json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &serde_json::json!({ "error": "Method Not Allowed" }),
            ))
        }
        _ => Err(AppError::not_found(format!("パス {path}"))),
    }
}

/// ストアに触れるハンドラをブロッキング用スレッドで実行する
///
/// SQLiteへのアクセスは同期的なので、非同期ワーカーを塞がないようにする。
async fn run_blocking<F>(state: &AppState, handler: F) -> AppResult<HttpResponse>
where
    F: FnOnce(&SubscriptionService) -> AppResult<HttpResponse> + Send + 'static,
{
    let service = state.subscriptions.clone();
    tokio::task::spawn_blocking(move || handler(&service))
        .await
        .map_err(|e| AppError::concurrency(format!("ハンドラの実行に失敗しました: {e}")))?
}

/// リクエスト本文を上限付きで読み込む
async fn read_body<B>(req: Request<B>) -> AppResult<Bytes>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(AppError::validation(format!(
            "リクエスト本文が大きすぎます（上限 {MAX_BODY_BYTES} バイト）"
        ))),
        Err(e) => Err(AppError::validation(format!(
            "リクエスト本文の読み込みに失敗しました: {e}"
        ))),
    }
}
