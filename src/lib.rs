pub mod features;
pub mod server;
pub mod shared;

use features::subscriptions::{SqliteSubscriptionStore, SubscriptionService};
use log::{error, info};
use server::HttpServer;
use shared::config::AppConfig;
use shared::database::initialize_database;
use shared::errors::AppResult;
use shared::utils::Clock;
use std::future::Future;
use std::sync::Arc;

/// アプリケーション状態（設定とサービスを保持）
///
/// 起動時に一度だけ構築し、各接続に `Arc` で共有する。
pub struct AppState {
    pub config: AppConfig,
    pub subscriptions: SubscriptionService,
}

impl AppState {
    pub fn new(config: AppConfig, subscriptions: SubscriptionService) -> Self {
        Self {
            config,
            subscriptions,
        }
    }
}

/// 設定からアプリケーション状態を構築する
///
/// # 処理内容
/// 1. データベースを開き、テーブルを作成
/// 2. ストアとサービスを組み立て
pub fn build_state(config: AppConfig) -> AppResult<AppState> {
    info!("データベースを初期化しています...");
    let conn = initialize_database(&config.database_path).map_err(|e| {
        error!("データベースの初期化に失敗しました: {e}");
        e
    })?;

    let store = SqliteSubscriptionStore::new(conn);
    let service = SubscriptionService::new(Arc::new(store), Clock::system(config.timezone));

    Ok(AppState::new(config, service))
}

/// サーバーを起動し、停止シグナルまで処理を続ける
///
/// # 引数
/// * `config` - アプリケーション設定
/// * `shutdown` - 完了するとサーバーを停止するFuture
pub async fn run<F>(config: AppConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()>,
{
    info!("アプリケーション初期化を開始します...");

    let addr = config.server.socket_addr();
    let state = Arc::new(build_state(config)?);
    let server = HttpServer::bind(addr).await.map_err(|e| {
        error!("待ち受けの開始に失敗しました: addr={addr}, {e}");
        e
    })?;

    info!("アプリケーション初期化が完了しました");

    server.serve(state, shutdown).await?;

    info!("アプリケーションを終了しました");
    Ok(())
}

/// Ctrl-C を受け取るまで待機する
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("停止シグナルの待機に失敗しました: {e}");
        std::future::pending::<()>().await;
    }
}
