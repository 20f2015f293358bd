use subscription_service_lib::shared::config::{
    initialize_logging_system, load_environment_variables, AppConfig, EnvironmentConfig,
};

#[tokio::main]
async fn main() {
    // 環境変数を読み込み（.envファイルがある場合）
    let env_file = load_environment_variables();

    // ログシステムを初期化（.envのLOG_LEVELを反映するため読み込み後に行う）
    initialize_logging_system(&EnvironmentConfig::from_env());

    match env_file {
        Some(path) => log::info!("環境変数ファイルを読み込みました: {}", path.display()),
        None => log::warn!("環境変数ファイルが見つかりません。直接設定された環境変数を使用します。"),
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("設定の読み込みに失敗しました: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = subscription_service_lib::run(config, subscription_service_lib::shutdown_signal()).await {
        log::error!("アプリケーションの実行中にエラーが発生しました: {e}");
        std::process::exit(1);
    }
}
