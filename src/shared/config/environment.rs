use crate::shared::errors::{AppError, AppResult};
use chrono_tz::Tz;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// データディレクトリ配下のアプリケーション用サブディレクトリ名
const APP_DIR_NAME: &str = "subscription-service";

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

impl Environment {
    /// 環境名から実行環境を判定する（"production" 以外は開発環境）
    pub fn from_name(name: &str) -> Self {
        match name {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: Environment,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let environment = lookup("ENVIRONMENT")
            .map(|name| Environment::from_name(&name))
            .unwrap_or_else(default_environment);
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| match environment {
            Environment::Development => "debug".to_string(),
            Environment::Production => "info".to_string(),
        });

        Self {
            environment,
            log_level,
        }
    }

    /// ログレベル文字列を `log::LevelFilter` に変換する（不明な値はInfo）
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.log_level.to_lowercase().as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

/// HTTPサーバーの設定
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// 待ち受けアドレス
    pub host: IpAddr,
    /// 待ち受けポート
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// アプリケーション全体の設定
///
/// 起動時に一度だけ構築し、各コンポーネントへ明示的に渡す。
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 実行環境とログ設定
    pub environment: EnvironmentConfig,
    /// HTTPサーバー設定
    pub server: ServerConfig,
    /// SQLiteデータベースファイルのパス
    pub database_path: PathBuf,
    /// 「現在月」の判定に使うタイムゾーン
    pub timezone: Tz,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 戻り値
    /// アプリケーション設定、または値が不正な場合は設定エラー
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// # 引数
    /// * `lookup` - キーから値を引く関数（未設定はNone）
    ///
    /// # 読み込む変数
    /// - `ENVIRONMENT` / `LOG_LEVEL`
    /// - `SERVER_HOST`（既定: 0.0.0.0）/ `SERVER_PORT`（既定: 8080）
    /// - `DATABASE_PATH`（既定: データディレクトリ配下）
    /// - `APP_TIMEZONE`（既定: UTC）
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> AppResult<Self> {
        let environment = EnvironmentConfig::from_lookup(lookup);

        let host = get_or_default(lookup, "SERVER_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| AppError::configuration(format!("SERVER_HOST が不正です: {e}")))?;
        let port = get_or_default(lookup, "SERVER_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| AppError::configuration(format!("SERVER_PORT が不正です: {e}")))?;

        let database_path = lookup("DATABASE_PATH")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_database_path(environment.environment));

        let timezone_name = get_or_default(lookup, "APP_TIMEZONE", "UTC");
        let timezone = timezone_name.parse::<Tz>().map_err(|e| {
            AppError::configuration(format!("APP_TIMEZONE が不正です: {timezone_name} ({e})"))
        })?;

        let config = Self {
            environment,
            server: ServerConfig { host, port },
            database_path,
            timezone,
        };

        log::info!(
            "設定を読み込みました: environment={}, server={}, database={:?}, timezone={}",
            config.environment.environment.as_str(),
            config.server.socket_addr(),
            config.database_path,
            config.timezone
        );

        Ok(config)
    }
}

/// 値を取得し、未設定なら既定値を使う
fn get_or_default(lookup: &dyn Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    match lookup(key).filter(|value| !value.is_empty()) {
        Some(value) => value,
        None => {
            log::warn!("環境変数 {key} が設定されていないため、既定値を使用します: {default}");
            default.to_string()
        }
    }
}

/// ENVIRONMENT未設定時の実行環境（ビルド設定に基づく）
fn default_environment() -> Environment {
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # ファイル名の規則
/// - 開発環境: "dev_subscriptions.db"
/// - プロダクション環境: "subscriptions.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_subscriptions.db",
        Environment::Production => "subscriptions.db",
    }
}

/// 既定のデータベースパス（データディレクトリが取得できない場合はカレントディレクトリ）
fn default_database_path(env: Environment) -> PathBuf {
    let filename = get_database_filename(env);
    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR_NAME).join(filename),
        None => {
            log::warn!("データディレクトリを取得できないため、カレントディレクトリを使用します");
            PathBuf::from(filename)
        }
    }
}

/// 環境に応じた.envファイルを読み込む
///
/// ログシステムの初期化前に呼ばれるため、ここではログを出さず結果だけを返す。
///
/// # 戻り値
/// 読み込んだファイルのパス（見つからない場合はNone）
pub fn load_environment_variables() -> Option<PathBuf> {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    load_env_file(Path::new("."), &environment)
}

/// 指定ディレクトリから.envファイルを探して読み込む
///
/// プロダクション環境では `.env.production` を優先し、無ければ `.env` にフォールバックする。
fn load_env_file(dir: &Path, environment: &str) -> Option<PathBuf> {
    let candidates: &[&str] = match environment {
        "production" => &[".env.production", ".env"],
        _ => &[".env"],
    };

    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| dotenv::from_path(path).is_ok())
}

/// ログシステムを初期化する
///
/// プロセス起動時に一度だけ呼び出す。
pub fn initialize_logging_system(env_config: &EnvironmentConfig) {
    let result = env_logger::Builder::from_default_env()
        .filter_level(env_config.level_filter())
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    if result.is_err() {
        log::debug!("ログシステムは既に初期化されています");
        return;
    }

    log::info!(
        "ログシステムを初期化しました: level={}, environment={}",
        env_config.log_level,
        env_config.environment.as_str()
    );
}
