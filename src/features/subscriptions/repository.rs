use super::models::{Subscription, SubscriptionDto};
use crate::shared::errors::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT id, service_name, price, user_id, start_date, end_date
         FROM subscriptions";

/// サブスクリプションの永続化ストア
///
/// 集計やHTTP層はこのトレイト越しにストアを利用する。
pub trait SubscriptionStore: Send + Sync {
    /// 新しいレコードを保存し、採番したIDを返す
    fn create(&self, dto: SubscriptionDto) -> AppResult<String>;

    /// IDでレコードを取得する（存在しない場合はNone）
    fn get(&self, id: &str) -> AppResult<Option<Subscription>>;

    /// IDで全項目を置き換える
    fn update(&self, subscription: &Subscription) -> AppResult<()>;

    /// IDで削除する
    fn delete(&self, id: &str) -> AppResult<()>;

    /// 全レコードを取得する（順序は不定）
    fn list(&self) -> AppResult<Vec<Subscription>>;
}

/// SQLiteによるストア実装
pub struct SqliteSubscriptionStore {
    db: Mutex<Connection>,
}

impl SqliteSubscriptionStore {
    /// 初期化済みの接続からストアを作成する
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// データベース接続を取得する
    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))
    }
}

impl SubscriptionStore for SqliteSubscriptionStore {
    fn create(&self, dto: SubscriptionDto) -> AppResult<String> {
        create(&*self.conn()?, dto)
    }

    fn get(&self, id: &str) -> AppResult<Option<Subscription>> {
        find_by_id(&*self.conn()?, id)
    }

    fn update(&self, subscription: &Subscription) -> AppResult<()> {
        update(&*self.conn()?, subscription).map(|_| ())
    }

    fn delete(&self, id: &str) -> AppResult<()> {
        delete(&*self.conn()?, id).map(|_| ())
    }

    fn list(&self) -> AppResult<Vec<Subscription>> {
        find_all(&*self.conn()?)
    }
}

/// 行をサブスクリプションに変換する
fn map_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        service_name: row.get(1)?,
        price: row.get(2)?,
        user_id: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
    })
}

/// サブスクリプションを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `dto` - サブスクリプション作成用DTO
///
/// # 戻り値
/// 採番されたID、または失敗時はエラー
pub fn create(conn: &Connection, dto: SubscriptionDto) -> AppResult<String> {
    let id = Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO subscriptions (id, service_name, price, user_id, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            dto.service_name,
            dto.price,
            dto.user_id,
            dto.start_date,
            dto.end_date
        ],
    )?;

    Ok(id)
}

/// IDでサブスクリプションを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - サブスクリプションID
///
/// # 戻り値
/// サブスクリプション（存在しない場合はNone）、または失敗時はエラー
pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<Subscription>> {
    let query = format!("{SELECT_COLUMNS} WHERE id = ?1");
    conn.query_row(&query, params![id], map_row)
        .optional()
        .map_err(AppError::from)
}

/// サブスクリプション一覧を取得する
pub fn find_all(conn: &Connection) -> AppResult<Vec<Subscription>> {
    let mut stmt = conn.prepare(SELECT_COLUMNS)?;
    let subscriptions = stmt.query_map([], map_row)?;

    subscriptions
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// サブスクリプションを全項目置き換えで更新する
///
/// # 戻り値
/// 更新された行数（存在しないIDなら0）
pub fn update(conn: &Connection, subscription: &Subscription) -> AppResult<usize> {
    let rows_affected = conn.execute(
        "UPDATE subscriptions
         SET service_name = ?1, price = ?2, user_id = ?3, start_date = ?4, end_date = ?5
         WHERE id = ?6",
        params![
            subscription.service_name,
            subscription.price,
            subscription.user_id,
            subscription.start_date,
            subscription.end_date,
            subscription.id
        ],
    )?;

    if rows_affected == 0 {
        log::debug!("更新対象のサブスクリプションがありません: id={}", subscription.id);
    }

    Ok(rows_affected)
}

/// サブスクリプションを削除する
///
/// # 戻り値
/// 削除された行数（存在しないIDなら0）
pub fn delete(conn: &Connection, id: &str) -> AppResult<usize> {
    let rows_affected = conn.execute("DELETE FROM subscriptions WHERE id = ?1", params![id])?;
    Ok(rows_affected)
}
