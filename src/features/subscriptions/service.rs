use super::cost::{self, CostQuery};
use super::models::{Subscription, SubscriptionDto};
use super::repository::SubscriptionStore;
use crate::shared::errors::AppResult;
use crate::shared::utils::Clock;
use std::sync::Arc;

/// サブスクリプションのユースケース層
///
/// 入力のバリデーション、ストア呼び出し、集計をまとめる。
/// ストアのエラーは変換せずにそのまま呼び出し元へ返す。
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
    clock: Clock,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriptionStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// サブスクリプションを作成する
    ///
    /// # 戻り値
    /// 採番されたID、またはバリデーション・ストアのエラー
    pub fn create(&self, dto: SubscriptionDto) -> AppResult<String> {
        dto.validate()?;

        let service_name = dto.service_name.clone();
        match self.store.create(dto) {
            Ok(id) => {
                log::info!("サブスクリプションを作成しました: id={id}, service_name={service_name}");
                Ok(id)
            }
            Err(e) => {
                log::error!("サブスクリプションの作成に失敗しました: {e}");
                Err(e)
            }
        }
    }

    /// IDでサブスクリプションを取得する
    pub fn get(&self, id: &str) -> AppResult<Option<Subscription>> {
        self.store.get(id).map_err(|e| {
            log::error!("サブスクリプションの取得に失敗しました: id={id}, {e}");
            e
        })
    }

    /// サブスクリプションを全項目置き換えで更新する
    ///
    /// # 引数
    /// * `id` - パスで指定されたID（本文より優先）
    /// * `dto` - 置き換え後の内容
    pub fn update(&self, id: &str, dto: SubscriptionDto) -> AppResult<()> {
        dto.validate()?;

        let subscription = Subscription::from_dto(id, dto);
        self.store.update(&subscription).map_err(|e| {
            log::error!("サブスクリプションの更新に失敗しました: id={id}, {e}");
            e
        })?;

        log::info!("サブスクリプションを更新しました: id={id}");
        Ok(())
    }

    /// サブスクリプションを削除する
    pub fn delete(&self, id: &str) -> AppResult<()> {
        self.store.delete(id).map_err(|e| {
            log::error!("サブスクリプションの削除に失敗しました: id={id}, {e}");
            e
        })?;

        log::info!("サブスクリプションを削除しました: id={id}");
        Ok(())
    }

    /// サブスクリプション一覧を取得する
    pub fn list(&self) -> AppResult<Vec<Subscription>> {
        self.store.list().map_err(|e| {
            log::error!("サブスクリプション一覧の取得に失敗しました: {e}");
            e
        })
    }

    /// 期間内の合計費用を計算する
    ///
    /// ストアから一覧を一度だけ取得し、現在月を時計から決めて集計する。
    pub fn total_cost(&self, query: &CostQuery) -> AppResult<i64> {
        let subscriptions = self.store.list().map_err(|e| {
            log::error!("合計費用の計算用の一覧取得に失敗しました: {e}");
            e
        })?;

        let now = self.clock.current_month();
        let total = cost::total_cost(&subscriptions, query, now);

        log::info!(
            "合計費用を計算しました: user_id={:?}, service_name={:?}, from={}, to={}, total_cost={total}",
            query.user_id,
            query.service_name,
            query.from,
            query.to
        );

        Ok(total)
    }
}
