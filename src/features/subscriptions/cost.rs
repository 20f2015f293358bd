//! 期間内のサブスクリプション費用の集計
//!
//! 各レコードの有効期間と問い合わせ期間の重なりを月数に換算し、
//! 月額料金を掛けて合計する。重なりの両端の月をどちらも1か月として数える。

use super::models::Subscription;
use crate::shared::utils::{non_empty, MonthYear};

/// 集計の問い合わせ条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    /// ユーザーIDでの絞り込み（Noneまたは空文字列は絞り込まない）
    pub user_id: Option<String>,
    /// サービス名での絞り込み（Noneまたは空文字列は絞り込まない）
    pub service_name: Option<String>,
    /// 集計開始月（この月を含む）
    pub from: MonthYear,
    /// 集計終了月（この月を含む）
    pub to: MonthYear,
}

impl CostQuery {
    /// 絞り込みなしの問い合わせを作成する
    pub fn between(from: MonthYear, to: MonthYear) -> Self {
        Self {
            user_id: None,
            service_name: None,
            from,
            to,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = non_empty(Some(user_id.into()));
        self
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = non_empty(Some(service_name.into()));
        self
    }

    /// レコードが絞り込み条件に一致するか
    fn matches(&self, subscription: &Subscription) -> bool {
        let user_matches = match self.user_id.as_deref() {
            Some(user_id) if !user_id.is_empty() => subscription.user_id == user_id,
            _ => true,
        };
        let service_matches = match self.service_name.as_deref() {
            Some(name) if !name.is_empty() => subscription.service_name == name,
            _ => true,
        };
        user_matches && service_matches
    }
}

/// 開始月から終了月までの課金月数（両端を含む）
///
/// 終了月が開始月より前の場合は0を返す。
pub fn billed_months(start: MonthYear, end: MonthYear) -> i64 {
    let months = start.months_until(&end) + 1;
    months.max(0)
}

/// 1レコードが問い合わせ期間内に発生させる費用
///
/// # 引数
/// * `subscription` - 対象レコード
/// * `from` / `to` - 問い合わせ期間
/// * `now` - 現在月（終了月のないレコードの終端）
pub fn subscription_cost(
    subscription: &Subscription,
    from: MonthYear,
    to: MonthYear,
    now: MonthYear,
) -> i64 {
    let start = subscription.start_date;
    let end = subscription.end_date.unwrap_or(now);

    if end < from || start > to {
        return 0;
    }

    let actual_start = start.max(from);
    let actual_end = end.min(to);

    subscription
        .price
        .saturating_mul(billed_months(actual_start, actual_end))
}

/// 問い合わせ条件に一致するレコードの合計費用を計算する
///
/// # 引数
/// * `subscriptions` - 全レコード
/// * `query` - 絞り込みと期間
/// * `now` - 現在月
///
/// # 戻り値
/// 合計費用（一致するレコードがなければ0）
pub fn total_cost(subscriptions: &[Subscription], query: &CostQuery, now: MonthYear) -> i64 {
    subscriptions
        .iter()
        .filter(|sub| query.matches(sub))
        .map(|sub| subscription_cost(sub, query.from, query.to, now))
        .fold(0i64, |acc, cost| acc.saturating_add(cost))
}
