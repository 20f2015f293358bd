/// サブスクリプション機能モジュール
///
/// このモジュールは、サブスクリプション管理に関連するすべての機能を提供します：
/// - サブスクリプションの作成、読み取り、更新、削除
/// - 期間内の合計費用の集計（ユーザー・サービス名での絞り込み）
/// - HTTPハンドラ
pub mod cost;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

// 公開インターフェース
pub use cost::{billed_months, total_cost, CostQuery};

pub use models::{CreatedSubscription, Subscription, SubscriptionDto, TotalCost};

pub use repository::{SqliteSubscriptionStore, SubscriptionStore};

pub use service::SubscriptionService;
