use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{validate_required_field, validate_text_length, MonthYear};
use serde::{Deserialize, Serialize};

/// サービス名の最大文字数
pub const MAX_SERVICE_NAME_LENGTH: usize = 100;

/// サブスクリプションデータモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: String,                   // 作成時にストアが採番するUUID
    pub service_name: String,         // サービス名、100文字以内
    pub price: i64,                   // 1か月あたりの料金（最小通貨単位）
    pub user_id: String,              // 所有ユーザーID（形式は問わない）
    pub start_date: MonthYear,        // 課金開始月
    pub end_date: Option<MonthYear>,  // 課金終了月（Noneは継続中）
}

impl Subscription {
    /// DTOとIDからサブスクリプションを組み立てる
    pub fn from_dto(id: impl Into<String>, dto: SubscriptionDto) -> Self {
        Self {
            id: id.into(),
            service_name: dto.service_name,
            price: dto.price,
            user_id: dto.user_id,
            start_date: dto.start_date,
            end_date: dto.end_date,
        }
    }
}

/// サブスクリプション作成・更新用DTO
///
/// 更新は全項目の置き換えなので、作成と同じ形をとる。IDはパスで指定される。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubscriptionDto {
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    pub start_date: MonthYear,
    #[serde(default)]
    pub end_date: Option<MonthYear>,
}

impl SubscriptionDto {
    /// 書き込み前のバリデーション
    ///
    /// # バリデーション規則
    /// - サービス名は必須、100文字以内
    /// - 料金は0以上
    /// - ユーザーIDは必須
    /// - 終了月は開始月以降
    pub fn validate(&self) -> AppResult<()> {
        validate_required_field(&self.service_name, "サービス名")?;
        validate_text_length(&self.service_name, MAX_SERVICE_NAME_LENGTH, "サービス名")?;

        if self.price < 0 {
            return Err(AppError::validation("料金は0以上である必要があります"));
        }

        validate_required_field(&self.user_id, "ユーザーID")?;

        if let Some(end_date) = self.end_date {
            if end_date < self.start_date {
                return Err(AppError::validation(format!(
                    "終了月({end_date})は開始月({})以降である必要があります",
                    self.start_date
                )));
            }
        }

        Ok(())
    }
}

/// 作成結果（採番されたID）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CreatedSubscription {
    pub id: String,
}

/// 合計金額の集計結果
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TotalCost {
    pub total_cost: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> SubscriptionDto {
        SubscriptionDto {
            service_name: "Spotify".to_string(),
            price: 9,
            user_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            start_date: MonthYear::new(2023, 1).unwrap(),
            end_date: Some(MonthYear::new(2023, 6).unwrap()),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(dto().validate().is_ok());

        let open_ended = SubscriptionDto {
            end_date: None,
            ..dto()
        };
        assert!(open_ended.validate().is_ok());

        let same_month = SubscriptionDto {
            end_date: Some(MonthYear::new(2023, 1).unwrap()),
            ..dto()
        };
        assert!(same_month.validate().is_ok());

        let free = SubscriptionDto { price: 0, ..dto() };
        assert!(free.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let cases = vec![
            SubscriptionDto {
                service_name: "  ".to_string(),
                ..dto()
            },
            SubscriptionDto {
                service_name: "a".repeat(MAX_SERVICE_NAME_LENGTH + 1),
                ..dto()
            },
            SubscriptionDto { price: -1, ..dto() },
            SubscriptionDto {
                user_id: String::new(),
                ..dto()
            },
            SubscriptionDto {
                end_date: Some(MonthYear::new(2022, 12).unwrap()),
                ..dto()
            },
        ];

        for case in cases {
            let result = case.validate();
            assert!(
                matches!(result, Err(AppError::Validation(_))),
                "バリデーションが通ってしまいました: {case:?}"
            );
        }
    }

    #[test]
    fn test_deserialize_payload() {
        let json = r#"{
            "service_name": "Yandex Plus",
            "price": 400,
            "user_id": "60601fee-2bf1-4721-ae6f-7636e79a0cba",
            "start_date": "07-2025"
        }"#;
        let dto: SubscriptionDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.price, 400);
        assert_eq!(dto.start_date, MonthYear::new(2025, 7).unwrap());
        assert_eq!(dto.end_date, None);

        // 月年の形式が不正な場合は解析エラー
        let bad = r#"{"service_name":"x","price":1,"user_id":"u","start_date":"2025-07"}"#;
        assert!(serde_json::from_str::<SubscriptionDto>(bad).is_err());
    }

    #[test]
    fn test_serialize_subscription() {
        let sub = Subscription::from_dto("abc", dto());
        let value = serde_json::to_value(&sub).unwrap();

        assert_eq!(value["id"], "abc");
        assert_eq!(value["start_date"], "01-2023");
        assert_eq!(value["end_date"], "06-2023");
    }
}
