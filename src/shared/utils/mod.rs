use crate::shared::errors::{AppError, AppResult};

/// 現在月を提供する時計
pub mod clock;

/// 月単位の日付型
pub mod month_year;

pub use clock::Clock;
pub use month_year::MonthYear;

/// 必須フィールドのバリデーション
///
/// # 引数
/// * `value` - 値
/// * `field_name` - フィールド名（エラーメッセージ用）
///
/// # 戻り値
/// 空白以外の文字を含む場合はOk(())、空の場合はエラー
pub fn validate_required_field(value: &str, field_name: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!(
            "{field_name}を入力してください"
        )));
    }
    Ok(())
}

/// テキスト長のバリデーション
///
/// # 引数
/// * `text` - テキスト
/// * `max_length` - 最大文字数
/// * `field_name` - フィールド名（エラーメッセージ用）
///
/// # 戻り値
/// 最大文字数以内の場合はOk(())、超える場合はエラー
pub fn validate_text_length(text: &str, max_length: usize, field_name: &str) -> AppResult<()> {
    if text.chars().count() > max_length {
        return Err(AppError::validation(format!(
            "{field_name}は{max_length}文字以内で入力してください"
        )));
    }
    Ok(())
}

/// 空文字列をNoneとして扱う
///
/// クエリパラメータの「未指定」と「空指定」を同一視するために使う。
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text_length() {
        assert!(validate_text_length("Spotify", 100, "サービス名").is_ok());
        assert!(validate_text_length("", 10, "テスト").is_ok());
        assert!(validate_text_length(&"あ".repeat(100), 100, "サービス名").is_ok());

        assert!(validate_text_length(&"a".repeat(101), 100, "サービス名").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        assert!(validate_required_field("有効な値", "テスト").is_ok());
        assert!(validate_required_field("  有効な値  ", "テスト").is_ok()); // 前後の空白は許可

        assert!(validate_required_field("", "テスト").is_err());
        assert!(validate_required_field("   ", "テスト").is_err()); // 空白のみ
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("u1".to_string())), Some("u1".to_string()));
    }
}
