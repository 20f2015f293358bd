use super::month_year::MonthYear;
use chrono::Utc;
use chrono_tz::Tz;

/// 「現在」を決める時計
///
/// 終了日のないサブスクリプションは現在月まで有効として扱うため、
/// 集計時に参照する現在月をここから取得する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clock {
    /// システム時刻を指定タイムゾーンで解釈する
    System { timezone: Tz },
    /// 固定の月（テストや過去時点のレポート用）
    Fixed(MonthYear),
}

impl Clock {
    /// 指定タイムゾーンのシステム時計を作成する
    pub fn system(timezone: Tz) -> Self {
        Clock::System { timezone }
    }

    /// 現在月を取得する
    pub fn current_month(&self) -> MonthYear {
        match self {
            Clock::System { timezone } => {
                MonthYear::from_date(&Utc::now().with_timezone(timezone).date_naive())
            }
            Clock::Fixed(month) => *month,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::system(Tz::UTC)
    }
}
