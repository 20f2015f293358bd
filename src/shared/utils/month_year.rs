use crate::shared::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// `MM-YYYY` 形式
static MONTH_YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})-(\d{4})$").expect("月年パターンが不正です"));

/// 受け付ける年の範囲
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// 月単位の日付（年 + 月）
///
/// 日は意味を持たないため保持しない。フィールド順により年、月の順で比較される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    year: i32,
    month: u32,
}

impl MonthYear {
    /// 年と月から作成する
    ///
    /// # 引数
    /// * `year` - 西暦年（1900〜2100）
    /// * `month` - 月（1〜12）
    ///
    /// # 戻り値
    /// 月年、または範囲外の場合はバリデーションエラー
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::validation("月は1から12の間で入力してください"));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(AppError::validation(format!(
                "年は{MIN_YEAR}年から{MAX_YEAR}年の間で入力してください"
            )));
        }
        Ok(Self { year, month })
    }

    /// 日付から月年を取り出す（日は切り捨て）
    pub fn from_date<D: Datelike>(date: &D) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `MM-YYYY` 形式の文字列を解析する
    ///
    /// # 引数
    /// * `value` - 月年文字列（例: `01-2023`）
    ///
    /// # 戻り値
    /// 月年、または形式・範囲が不正な場合はバリデーションエラー
    pub fn parse(value: &str) -> AppResult<Self> {
        let captures = MONTH_YEAR_PATTERN
            .captures(value.trim())
            .ok_or_else(|| AppError::validation("日付はMM-YYYY形式で入力してください"))?;

        let month: u32 = captures[1]
            .parse()
            .map_err(|_| AppError::validation("月は数値で入力してください"))?;
        let year: i32 = captures[2]
            .parse()
            .map_err(|_| AppError::validation("年は数値で入力してください"))?;

        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// `other` までの月数の差分を返す（同じ月なら0、過去なら負）
    pub fn months_until(&self, other: &MonthYear) -> i64 {
        (i64::from(other.month) - i64::from(self.month))
            + 12 * (i64::from(other.year) - i64::from(self.year))
    }

    /// 永続化用の表現（`YYYY-MM-01`）
    pub fn to_storage_string(&self) -> String {
        format!("{:04}-{:02}-01", self.year, self.month)
    }

    /// 永続化された `YYYY-MM-DD` を読み込む（日は無視する）
    pub fn from_storage_str(value: &str) -> AppResult<Self> {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|e| AppError::Database(format!("不正な日付が保存されています: {value} ({e})")))?;
        Ok(Self::from_date(&date))
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

impl FromStr for MonthYear {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(|e| serde::de::Error::custom(e.user_message()))
    }
}

impl ToSql for MonthYear {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_storage_string()))
    }
}

impl FromSql for MonthYear {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::from_storage_str(text).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
