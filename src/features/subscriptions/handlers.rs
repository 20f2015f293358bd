use super::cost::CostQuery;
use super::models::{CreatedSubscription, SubscriptionDto, TotalCost};
use super::service::SubscriptionService;
use crate::server::{empty_response, json_response, HttpResponse};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{non_empty, MonthYear};
use hyper::body::Bytes;
use hyper::StatusCode;

/// サブスクリプションを作成する（POST /subscriptions）
///
/// # 戻り値
/// 201と採番されたID
pub fn create_subscription(service: &SubscriptionService, body: &Bytes) -> AppResult<HttpResponse> {
    let dto = parse_payload(body)?;
    let id = service.create(dto)?;
    Ok(json_response(StatusCode::CREATED, &CreatedSubscription { id }))
}

/// サブスクリプション一覧を取得する（GET /subscriptions）
pub fn list_subscriptions(service: &SubscriptionService) -> AppResult<HttpResponse> {
    let subscriptions = service.list()?;
    Ok(json_response(StatusCode::OK, &subscriptions))
}

/// IDでサブスクリプションを取得する（GET /subscriptions/{id}）
///
/// # 戻り値
/// 200とレコード、存在しない場合はNotFound
pub fn get_subscription(service: &SubscriptionService, id: &str) -> AppResult<HttpResponse> {
    match service.get(id)? {
        Some(subscription) => Ok(json_response(StatusCode::OK, &subscription)),
        None => {
            log::info!("サブスクリプションが見つかりません: id={id}");
            Err(AppError::not_found(format!("ID {id} のサブスクリプション")))
        }
    }
}

/// サブスクリプションを更新する（PUT /subscriptions/{id}）
pub fn update_subscription(
    service: &SubscriptionService,
    id: &str,
    body: &Bytes,
) -> AppResult<HttpResponse> {
    let dto = parse_payload(body)?;
    service.update(id, dto)?;
    Ok(empty_response(StatusCode::OK))
}

/// サブスクリプションを削除する（DELETE /subscriptions/{id}）
pub fn delete_subscription(service: &SubscriptionService, id: &str) -> AppResult<HttpResponse> {
    service.delete(id)?;
    Ok(empty_response(StatusCode::NO_CONTENT))
}

/// 期間内の合計費用を取得する（GET /total）
///
/// # 引数
/// * `query` - クエリ文字列（`user_id`, `service_name`, `from`, `to`）
pub fn get_total_cost(service: &SubscriptionService, query: Option<&str>) -> AppResult<HttpResponse> {
    let query = parse_cost_query(query.unwrap_or(""))?;
    let total_cost = service.total_cost(&query)?;
    Ok(json_response(StatusCode::OK, &TotalCost { total_cost }))
}

/// リクエスト本文をDTOとして解析する
fn parse_payload(body: &Bytes) -> AppResult<SubscriptionDto> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("入力内容が不正です: {e}")))
}

/// 合計費用のクエリパラメータを解析する
fn parse_cost_query(query: &str) -> AppResult<CostQuery> {
    let mut user_id = None;
    let mut service_name = None;
    let mut from = None;
    let mut to = None;

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "user_id" => user_id = Some(value.into_owned()),
            "service_name" => service_name = Some(value.into_owned()),
            "from" => from = Some(value.into_owned()),
            "to" => to = Some(value.into_owned()),
            _ => {}
        }
    }

    Ok(CostQuery {
        user_id: non_empty(user_id),
        service_name: non_empty(service_name),
        from: parse_month_param("from", from)?,
        to: parse_month_param("to", to)?,
    })
}

fn parse_month_param(name: &str, value: Option<String>) -> AppResult<MonthYear> {
    let value = value.ok_or_else(|| AppError::validation(format!("{name} は必須です")))?;
    MonthYear::parse(&value).map_err(|_| {
        log::warn!("{name} の日付形式が不正です: {value}");
        AppError::validation(format!("{name} の日付形式が不正です（MM-YYYY）"))
    })
}
