// 💱 Accounting Routes - Currencies, accounts and transfers
//
// Every route is scoped by the currency code in the path. Records from
// other currencies are reported as not found.

use axum::extract::{Path, Query, State};
use std::collections::HashMap;

use super::{ApiError, AppState, Document};
use crate::entities::Currency;
use crate::query::QueryParams;
use crate::store::MockStore;

type ApiResult = Result<Document, ApiError>;

fn find_currency<'a>(store: &'a MockStore, code: &str) -> Result<&'a Currency, ApiError> {
    store
        .currency_by_code(code)
        .ok_or_else(|| ApiError::not_found("currency", code))
}

/// GET /:currency/currency
pub async fn get_currency(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    QueryParams::parse(&raw).check_includes(&[])?;
    let currency = find_currency(&state.store, &code)?;
    Ok(Document::one(state.resources().currency(currency)))
}

/// GET /:currency/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let params = QueryParams::parse(&raw);
    params.check_includes(&["currency"])?;

    let currency = find_currency(&state.store, &code)?;
    let accounts = params.apply(state.store.accounts_in_currency(&currency.id))?;

    let resources = state.resources();
    let mut document = Document::many(accounts.iter().map(|a| resources.account(a)).collect());
    if params.includes("currency") && !accounts.is_empty() {
        document.include(resources.currency(currency));
    }
    Ok(document)
}

/// GET /:currency/accounts/:code
pub async fn get_account(
    State(state): State<AppState>,
    Path((currency_code, account_code)): Path<(String, String)>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let params = QueryParams::parse(&raw);
    params.check_includes(&["currency"])?;

    let currency = find_currency(&state.store, &currency_code)?;
    let account = state
        .store
        .account_by_code(&currency.id, &account_code)
        .ok_or_else(|| ApiError::not_found("account", &account_code))?;

    let resources = state.resources();
    let mut document = Document::one(resources.account(account));
    if params.includes("currency") {
        document.include(resources.currency(currency));
    }
    Ok(document)
}

/// GET /:currency/transfers?filter[account]=<id>[,<id>]
///
/// Listing every transfer of a currency is not supported: the account
/// filter is mandatory.
pub async fn list_transfers(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let mut params = QueryParams::parse(&raw);
    params.check_includes(&["payer", "payee", "currency"])?;

    let account_ids: Vec<String> = params
        .take_filter("account")
        .ok_or_else(|| ApiError::unexpected("transfers can only be listed with filter[account]"))?
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    let currency = find_currency(&state.store, &code)?;
    let involved: Vec<_> = state
        .store
        .transfers_involving(&account_ids)
        .into_iter()
        .filter(|t| t.currency_id == currency.id)
        .collect();
    let transfers = params.apply(involved)?;

    let resources = state.resources();
    let mut document = Document::many(transfers.iter().map(|t| resources.transfer(t)).collect());
    for transfer in &transfers {
        if params.includes("payer") {
            if let Some(payer) = state.store.payer(transfer) {
                document.include(resources.account(payer));
            }
        }
        if params.includes("payee") {
            if let Some(payee) = state.store.payee(transfer) {
                document.include(resources.account(payee));
            }
        }
    }
    if params.includes("currency") && !transfers.is_empty() {
        document.include(resources.currency(currency));
    }
    Ok(document)
}

/// GET /:currency/transfers/:id
pub async fn get_transfer(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, String)>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let params = QueryParams::parse(&raw);
    params.check_includes(&["payer", "payee", "currency"])?;

    let currency = find_currency(&state.store, &code)?;
    let transfer = state
        .store
        .transfer(&id)
        .filter(|t| t.currency_id == currency.id)
        .ok_or_else(|| ApiError::not_found("transfer", &id))?;

    let resources = state.resources();
    let mut document = Document::one(resources.transfer(transfer));
    if params.includes("payer") {
        if let Some(payer) = state.store.payer(transfer) {
            document.include(resources.account(payer));
        }
    }
    if params.includes("payee") {
        if let Some(payee) = state.store.payee(transfer) {
            document.include(resources.account(payee));
        }
    }
    if params.includes("currency") {
        document.include(resources.currency(currency));
    }
    Ok(document)
}
