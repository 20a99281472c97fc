// 👥 Social Routes - Groups, members, needs and offers

use axum::extract::{Path, Query, State};
use std::collections::HashMap;

use super::{ApiError, AppState, Document, Resources};
use crate::entities::Group;
use crate::query::QueryParams;
use crate::store::MockStore;

/// Relationships of needs and offers that `include` may name
const POST_INCLUDES: &[&str] = &["member", "group"];

type ApiResult = Result<Document, ApiError>;

fn find_group<'a>(store: &'a MockStore, code: &str) -> Result<&'a Group, ApiError> {
    store
        .group_by_code(code)
        .ok_or_else(|| ApiError::not_found("group", code))
}

/// GET /:group
pub async fn get_group(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let params = QueryParams::parse(&raw);
    params.check_includes(&["currency"])?;

    let group = find_group(&state.store, &code)?;
    let resources = state.resources();
    let mut document = Document::one(resources.group(group));
    if params.includes("currency") {
        if let Some(currency) = group.currency_id.as_deref().and_then(|id| state.store.currency(id)) {
            document.include(resources.currency(currency));
        }
    }
    Ok(document)
}

/// GET /:group/members?filter[account]=<id>[,<id>]
pub async fn list_members(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let mut params = QueryParams::parse(&raw);
    params.check_includes(&["account", "group"])?;

    let group = find_group(&state.store, &code)?;
    let mut members = state.store.members_of_group(&group.id);
    if let Some(account_ids) = params.take_filter("account") {
        members.retain(|m| {
            m.account_id
                .as_deref()
                .is_some_and(|id| account_ids.iter().any(|a| a.trim() == id))
        });
    }
    let members = params.apply(members)?;

    let resources = state.resources();
    let mut document = Document::many(members.iter().map(|m| resources.member(m)).collect());
    if params.includes("account") {
        for member in &members {
            if let Some(account) = member.account_id.as_deref().and_then(|id| state.store.account(id)) {
                document.include(resources.account(account));
            }
        }
    }
    if params.includes("group") && !members.is_empty() {
        document.include(resources.group(group));
    }
    Ok(document)
}

/// GET /:group/members/:id
pub async fn get_member(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, String)>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let params = QueryParams::parse(&raw);
    params.check_includes(&["account", "group"])?;

    let group = find_group(&state.store, &code)?;
    let member = state
        .store
        .member(&id)
        .filter(|m| m.group_id == group.id)
        .ok_or_else(|| ApiError::not_found("member", &id))?;

    let resources = state.resources();
    let mut document = Document::one(resources.member(member));
    if params.includes("account") {
        if let Some(account) = member.account_id.as_deref().and_then(|id| state.store.account(id)) {
            document.include(resources.account(account));
        }
    }
    if params.includes("group") {
        document.include(resources.group(group));
    }
    Ok(document)
}

/// Add the authors and the group of needs or offers to `included`
fn include_post_relations<'a>(
    document: &mut Document,
    resources: &Resources<'_>,
    store: &MockStore,
    params: &QueryParams,
    group: &Group,
    member_ids: impl IntoIterator<Item = &'a str>,
) {
    if params.includes("member") {
        for member in member_ids.into_iter().filter_map(|id| store.member(id)) {
            document.include(resources.member(member));
        }
    }
    if params.includes("group") {
        document.include(resources.group(group));
    }
}

// ============================================================================
// Needs
// ============================================================================

/// GET /:group/needs
pub async fn list_needs(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let params = QueryParams::parse(&raw);
    params.check_includes(POST_INCLUDES)?;

    let group = find_group(&state.store, &code)?;
    let needs = params.apply(state.store.needs_of_group(&group.id))?;

    let resources = state.resources();
    let mut document = Document::many(needs.iter().map(|n| resources.need(n)).collect());
    if !needs.is_empty() {
        let authors = needs.iter().map(|n| n.member_id.as_str());
        include_post_relations(&mut document, &resources, &state.store, &params, group, authors);
    }
    Ok(document)
}

/// GET /:group/needs/:code
pub async fn get_need(
    State(state): State<AppState>,
    Path((group_code, code)): Path<(String, String)>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let params = QueryParams::parse(&raw);
    params.check_includes(POST_INCLUDES)?;

    let group = find_group(&state.store, &group_code)?;
    let need = state
        .store
        .need_by_code(&group.id, &code)
        .ok_or_else(|| ApiError::not_found("need", &code))?;

    let resources = state.resources();
    let mut document = Document::one(resources.need(need));
    let author = [need.member_id.as_str()];
    include_post_relations(&mut document, &resources, &state.store, &params, group, author);
    Ok(document)
}

// ============================================================================
// Offers
// ============================================================================

/// GET /:group/offers
pub async fn list_offers(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let params = QueryParams::parse(&raw);
    params.check_includes(POST_INCLUDES)?;

    let group = find_group(&state.store, &code)?;
    let offers = params.apply(state.store.offers_of_group(&group.id))?;

    let resources = state.resources();
    let mut document = Document::many(offers.iter().map(|o| resources.offer(o)).collect());
    if !offers.is_empty() {
        let authors = offers.iter().map(|o| o.member_id.as_str());
        include_post_relations(&mut document, &resources, &state.store, &params, group, authors);
    }
    Ok(document)
}

/// GET /:group/offers/:code
pub async fn get_offer(
    State(state): State<AppState>,
    Path((group_code, code)): Path<(String, String)>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult {
    let params = QueryParams::parse(&raw);
    params.check_includes(POST_INCLUDES)?;

    let group = find_group(&state.store, &group_code)?;
    let offer = state
        .store
        .offer_by_code(&group.id, &code)
        .ok_or_else(|| ApiError::not_found("offer", &code))?;

    let resources = state.resources();
    let mut document = Document::one(resources.offer(offer));
    let author = [offer.member_id.as_str()];
    include_post_relations(&mut document, &resources, &state.store, &params, group, author);
    Ok(document)
}
