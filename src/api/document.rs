// 📄 JSON:API Documents - Resources, linkage and `included`
//
// `Resources` turns store records into resources and resolves their
// relationship linkage and `links.self` URLs.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{ApiError, JSONAPI_MEDIA_TYPE};
use crate::config::AppConfig;
use crate::error::{ErrorCode, KError};
use crate::entities::{Account, Currency, Group, Member, Need, Offer, Transfer};
use crate::store::MockStore;

// ============================================================================
// Document model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceLinks {
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub attributes: Value,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,
    pub links: ResourceLinks,
}

impl Resource {
    pub fn new(kind: &'static str, id: &str, attributes: Value, self_link: String) -> Self {
        Resource {
            kind,
            id: id.to_string(),
            attributes,
            relationships: Map::new(),
            links: ResourceLinks { self_link },
        }
    }

    /// Add a to-one relationship; `None` serializes as `data: null`
    #[must_use]
    pub fn relate(mut self, name: &str, kind: &str, id: Option<&str>) -> Self {
        let data = match id {
            Some(id) => json!({ "type": kind, "id": id }),
            None => Value::Null,
        };
        self.relationships.insert(name.to_string(), json!({ "data": data }));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    One(Resource),
    Many(Vec<Resource>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub data: PrimaryData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
}

impl Document {
    pub fn one(resource: Resource) -> Self {
        Document {
            data: PrimaryData::One(resource),
            included: Vec::new(),
        }
    }

    pub fn many(resources: Vec<Resource>) -> Self {
        Document {
            data: PrimaryData::Many(resources),
            included: Vec::new(),
        }
    }

    /// Add a related resource once; primary resources are never repeated
    pub fn include(&mut self, resource: Resource) {
        let same = |r: &Resource| r.kind == resource.kind && r.id == resource.id;
        let in_primary = match &self.data {
            PrimaryData::One(primary) => same(primary),
            PrimaryData::Many(primary) => primary.iter().any(same),
        };
        if !in_primary && !self.included.iter().any(same) {
            self.included.push(resource);
        }
    }
}

impl IntoResponse for Document {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self) {
            Ok(body) => ([(header::CONTENT_TYPE, JSONAPI_MEDIA_TYPE)], body).into_response(),
            Err(e) => {
                ApiError::from(KError::new(ErrorCode::Internal, format!("serializing document: {}", e)))
                    .into_response()
            }
        }
    }
}

// ============================================================================
// Resource builders
// ============================================================================

/// Turns store records into resources with URLs under the configured base
pub struct Resources<'a> {
    store: &'a MockStore,
    base_url: &'a str,
    accounting_path: &'a str,
    social_path: &'a str,
}

impl<'a> Resources<'a> {
    pub fn new(store: &'a MockStore, config: &'a AppConfig) -> Self {
        Resources {
            store,
            base_url: &config.server.base_url,
            accounting_path: &config.api.accounting_path,
            social_path: &config.api.social_path,
        }
    }

    fn accounting_url(&self, segments: &[&str]) -> String {
        url(self.base_url, self.accounting_path, segments)
    }

    fn social_url(&self, segments: &[&str]) -> String {
        url(self.base_url, self.social_path, segments)
    }

    /// Currency code of a currency ID, falling back to the ID itself
    fn currency_code<'b>(&'b self, currency_id: &'b str) -> &'b str {
        self.store
            .currency(currency_id)
            .map_or(currency_id, |c| c.code.as_str())
    }

    pub fn currency(&self, currency: &Currency) -> Resource {
        Resource::new(
            "currencies",
            &currency.id,
            currency.attributes(),
            self.accounting_url(&[&currency.code, "currency"]),
        )
    }

    pub fn account(&self, account: &Account) -> Resource {
        let currency_code = self.currency_code(account.currency_id());
        Resource::new(
            "accounts",
            &account.id,
            account.attributes(),
            self.accounting_url(&[currency_code, "accounts", &account.code]),
        )
        .relate("currency", "currencies", Some(account.currency_id()))
    }

    pub fn transfer(&self, transfer: &Transfer) -> Resource {
        let currency_code = self.currency_code(&transfer.currency_id);
        Resource::new(
            "transfers",
            &transfer.id,
            transfer.attributes(),
            self.accounting_url(&[currency_code, "transfers", &transfer.id]),
        )
        .relate("payer", "accounts", Some(&transfer.payer_id))
        .relate("payee", "accounts", Some(&transfer.payee_id))
        .relate("currency", "currencies", Some(&transfer.currency_id))
    }

    pub fn group(&self, group: &Group) -> Resource {
        Resource::new(
            "groups",
            &group.id,
            group.attributes(),
            self.social_url(&[&group.code]),
        )
        .relate("currency", "currencies", group.currency_id.as_deref())
    }

    pub fn member(&self, member: &Member) -> Resource {
        let group_code = self.group_code(&member.group_id);
        Resource::new(
            "members",
            &member.id,
            member.attributes(),
            self.social_url(&[group_code, "members", &member.id]),
        )
        .relate("group", "groups", Some(&member.group_id))
        .relate("account", "accounts", member.account_id.as_deref())
    }

    /// Code of the group, or its ID when the group is missing
    fn group_code<'b>(&'b self, group_id: &'b str) -> &'b str {
        self.store.group(group_id).map_or(group_id, |g| g.code.as_str())
    }

    pub fn need(&self, need: &Need) -> Resource {
        let group_code = self.group_code(&need.group_id);
        Resource::new(
            "needs",
            &need.id,
            need.attributes(),
            self.social_url(&[group_code, "needs", &need.code]),
        )
        .relate("member", "members", Some(&need.member_id))
        .relate("group", "groups", Some(&need.group_id))
    }

    pub fn offer(&self, offer: &Offer) -> Resource {
        let group_code = self.group_code(&offer.group_id);
        Resource::new(
            "offers",
            &offer.id,
            offer.attributes(),
            self.social_url(&[group_code, "offers", &offer.code]),
        )
        .relate("member", "members", Some(&offer.member_id))
        .relate("group", "groups", Some(&offer.group_id))
    }
}

fn url(base_url: &str, prefix: &str, segments: &[&str]) -> String {
    let mut url = format!("{}{}", base_url, prefix);
    for segment in segments {
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> Resource {
        Resource::new("accounts", id, json!({}), format!("http://x/{}", id))
    }

    #[test]
    fn test_url_encodes_segments() {
        assert_eq!(
            url("http://localhost:2025", "/accounting", &["GRP0", "accounts", "A B"]),
            "http://localhost:2025/accounting/GRP0/accounts/A%20B"
        );
    }

    #[test]
    fn test_relationship_linkage() {
        let resource = account("a-1")
            .relate("currency", "currencies", Some("c-1"))
            .relate("member", "members", None);
        let json = serde_json::to_value(&resource).unwrap();

        assert_eq!(json["type"], "accounts");
        assert_eq!(json["relationships"]["currency"]["data"]["id"], "c-1");
        assert!(json["relationships"]["member"]["data"].is_null());
        assert_eq!(json["links"]["self"], "http://x/a-1");
    }

    #[test]
    fn test_include_skips_duplicates_and_primary() {
        let mut document = Document::many(vec![account("a-1")]);
        document.include(account("a-1"));
        document.include(account("a-2"));
        document.include(account("a-2"));

        assert_eq!(document.included.len(), 1);
        assert_eq!(document.included[0].id, "a-2");
    }

    #[test]
    fn test_empty_included_is_omitted() {
        let json = serde_json::to_value(Document::one(account("a-1"))).unwrap();
        assert!(json.get("included").is_none());
        assert_eq!(json["data"]["id"], "a-1");
    }
}
