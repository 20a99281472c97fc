// 🗄️ Mock Store - In-memory collections behind the mock API
//
// Filled once by the fixture seeder, then frozen behind an `Arc` and shared
// read-only by every request handler. All relationship traversal goes
// through explicit foreign key lookups here.

use serde::Serialize;

use crate::entities::{Account, Currency, Group, Member, Need, Offer, Transfer};

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct MockStore {
    groups: Vec<Group>,
    members: Vec<Member>,
    needs: Vec<Need>,
    offers: Vec<Offer>,
    currencies: Vec<Currency>,
    accounts: Vec<Account>,
    transfers: Vec<Transfer>,
}

/// Collection sizes, printed by the CLI and logged at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub groups: usize,
    pub members: usize,
    pub needs: usize,
    pub offers: usize,
    pub currencies: usize,
    pub accounts: usize,
    pub transfers: usize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Insertion (seeding only)
    // ------------------------------------------------------------------------

    pub fn insert_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    pub fn insert_member(&mut self, member: Member) {
        self.members.push(member);
    }

    pub fn insert_need(&mut self, need: Need) {
        self.needs.push(need);
    }

    pub fn insert_offer(&mut self, offer: Offer) {
        self.offers.push(offer);
    }

    pub fn insert_currency(&mut self, currency: Currency) {
        self.currencies.push(currency);
    }

    pub fn insert_account(&mut self, account: Account) {
        self.accounts.push(account);
    }

    pub fn insert_transfer(&mut self, transfer: Transfer) {
        self.transfers.push(transfer);
    }

    /// Back-fill the currency of a group
    pub fn link_group_currency(&mut self, group_id: &str, currency_id: &str) -> bool {
        match self.groups.iter_mut().find(|g| g.id == group_id) {
            Some(group) => {
                group.currency_id = Some(currency_id.to_string());
                true
            }
            None => false,
        }
    }

    /// Back-fill the account of a member
    pub fn link_member_account(&mut self, member_id: &str, account_id: &str) -> bool {
        match self.members.iter_mut().find(|m| m.id == member_id) {
            Some(member) => {
                member.account_id = Some(account_id.to_string());
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------------

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn needs(&self) -> &[Need] {
        &self.needs
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            groups: self.groups.len(),
            members: self.members.len(),
            needs: self.needs.len(),
            offers: self.offers.len(),
            currencies: self.currencies.len(),
            accounts: self.accounts.len(),
            transfers: self.transfers.len(),
        }
    }

    // ------------------------------------------------------------------------
    // Social lookups
    // ------------------------------------------------------------------------

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_by_code(&self, code: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.code == code)
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn members_of_group(&self, group_id: &str) -> Vec<&Member> {
        self.members.iter().filter(|m| m.group_id == group_id).collect()
    }

    pub fn member_of_account(&self, account_id: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.account_id.as_deref() == Some(account_id))
    }

    pub fn needs_of_group(&self, group_id: &str) -> Vec<&Need> {
        self.needs.iter().filter(|n| n.group_id == group_id).collect()
    }

    /// Need by code, scoped to one group
    pub fn need_by_code(&self, group_id: &str, code: &str) -> Option<&Need> {
        self.needs
            .iter()
            .find(|n| n.group_id == group_id && n.code == code)
    }

    pub fn offers_of_group(&self, group_id: &str) -> Vec<&Offer> {
        self.offers.iter().filter(|o| o.group_id == group_id).collect()
    }

    /// Offer by code, scoped to one group
    pub fn offer_by_code(&self, group_id: &str, code: &str) -> Option<&Offer> {
        self.offers
            .iter()
            .find(|o| o.group_id == group_id && o.code == code)
    }

    // ------------------------------------------------------------------------
    // Accounting lookups
    // ------------------------------------------------------------------------

    pub fn currency(&self, id: &str) -> Option<&Currency> {
        self.currencies.iter().find(|c| c.id == id)
    }

    pub fn currency_by_code(&self, code: &str) -> Option<&Currency> {
        self.currencies.iter().find(|c| c.code == code)
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Account by code, scoped to one currency
    pub fn account_by_code(&self, currency_id: &str, code: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.currency_id() == currency_id && a.code == code)
    }

    pub fn accounts_in_currency(&self, currency_id: &str) -> Vec<&Account> {
        self.accounts
            .iter()
            .filter(|a| a.currency_id() == currency_id)
            .collect()
    }

    pub fn transfer(&self, id: &str) -> Option<&Transfer> {
        self.transfers.iter().find(|t| t.id == id)
    }

    /// Transfers where any of the accounts is payer or payee
    pub fn transfers_involving(&self, account_ids: &[String]) -> Vec<&Transfer> {
        self.transfers
            .iter()
            .filter(|t| account_ids.iter().any(|id| t.involves(id)))
            .collect()
    }

    /// Currency of an account (follows the account foreign key)
    pub fn currency_of_account(&self, account: &Account) -> Option<&Currency> {
        self.currency(account.currency_id())
    }

    pub fn payer(&self, transfer: &Transfer) -> Option<&Account> {
        self.account(&transfer.payer_id)
    }

    pub fn payee(&self, transfer: &Transfer) -> Option<&Account> {
        self.account(&transfer.payee_id)
    }

    /// Check that payer and payee belong to the transfer currency
    pub fn is_consistent(&self, transfer: &Transfer) -> bool {
        match (self.payer(transfer), self.payee(transfer)) {
            (Some(payer), Some(payee)) => {
                payer.currency_id() == transfer.currency_id
                    && payee.currency_id() == transfer.currency_id
            }
            _ => false,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
