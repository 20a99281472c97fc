// 🌱 Fixtures - Deterministic seed data for the mock API
//
// Order matters:
// 1. social seeds (groups, members)
// 2. one currency per group, back-filled into the group
// 3. one account per member, back-filled into the member
// 4. transfers between the first account and a few partners
// 5. needs and offers of group members
//
// Same seed + same reference time → same store, byte for byte.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::SeedConfig;
use crate::entities::account::UNLIMITED;
use crate::entities::{
    Account, Currency, CurrencyStats, Group, Member, Need, Offer, Transfer, TransferState,
};
use crate::store::MockStore;

const NOUNS: &[&str] = &[
    "driver", "protocol", "bandwidth", "panel", "microchip", "program", "port", "card",
    "array", "interface", "system", "sensor", "firewall", "pixel", "alarm", "feed",
    "monitor", "application", "transmitter", "bus", "circuit", "capacitor", "matrix",
];

const SYMBOLS: &[&str] = &["$", "€", "£", "¥", "₹", "₩", "₽", "kr", "Fr", "ħ", "ℏ", "₭"];

const ADJECTIVES: &[&str] = &[
    "Adaptive", "Balanced", "Centralized", "Cross-platform", "Decentralized", "Ergonomic",
    "Focused", "Horizontal", "Innovative", "Managed", "Open-source", "Persistent",
    "Proactive", "Reactive", "Robust", "Synergized", "Universal", "Virtual",
];

const DESCRIPTORS: &[&str] = &[
    "24/7", "asynchronous", "bottom-line", "coherent", "contextually-based", "dedicated",
    "dynamic", "empowering", "fresh-thinking", "holistic", "local", "modular", "optimal",
    "real-time", "tangible", "transitional", "uniform", "zero tolerance",
];

const PHRASE_NOUNS: &[&str] = &[
    "ability", "access", "alliance", "approach", "capacity", "database", "focus group",
    "framework", "hub", "initiative", "knowledge user", "middleware", "migration",
    "paradigm", "policy", "project", "solution", "strategy", "toolset", "workforce",
];

const FIRST_NAMES: &[&str] = &[
    "Esteban", "Aina", "Pau", "Laia", "Joan", "Marta", "Oriol", "Nuria", "Jordi", "Carla",
    "Marc", "Julia", "Sergi", "Clara", "Albert", "Irene",
];

const LAST_NAMES: &[&str] = &[
    "Baby", "Puig", "Soler", "Vidal", "Ferrer", "Serra", "Roca", "Font", "Mas", "Pujol",
    "Vila", "Riera", "Prat", "Camps",
];

const PLACES: &[&str] = &[
    "Riverside", "Hillcrest", "Lakeview", "Oakwood", "Harbor", "Meadow", "Stonebridge",
    "Fairview", "Millbrook", "Greenfield",
];

const LOREM: &[&str] = &[
    "et", "quae", "possimus", "modi", "quia", "dolorem", "ipsum", "sed", "voluptas",
    "aut", "nihil", "omnis", "rerum", "facilis", "est", "magnam", "vero", "dolor",
    "labore", "eius", "tempora", "minima", "veniam", "nostrum",
];

const CATEGORIES: &[&str] = &[
    "build", "food", "transport", "care", "learning", "repairs", "garden", "technology",
];

const GOODS: &[&str] = &[
    "bread", "eggs", "bicycle", "lessons", "haircut", "jam", "firewood", "sewing",
    "tomatoes", "plumbing", "honey", "translation",
];

/// Length of the content prefix used as need/offer code
const CODE_LENGTH: usize = 10;

/// Seed a fresh store
///
/// `reference` stands for "now": creation dates lie before it and expiry
/// dates after it.
pub fn seed(config: &SeedConfig, reference: DateTime<Utc>) -> MockStore {
    let mut seeder = Seeder::new(config.seed, reference);

    seeder.seed_social(config.groups, config.members_per_group);
    seeder.seed_currencies();
    seeder.seed_accounts();
    seeder.seed_transfers(config.transfer_partners);
    seeder.seed_needs(config.needs_per_group);
    seeder.seed_offers(config.offers_per_group);

    let store = seeder.finish();
    debug!(summary = ?store.summary(), seed = config.seed, "fixtures seeded");
    store
}

// ============================================================================
// SEEDER
// ============================================================================

struct Seeder {
    rng: StdRng,
    reference: DateTime<Utc>,
    store: MockStore,
    /// Sequence number of the next transfer (drives its state)
    transfer_seq: usize,
}

impl Seeder {
    fn new(seed: u64, reference: DateTime<Utc>) -> Self {
        Seeder {
            rng: StdRng::seed_from_u64(seed),
            reference,
            store: MockStore::new(),
            transfer_seq: 0,
        }
    }

    fn finish(self) -> MockStore {
        self.store
    }

    fn seed_social(&mut self, groups: usize, members_per_group: usize) {
        for g in 0..groups {
            let group = Group {
                id: self.uuid(),
                code: format!("GRP{}", g),
                name: format!("{} Exchange", self.pick(PLACES)),
                currency_id: None,
            };
            for _ in 0..members_per_group {
                let member = Member {
                    id: self.uuid(),
                    name: format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES)),
                    group_id: group.id.clone(),
                    account_id: None,
                };
                self.store.insert_member(member);
            }
            self.store.insert_group(group);
        }
    }

    /// One currency per group, sharing the group code
    fn seed_currencies(&mut self) {
        let groups: Vec<(String, String)> = self
            .store
            .groups()
            .iter()
            .map(|g| (g.id.clone(), g.code.clone()))
            .collect();

        for (group_id, code) in groups {
            let noun = self.pick(NOUNS);
            let currency = Currency {
                id: self.uuid(),
                code,
                code_type: "CEN".to_string(),
                name: noun.to_string(),
                name_plural: format!("{}s", noun),
                symbol: self.pick(SYMBOLS).to_string(),
                decimals: 2,
                value: 100_000,
                scale: 4,
                stats: CurrencyStats {
                    transactions: self.rng.random_range(0..=10_000),
                    exchanges: self.rng.random_range(0..=10_000),
                    circulation: self.rng.random_range(0..=10_000),
                },
            };
            let currency_id = currency.id.clone();
            self.store.insert_currency(currency);
            self.store.link_group_currency(&group_id, &currency_id);
        }
    }

    /// One account per member: code = group code + global member index
    fn seed_accounts(&mut self) {
        let members: Vec<(usize, String, String)> = self
            .store
            .members()
            .iter()
            .enumerate()
            .map(|(i, m)| (i, m.id.clone(), m.group_id.clone()))
            .collect();

        for (i, member_id, group_id) in members {
            let (code, currency_id) = match self.store.group(&group_id) {
                Some(Group { code, currency_id: Some(currency_id), .. }) => (code.clone(), currency_id.clone()),
                _ => continue,
            };
            let account = Account::new(
                self.uuid(),
                format!("{}{:04}", code, i),
                currency_id,
                self.rng.random_range(-50_000..=100_000) * 100,
                UNLIMITED,
                5_000_000,
            );
            let account_id = account.id.clone();
            self.store.insert_account(account);
            self.store.link_member_account(&member_id, &account_id);
        }
    }

    /// Per partner: 2 transfers from the first account, 3 towards it
    fn seed_transfers(&mut self, partners: usize) {
        let first = match self.store.accounts().first() {
            Some(account) => account.clone(),
            None => return,
        };
        let others: Vec<String> = self
            .store
            .accounts_in_currency(first.currency_id())
            .into_iter()
            .filter(|a| a.id != first.id)
            .take(partners)
            .map(|a| a.id.clone())
            .collect();

        for other in others {
            for _ in 0..2 {
                self.create_transfer(&first.id, &other, first.currency_id());
            }
            for _ in 0..3 {
                self.create_transfer(&other, &first.id, first.currency_id());
            }
        }
    }

    fn create_transfer(&mut self, payer_id: &str, payee_id: &str, currency_id: &str) {
        let i = self.transfer_seq;
        self.transfer_seq += 1;

        let created = self.recent((i % 5) as i64);
        let updated = self.between(created, self.reference);
        let state = if i < 3 {
            TransferState::Pending { expires: self.future() }
        } else if i % 8 == 0 {
            TransferState::Rejected
        } else {
            TransferState::Committed
        };

        let transfer = Transfer {
            id: self.uuid(),
            amount: self.rng.random_range(10..=10_000) * 100,
            meta: self.catch_phrase(),
            state,
            created,
            updated,
            payer_id: payer_id.to_string(),
            payee_id: payee_id.to_string(),
            currency_id: currency_id.to_string(),
        };
        self.store.insert_transfer(transfer);
    }

    fn seed_needs(&mut self, per_group: usize) {
        for (group_id, members) in self.group_members() {
            let mut codes = Vec::new();
            for _ in 0..per_group {
                let Some(member_id) = members.choose(&mut self.rng).cloned() else {
                    break;
                };
                let content = self.paragraph();
                let created = self.recent(30);
                let need = Need {
                    id: self.uuid(),
                    code: unique_code(&content, &mut codes),
                    content,
                    category: self.pick(CATEGORIES).to_string(),
                    member_id,
                    group_id: group_id.clone(),
                    created,
                    updated: self.between(created, self.reference),
                    expires: self.future(),
                };
                self.store.insert_need(need);
            }
        }
    }

    fn seed_offers(&mut self, per_group: usize) {
        for (group_id, members) in self.group_members() {
            let mut codes = Vec::new();
            for _ in 0..per_group {
                let Some(member_id) = members.choose(&mut self.rng).cloned() else {
                    break;
                };
                let name = format!("{} {}", self.pick(ADJECTIVES), self.pick(GOODS));
                let created = self.recent(30);
                let offer = Offer {
                    id: self.uuid(),
                    code: unique_code(&name, &mut codes),
                    name,
                    content: self.paragraph(),
                    category: self.pick(CATEGORIES).to_string(),
                    price: format!("{} hours", self.rng.random_range(1..=8)),
                    member_id,
                    group_id: group_id.clone(),
                    created,
                    updated: self.between(created, self.reference),
                    expires: self.future(),
                };
                self.store.insert_offer(offer);
            }
        }
    }

    /// Member IDs of every group, in seeding order
    fn group_members(&self) -> Vec<(String, Vec<String>)> {
        self.store
            .groups()
            .iter()
            .map(|g| {
                let members = self
                    .store
                    .members_of_group(&g.id)
                    .into_iter()
                    .map(|m| m.id.clone())
                    .collect();
                (g.id.clone(), members)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Random helpers
    // ------------------------------------------------------------------------

    fn uuid(&mut self) -> String {
        let bytes: [u8; 16] = self.rng.random();
        uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
    }

    fn pick(&mut self, words: &'static [&'static str]) -> &'static str {
        words.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn catch_phrase(&mut self) -> String {
        format!(
            "{} {} {}",
            self.pick(ADJECTIVES),
            self.pick(DESCRIPTORS),
            self.pick(PHRASE_NOUNS)
        )
    }

    /// Capitalized sentence of 6 to 12 lorem words
    fn paragraph(&mut self) -> String {
        let count = self.rng.random_range(6..=12);
        let words: Vec<&str> = (0..count).map(|_| self.pick(LOREM)).collect();
        let sentence = words.join(" ");
        let mut chars = sentence.chars();
        match chars.next() {
            Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
            None => sentence,
        }
    }

    /// Random instant within the last `days` days (at least one)
    fn recent(&mut self, days: i64) -> DateTime<Utc> {
        let span = Duration::days(days.max(1)).num_milliseconds();
        self.reference - Duration::milliseconds(self.rng.random_range(0..=span))
    }

    /// Random instant within the next year
    fn future(&mut self) -> DateTime<Utc> {
        let span = Duration::days(365).num_milliseconds();
        self.reference + Duration::milliseconds(self.rng.random_range(1..=span))
    }

    fn between(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> DateTime<Utc> {
        let span = (to - from).num_milliseconds().max(0);
        from + Duration::milliseconds(self.rng.random_range(0..=span))
    }
}

/// First characters of the text with spaces as dashes, e.g. "Et-quae-po"
///
/// A numeric suffix keeps codes unique among the ones already `taken`.
fn unique_code(text: &str, taken: &mut Vec<String>) -> String {
    let base: String = text
        .chars()
        .take(CODE_LENGTH)
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    let mut code = base.clone();
    let mut n = 1;
    while taken.contains(&code) {
        n += 1;
        code = format!("{}-{}", base, n);
    }
    taken.push(code.clone());
    code
}

// ============================================================================
// TESTS
// ============================================================================
