// Komunitin - command line entry point
//
//   komunitin seed            print the seeded fixtures
//   komunitin locale [code]   show or change the saved locale

use anyhow::{Context, Result};
use chrono::Utc;
use std::env;
use std::sync::Arc;

use komunitin::i18n::{ActiveLocale, EmbeddedLoader, LocaleContext};
use komunitin::{fixtures, logging, AppConfig, SqlitePreferences, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    logging::init(&config.log);

    match args.get(1).map(String::as_str) {
        Some("seed") | None => run_seed(&config).await,
        Some("locale") => run_locale(&config, args.get(2).map(String::as_str)).await,
        Some("version") | Some("--version") => {
            println!("komunitin {}", VERSION);
            Ok(())
        }
        Some(other) => {
            eprintln!("❌ Unknown command: {}", other);
            eprintln!("   Usage: komunitin [seed | locale [code] | version]");
            std::process::exit(2);
        }
    }
}

async fn boot_locale(config: &AppConfig) -> Result<LocaleContext> {
    let prefs = SqlitePreferences::open(&config.locale.preferences_path).with_context(|| {
        format!(
            "opening preferences at {}",
            config.locale.preferences_path.display()
        )
    })?;
    let env_locale = config.locale.environment_locale();
    LocaleContext::boot(Arc::new(EmbeddedLoader), Arc::new(prefs), env_locale.as_deref())
        .await
        .context("loading locale")
}

fn describe(locale: &ActiveLocale) -> String {
    let pack = &locale.language_pack;
    format!("{} / {} ({})", pack.native_name, pack.iso_name, locale.code)
}

async fn run_seed(config: &AppConfig) -> Result<()> {
    let context = boot_locale(config).await?;
    let locale = context.active();
    let now = Utc::now();
    let store = fixtures::seed(&config.seed, now);
    let summary = store.summary();

    let count = |key: &str, n: usize| locale.tr_or_key(key, &[("count", n.to_string())]);

    println!("🌱 {}", locale.tr_or_key("seed-title", &[]));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", count("seed-groups", summary.groups));
    println!("{}", count("seed-members", summary.members));
    println!("{}", count("seed-needs", summary.needs));
    println!("{}", count("seed-offers", summary.offers));
    println!("{}", count("seed-currencies", summary.currencies));
    println!("{}", count("seed-accounts", summary.accounts));
    println!("{}", count("seed-transfers", summary.transfers));

    for transfer in store.transfers() {
        let (Some(payer), Some(payee)) = (store.payer(transfer), store.payee(transfer)) else {
            continue;
        };
        let amount = match store.currency(&transfer.currency_id) {
            Some(currency) => format!("{:.2} {}", currency.to_display(transfer.amount), currency.symbol),
            None => transfer.amount.to_string(),
        };
        println!(
            "  {} → {}  {:>12}  {:<9}  {}",
            payer.code,
            payee.code,
            amount,
            transfer.state.as_str(),
            locale.format_relative(transfer.created, now)
        );
    }

    Ok(())
}

async fn run_locale(config: &AppConfig, requested: Option<&str>) -> Result<()> {
    let context = boot_locale(config).await?;

    match requested {
        Some(code) => {
            context
                .set_locale(code)
                .await
                .with_context(|| format!("switching locale to {}", code))?;
            let locale = context.active();
            println!("✓ {}", locale.tr_or_key("locale-changed", &[("lang", describe(&locale))]));
        }
        None => {
            let locale = context.active();
            println!("{}", locale.tr_or_key("locale-current", &[("lang", describe(&locale))]));
            println!("   {}", context.supported().join(", "));
        }
    }

    Ok(())
}
