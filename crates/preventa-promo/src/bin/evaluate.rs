//! # Offer Evaluator
//!
//! Runs the promotions engine over a JSON fixture and prints what it decided.
//! Used to reproduce pricing reports from the field.
//!
//! ## Usage
//! ```bash
//! # Eligible offers and the cart at gross
//! cargo run -p preventa-promo --bin evaluate -- --input order.json
//!
//! # Apply offers in the order a seller tapped them
//! cargo run -p preventa-promo --bin evaluate -- --input order.json --apply VOL-1,BON-3
//!
//! # Pin the calendar day and use a specific config
//! cargo run -p preventa-promo --bin evaluate -- --input order.json --today 2026-10-19 --config promo.toml
//! ```
//!
//! ## Fixture Format
//! ```json
//! {
//!   "order":    { "codigoEmpresa": "01", "items": [ ... ] },
//!   "customer": { "codigoCliente": "007", "canal": "Mayorista" },
//!   "products": [ ... ],
//!   "offers":   [ ... raw offer records, legacy ones included ... ]
//! }
//! ```
//!
//! The report goes to stdout as pretty JSON; logs go to stderr
//! (`RUST_LOG=preventa=debug` shows why each offer was skipped).

use std::env;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use preventa_core::{Customer, Order, Product};
use preventa_promo::ingest::parse_date;
use preventa_promo::{
    find_applicable_offers, ingest_values, recompute, resolve, toggle, ApplicableOffer,
    EngineConfig, OfferContext, PricedCart, ProductCatalog, ToggleOutcome,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Fixture {
    order: Order,
    #[serde(default)]
    customer: Option<Customer>,
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    offers: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    today: NaiveDate,
    offers_loaded: usize,
    eligible: Vec<ApplicableOffer>,
    survivors: Vec<String>,
    toggles: Vec<ToggleOutcome>,
    cart: PricedCart,
}

struct Args {
    input: PathBuf,
    apply: Vec<String>,
    config: Option<PathBuf>,
    today: Option<NaiveDate>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let config = EngineConfig::load(args.config)?;
    let fixture: Fixture = serde_json::from_str(&std::fs::read_to_string(&args.input)?)?;

    let offers = ingest_values(&fixture.offers, &config.offers);
    let catalog = ProductCatalog::new(fixture.products);
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let ctx = OfferContext::new(fixture.customer.as_ref(), &catalog, &offers, today, &config);
    let order = fixture.order;

    info!(
        input = %args.input.display(),
        offers = offers.len(),
        products = catalog.len(),
        %today,
        "Evaluating fixture"
    );

    let eligible = find_applicable_offers(&order, &ctx);
    let survivors = resolve(eligible.clone())
        .iter()
        .map(|offer| offer.id().to_string())
        .collect();

    let mut applied: Vec<String> = Vec::new();
    let mut toggles = Vec::new();
    for offer_id in &args.apply {
        let result = toggle(&applied, offer_id, &order, &ctx);
        applied = result.applied;
        toggles.push(result.outcome);
    }
    let cart = recompute(&order.items, &applied, &order, &ctx);

    let report = Report {
        today,
        offers_loaded: offers.len(),
        eligible,
        survivors,
        toggles,
        cart,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Logs to stderr so stdout stays valid JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,preventa=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args() -> Result<Option<Args>, String> {
    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut apply = Vec::new();
    let mut config = None;
    let mut today = None;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--input" | "-i" => {
                input = value.map(PathBuf::from);
                i += 1;
            }
            "--apply" | "-a" => {
                apply = value
                    .map(|ids| {
                        ids.split(',')
                            .map(str::trim)
                            .filter(|id| !id.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                i += 1;
            }
            "--config" | "-c" => {
                config = value.map(PathBuf::from);
                i += 1;
            }
            "--today" | "-t" => {
                let raw = value.ok_or("--today needs a date")?;
                today = Some(parse_date(raw).ok_or_else(|| format!("Invalid date: {}", raw))?);
                i += 1;
            }
            "--help" | "-h" => {
                println!("Preventa Offer Evaluator");
                println!();
                println!("Usage: evaluate --input <FIXTURE> [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -i, --input <PATH>     JSON fixture with order, customer, products, offers");
                println!("  -a, --apply <IDS>      Comma-separated offer ids to toggle on, in order");
                println!("  -c, --config <PATH>    Engine config file (default: platform config dir)");
                println!("  -t, --today <DATE>     Evaluation date, yyyy-mm-dd (default: today)");
                println!("  -h, --help             Show this help message");
                return Ok(None);
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    let input = input.ok_or("--input is required")?;
    Ok(Some(Args {
        input,
        apply,
        config,
        today,
    }))
}
