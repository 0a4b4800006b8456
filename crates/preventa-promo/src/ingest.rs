//! # Offer Ingestion
//!
//! Turns offer records from the catalog cache into canonical [`OfferDef`]s.
//!
//! ## Record Generations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Offer Record Shapes                                  │
//! │                                                                         │
//! │  CANONICAL                          LEGACY                              │
//! │  ─────────                          ──────                              │
//! │  { id, type, status,                { id, type, status,                 │
//! │    dates, scope,                      products: [],   ← often empty     │
//! │    discount | bonus, ... }            raw: "{\"scope\":{...},           │
//! │                                             \"discount\":{...}}" }      │
//! │                                                                         │
//! │  OfferShape::classify() tells them apart once; normalize() merges the  │
//! │  legacy payload as a fallback for whatever the top level left empty.   │
//! │  A `raw` blob that does not parse is ignored.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tolerance
//! Numeric fields accept numbers or numeric strings (`"12"`, `"7,5"`), code
//! lists accept arrays or comma-separated strings. Anything that still can
//! not be read rejects that one offer with an [`IngestError`];
//! [`ingest_offers`] logs the rejection and moves on.

use chrono::NaiveDate;
use preventa_core::validation::{validate_rate_bps, validate_tier_bounds};
use preventa_core::{DiscountRate, Money, MAX_LINE_QUANTITY, MAX_ORDER_LINES};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::OfferSettings;
use crate::error::IngestError;
use crate::normalize::fold;
use crate::offer::{
    BonusConfig, BonusMode, BonusTarget, BonusTargetKind, DiscountConfig, DiscountTier, OfferDef,
    OfferScope, OfferStatus, OfferTerms,
};

// =============================================================================
// Wire Records
// =============================================================================

/// An offer as stored in the catalog cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfferRecord {
    pub id: Option<Value>,
    #[serde(alias = "nombre", alias = "titulo")]
    pub name: Option<String>,
    #[serde(rename = "type", alias = "tipo")]
    pub kind: Option<String>,
    #[serde(alias = "estado")]
    pub status: Option<String>,
    pub dates: Option<RecordDates>,
    pub scope: Option<RecordScope>,
    pub products: Option<Value>,
    pub familias: Option<Value>,
    pub subfamilias: Option<Value>,
    pub proveedores: Option<Value>,
    pub stackable_with_same_product: Option<Value>,
    pub discount: Option<RecordDiscount>,
    pub bonus: Option<RecordBonus>,
    pub priority: Option<Value>,
    #[serde(alias = "codigoEmpresa", alias = "empresa")]
    pub company: Option<Value>,
    /// Legacy nested payload: a JSON object or a JSON-encoded string.
    pub raw: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordDates {
    #[serde(alias = "desde", alias = "fechaInicio")]
    pub valid_from: Option<Value>,
    #[serde(alias = "hasta", alias = "fechaFin")]
    pub valid_to: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordScope {
    pub canales: Option<Value>,
    pub sub_canales: Option<Value>,
    pub codigos_cliente: Option<Value>,
    pub departamentos: Option<Value>,
    pub regiones: Option<Value>,
    pub vendedores: Option<Value>,
    pub codigos_producto: Option<Value>,
    pub codigos_proveedor: Option<Value>,
    pub codigos_familia: Option<Value>,
    #[serde(alias = "codigosSubFamilia")]
    pub codigos_subfamilia: Option<Value>,
    pub codigos_linea: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordDiscount {
    #[serde(alias = "porcentaje")]
    pub percent: Option<Value>,
    #[serde(alias = "monto")]
    pub amount: Option<Value>,
    #[serde(alias = "escalas")]
    pub tiers: Option<Vec<RecordTier>>,
    #[serde(alias = "porLinea")]
    pub per_line: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordTier {
    #[serde(alias = "desde", alias = "min")]
    pub from: Option<Value>,
    #[serde(alias = "hasta", alias = "max")]
    pub to: Option<Value>,
    #[serde(alias = "porcentaje")]
    pub percent: Option<Value>,
    #[serde(alias = "monto")]
    pub amount: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordBonus {
    pub every_n: Option<Value>,
    pub buy_qty: Option<Value>,
    pub gives_m: Option<Value>,
    pub bonus_qty: Option<Value>,
    #[serde(alias = "modo")]
    pub mode: Option<String>,
    #[serde(alias = "maxAplicaciones")]
    pub max_applications: Option<Value>,
    pub target: Option<RecordBonusTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordBonusTarget {
    #[serde(rename = "type", alias = "tipo")]
    pub kind: Option<String>,
    #[serde(alias = "productoId")]
    pub product_id: Option<Value>,
    pub linea_id: Option<Value>,
    pub linea_ids: Option<Value>,
    pub familia_id: Option<Value>,
    pub familia_ids: Option<Value>,
    pub requiere_seleccion_usuario: Option<Value>,
}

// =============================================================================
// Shape Classification
// =============================================================================

/// A wire record, classified by storage generation.
#[derive(Debug, Clone, PartialEq)]
pub enum OfferShape {
    Canonical(OfferRecord),
    Legacy {
        record: OfferRecord,
        payload: Box<OfferRecord>,
    },
}

impl OfferShape {
    /// Classifies a record. A `raw` payload that does not parse as an offer
    /// record is dropped and the record is treated as canonical.
    pub fn classify(record: OfferRecord) -> OfferShape {
        let payload = match &record.raw {
            None | Some(Value::Null) => return OfferShape::Canonical(record),
            Some(Value::String(text)) if text.trim().is_empty() => {
                return OfferShape::Canonical(record)
            }
            Some(Value::String(text)) => serde_json::from_str::<OfferRecord>(text),
            Some(other) => serde_json::from_value::<OfferRecord>(other.clone()),
        };

        match payload {
            Ok(payload) => OfferShape::Legacy {
                record,
                payload: Box::new(payload),
            },
            Err(e) => {
                warn!(offer_id = ?record.id, error = %e, "Ignoring malformed legacy offer payload");
                OfferShape::Canonical(record)
            }
        }
    }

    /// Collapses the shape into one record, legacy values filling the gaps.
    pub fn into_record(self) -> OfferRecord {
        match self {
            OfferShape::Canonical(record) => record,
            OfferShape::Legacy { record, payload } => merge_fallback(record, *payload),
        }
    }
}

fn merge_fallback(top: OfferRecord, legacy: OfferRecord) -> OfferRecord {
    OfferRecord {
        id: non_null(top.id).or(legacy.id),
        name: top.name.or(legacy.name),
        kind: top.kind.or(legacy.kind),
        status: top.status.or(legacy.status),
        dates: top.dates.or(legacy.dates),
        scope: match top.scope {
            Some(scope) if !scope_is_empty(&scope) => Some(scope),
            _ => legacy.scope,
        },
        products: non_empty_list(top.products).or(legacy.products),
        familias: non_empty_list(top.familias).or(legacy.familias),
        subfamilias: non_empty_list(top.subfamilias).or(legacy.subfamilias),
        proveedores: non_empty_list(top.proveedores).or(legacy.proveedores),
        stackable_with_same_product: non_null(top.stackable_with_same_product)
            .or(legacy.stackable_with_same_product),
        discount: top.discount.or(legacy.discount),
        bonus: top.bonus.or(legacy.bonus),
        priority: non_null(top.priority).or(legacy.priority),
        company: non_null(top.company).or(legacy.company),
        raw: None,
    }
}

fn non_null(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn non_empty_list(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !codes(Some(v)).is_empty())
}

fn scope_is_empty(scope: &RecordScope) -> bool {
    [
        &scope.canales,
        &scope.sub_canales,
        &scope.codigos_cliente,
        &scope.departamentos,
        &scope.regiones,
        &scope.vendedores,
        &scope.codigos_producto,
        &scope.codigos_proveedor,
        &scope.codigos_familia,
        &scope.codigos_subfamilia,
        &scope.codigos_linea,
    ]
    .iter()
    .all(|list| codes(list.as_ref()).is_empty())
}

// =============================================================================
// Normalization
// =============================================================================

/// Resolves `stackableWithSameProduct`.
///
/// Absent or unreadable values take `default` (records created before the
/// flag existed were combinable).
///
/// ```rust
/// use preventa_promo::ingest::resolve_stackable;
/// use serde_json::json;
///
/// assert!(resolve_stackable(None, true));
/// assert!(!resolve_stackable(Some(&json!("false")), true));
/// assert!(!resolve_stackable(Some(&json!(0)), true));
/// assert!(resolve_stackable(Some(&json!(true)), false));
/// ```
pub fn resolve_stackable(raw: Option<&Value>, default: bool) -> bool {
    raw.and_then(flag).unwrap_or(default)
}

/// Normalizes one classified record into an [`OfferDef`].
pub fn normalize(shape: OfferShape, settings: &OfferSettings) -> Result<OfferDef, IngestError> {
    let record = shape.into_record();

    let id = record
        .id
        .as_ref()
        .and_then(scalar_code)
        .ok_or(IngestError::MissingId)?;

    let terms = parse_terms(&id, &record)?;

    let (valid_from, valid_to) = match &record.dates {
        Some(dates) => (
            date_field(&id, "dates.validFrom", dates.valid_from.as_ref())?,
            date_field(&id, "dates.validTo", dates.valid_to.as_ref())?,
        ),
        None => (None, None),
    };

    let priority = match number(&id, "priority", record.priority.as_ref()) {
        Ok(Some(p)) => p.round() as i32,
        Ok(None) => settings.default_priority,
        Err(e) => {
            warn!(offer_id = %id, error = %e, "Unreadable priority, using default");
            settings.default_priority
        }
    };

    Ok(OfferDef {
        name: record.name.clone().unwrap_or_default(),
        status: OfferStatus::parse(record.status.as_deref().unwrap_or_default()),
        valid_from,
        valid_to,
        company: record.company.as_ref().and_then(scalar_code),
        scope: build_scope(&record),
        stackable_with_same_product: resolve_stackable(
            record.stackable_with_same_product.as_ref(),
            settings.stackable_default,
        ),
        priority,
        terms,
        id,
    })
}

/// Normalizes a batch of records, dropping (and logging) the ones that can
/// not be read.
pub fn ingest_offers<I>(records: I, settings: &OfferSettings) -> Vec<OfferDef>
where
    I: IntoIterator<Item = OfferRecord>,
{
    records
        .into_iter()
        .filter_map(|record| match normalize(OfferShape::classify(record), settings) {
            Ok(offer) => Some(offer),
            Err(e) => {
                warn!(error = %e, "Offer record rejected");
                None
            }
        })
        .collect()
}

/// Like [`ingest_offers`], for untyped JSON. A value that is not even an
/// offer-shaped object is skipped without affecting the rest.
pub fn ingest_values(values: &[Value], settings: &OfferSettings) -> Vec<OfferDef> {
    let records = values.iter().filter_map(|value| {
        serde_json::from_value::<OfferRecord>(value.clone())
            .map_err(|e| warn!(error = %e, "Offer record is not readable"))
            .ok()
    });
    ingest_offers(records, settings)
}

fn parse_terms(id: &str, record: &OfferRecord) -> Result<OfferTerms, IngestError> {
    let kind = match record.kind.as_deref().map(fold) {
        Some(kind) if !kind.is_empty() => kind,
        // Very old records carry no type; infer it from the payload
        _ if record.discount.is_some() => "DISCOUNT".to_string(),
        _ if record.bonus.is_some() => "BONUS".to_string(),
        _ => {
            return Err(IngestError::UnknownType {
                offer_id: id.to_string(),
                value: String::new(),
            })
        }
    };

    match kind.as_str() {
        "DISCOUNT" | "DESCUENTO" => {
            let discount = record.discount.as_ref().ok_or_else(|| missing(id, "discount"))?;
            Ok(OfferTerms::Discount(parse_discount(id, discount)?))
        }
        "BONUS" | "BONIFICACION" => {
            let bonus = record.bonus.as_ref().ok_or_else(|| missing(id, "bonus"))?;
            Ok(OfferTerms::Bonus(parse_bonus(id, bonus)?))
        }
        "COMBO" => Ok(OfferTerms::Combo),
        "KIT" => Ok(OfferTerms::Kit),
        "PRICELIST" | "PRICE_LIST" | "LISTA_PRECIOS" => Ok(OfferTerms::PriceList),
        other => Err(IngestError::UnknownType {
            offer_id: id.to_string(),
            value: other.to_string(),
        }),
    }
}

fn missing(id: &str, kind: &str) -> IngestError {
    IngestError::MissingTerms {
        offer_id: id.to_string(),
        kind: kind.to_string(),
    }
}

fn parse_discount(id: &str, raw: &RecordDiscount) -> Result<DiscountConfig, IngestError> {
    let percent = rate(id, "discount.percent", raw.percent.as_ref())?;
    let amount = money(id, "discount.amount", raw.amount.as_ref())?;

    let mut tiers = Vec::new();
    for (index, tier) in raw.tiers.iter().flatten().enumerate() {
        let field = |name: &str| format!("discount.tiers[{}].{}", index, name);
        let from = quantity(id, &field("from"), tier.from.as_ref())?.unwrap_or(0);
        let to = quantity(id, &field("to"), tier.to.as_ref())?;
        validate_tier_bounds(from, to).map_err(|e| IngestError::invalid_tier(id, e))?;

        tiers.push(DiscountTier {
            from,
            to,
            percent: rate(id, &field("percent"), tier.percent.as_ref())?,
            amount: money(id, &field("amount"), tier.amount.as_ref())?,
        });
    }
    tiers.sort_by_key(|t| t.from);

    Ok(DiscountConfig {
        percent,
        amount,
        tiers,
        per_line: raw.per_line.as_ref().and_then(flag).unwrap_or(false),
    })
}

fn parse_bonus(id: &str, raw: &RecordBonus) -> Result<BonusConfig, IngestError> {
    let every_n = quantity(id, "bonus.everyN", non_null_ref(&raw.every_n, &raw.buy_qty))?;
    let gives_m = quantity(id, "bonus.givesM", non_null_ref(&raw.gives_m, &raw.bonus_qty))?;
    let max_applications = quantity(id, "bonus.maxApplications", raw.max_applications.as_ref())?
        // The authoring form stores 0 for "no limit"
        .filter(|cap| *cap > 0);

    let mode = match raw.mode.as_deref().map(fold).as_deref() {
        Some("POR_LINEA" | "POR LINEA" | "PORLINEA" | "PER_LINE" | "LINEA") => BonusMode::PorLinea,
        _ => BonusMode::Acumulado,
    };

    let target = match &raw.target {
        Some(t) => BonusTarget {
            kind: match t.kind.as_deref().map(fold).as_deref() {
                Some("SKU" | "PRODUCTO" | "PRODUCT") => BonusTargetKind::Sku,
                Some("LINEA" | "LINE") => BonusTargetKind::Linea,
                Some("FAMILIA" | "FAMILY") => BonusTargetKind::Familia,
                _ => BonusTargetKind::Same,
            },
            product_id: t.product_id.as_ref().and_then(scalar_code),
            line_ids: merged_codes(&[&t.linea_id, &t.linea_ids]),
            family_ids: merged_codes(&[&t.familia_id, &t.familia_ids]),
            requires_user_selection: t
                .requiere_seleccion_usuario
                .as_ref()
                .and_then(flag)
                .unwrap_or(false),
        },
        None => BonusTarget::default(),
    };

    Ok(BonusConfig {
        every_n: every_n.unwrap_or(0),
        gives_m: gives_m.unwrap_or(0),
        mode,
        max_applications,
        target,
    })
}

fn build_scope(record: &OfferRecord) -> OfferScope {
    let scope = record.scope.clone().unwrap_or_default();
    OfferScope {
        canales: codes(scope.canales.as_ref()),
        sub_canales: codes(scope.sub_canales.as_ref()),
        codigos_cliente: codes(scope.codigos_cliente.as_ref()),
        departamentos: codes(scope.departamentos.as_ref()),
        regiones: codes(scope.regiones.as_ref()),
        vendedores: codes(scope.vendedores.as_ref()),
        codigos_producto: merged_codes(&[&scope.codigos_producto, &record.products]),
        codigos_proveedor: merged_codes(&[&scope.codigos_proveedor, &record.proveedores]),
        codigos_familia: merged_codes(&[&scope.codigos_familia, &record.familias]),
        codigos_subfamilia: merged_codes(&[&scope.codigos_subfamilia, &record.subfamilias]),
        codigos_linea: codes(scope.codigos_linea.as_ref()),
    }
}

// =============================================================================
// Field Readers
// =============================================================================

fn non_null_ref<'a>(first: &'a Option<Value>, second: &'a Option<Value>) -> Option<&'a Value> {
    first
        .as_ref()
        .filter(|v| !v.is_null())
        .or_else(|| second.as_ref())
}

/// A code from a string or number.
fn scalar_code(value: &Value) -> Option<String> {
    let code = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!code.is_empty()).then_some(code)
}

/// A code list from an array, a comma-separated string, or a single number.
fn codes(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_code).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        Some(v @ Value::Number(_)) => scalar_code(v).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn merged_codes(lists: &[&Option<Value>]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for list in lists {
        for code in codes(list.as_ref()) {
            if !out.contains(&code) {
                out.push(code);
            }
        }
    }
    out
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match fold(s).as_str() {
            "TRUE" | "1" | "SI" | "YES" | "Y" | "S" => Some(true),
            "FALSE" | "0" | "NO" | "N" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn number(id: &str, field: &str, value: Option<&Value>) -> Result<Option<f64>, IngestError> {
    let invalid = |shown: String| IngestError::InvalidNumber {
        offer_id: id.to_string(),
        field: field.to_string(),
        value: shown,
    };

    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().replace(',', ".").parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(invalid(value.map(Value::to_string).unwrap_or_default())),
    }
}

/// Largest fixed amount per unit that still fits when multiplied by a full
/// line.
const MAX_UNIT_CENTS: i64 = i64::MAX / MAX_LINE_QUANTITY;

/// Largest offer quantity (tier bound, N, M, cap) that still fits when
/// multiplied by the quantity of a full order.
const MAX_OFFER_QUANTITY: i64 = i64::MAX / (MAX_LINE_QUANTITY * MAX_ORDER_LINES as i64);

fn quantity(id: &str, field: &str, value: Option<&Value>) -> Result<Option<i64>, IngestError> {
    match number(id, field, value)? {
        None => Ok(None),
        Some(n) if n.fract() == 0.0 && n.abs() <= MAX_OFFER_QUANTITY as f64 => Ok(Some(n as i64)),
        Some(n) => Err(IngestError::InvalidNumber {
            offer_id: id.to_string(),
            field: field.to_string(),
            value: n.to_string(),
        }),
    }
}

fn rate(id: &str, field: &str, value: Option<&Value>) -> Result<DiscountRate, IngestError> {
    let percent = number(id, field, value)?.unwrap_or(0.0);
    if percent < 0.0 {
        return Err(IngestError::InvalidNumber {
            offer_id: id.to_string(),
            field: field.to_string(),
            value: percent.to_string(),
        });
    }
    let rate = DiscountRate::from_percentage(percent);
    validate_rate_bps(field, rate.bps()).map_err(|e| IngestError::invalid_tier(id, e))?;
    Ok(rate)
}

fn money(id: &str, field: &str, value: Option<&Value>) -> Result<Money, IngestError> {
    let amount = number(id, field, value)?.unwrap_or(0.0);
    match Money::from_decimal(amount) {
        Some(m) if !m.is_negative() && m.cents() <= MAX_UNIT_CENTS => Ok(m),
        _ => Err(IngestError::InvalidNumber {
            offer_id: id.to_string(),
            field: field.to_string(),
            value: amount.to_string(),
        }),
    }
}

fn date_field(id: &str, field: &str, value: Option<&Value>) -> Result<Option<NaiveDate>, IngestError> {
    let invalid = |shown: String| IngestError::InvalidDate {
        offer_id: id.to_string(),
        field: field.to_string(),
        value: shown,
    };

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => match parse_date(s) {
            Some(date) => {
                debug!(offer_id = %id, field, %date, "Parsed offer date");
                Ok(Some(date))
            }
            None => Err(invalid(s.clone())),
        },
        Some(other) => Err(invalid(other.to_string())),
    }
}

/// Parses `yyyy-mm-dd`, `dd/mm/yyyy`, or the date part of an ISO date-time.
///
/// Only the calendar date is read; no time zone conversion happens, so an
/// offer ending "2026-10-19" ends on the 19th wherever the device is.
///
/// ```rust
/// use chrono::NaiveDate;
/// use preventa_promo::ingest::parse_date;
///
/// let expected = NaiveDate::from_ymd_opt(2026, 10, 19);
/// assert_eq!(parse_date("2026-10-19"), expected);
/// assert_eq!(parse_date("19/10/2026"), expected);
/// assert_eq!(parse_date("2026-10-19T23:30:00.000Z"), expected);
/// assert_eq!(parse_date("19-10-2026"), None);
/// ```
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d/%m/%Y") {
        return Some(date);
    }
    match value.get(..10) {
        Some(prefix) if value.len() > 10 && matches!(value.as_bytes()[10], b'T' | b' ') => {
            NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
