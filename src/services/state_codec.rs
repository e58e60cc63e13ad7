//! Serialization of the whole editable state to and from a URL-safe string.
//!
//! The string is the only persistence layer, so decoding is lenient: a
//! fragment that cannot be read yields `None`, and individual items that do
//! not satisfy the item invariants are dropped while the rest survive.
//!
//! Current format (`2.`): `"2." + base64url(json)` where `json` is
//! `{"i":[[id,name,amount(,vat)],...],"e":[[id,name,amount],...]}`. The gross
//! amount of VAT-inclusive incomes is derived on decode rather than stored.
//!
//! Legacy format: base64 of `{"incomes":[{"id","name","amount",
//! "vatIncluded"?,"vatAmount"?,"grossAmount"?}],"expenses":[...]}`, sometimes
//! percent-encoded before the base64 step. Bare JSON is accepted as well.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

use crate::models::{CashflowItem, CashflowState, ItemId, Vat, MAX_AMOUNT};

const VERSION_PREFIX: &str = "2.";

/// Keys a fragment may be wrapped in when read straight from an address.
const KEY_PREFIXES: [&str; 2] = ["s=", "data="];

/// Encode `state` as a URL-safe string (`[A-Za-z0-9._-]`).
///
/// Deterministic: the same state always yields the same string.
pub fn encode(state: &CashflowState) -> String {
    let payload = json!({
        "i": state.incomes().iter().map(positional).collect::<Vec<_>>(),
        "e": state.expenses().iter().map(positional).collect::<Vec<_>>(),
    });
    format!(
        "{}{}",
        VERSION_PREFIX,
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// Decode a fragment produced by [`encode`] or by the legacy encoding.
///
/// Returns `None` for an empty or unreadable fragment; never panics.
pub fn decode(fragment: &str) -> Option<CashflowState> {
    let fragment = strip_wrapping(fragment);
    if fragment.is_empty() {
        return None;
    }

    let fragment = match urlencoding::decode(fragment) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::debug!("State fragment is not valid percent-encoding: {}", e);
            return None;
        }
    };
    let fragment = fragment.trim();

    let state = match fragment.strip_prefix(VERSION_PREFIX) {
        Some(body) => decode_current(body),
        None => decode_legacy(fragment),
    };

    if state.is_none() {
        tracing::debug!(len = fragment.len(), "Discarding unreadable state fragment");
    }
    state
}

/// Reduce an address, query or fragment to the bare encoded state.
///
/// In query form (`s=...&x=1`, `x=1&s=...`) only the value of the state key
/// is kept. Bare JSON is left whole since names may contain `&`.
fn strip_wrapping(fragment: &str) -> &str {
    let mut fragment = fragment.trim();
    fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    fragment = fragment.strip_prefix('?').unwrap_or(fragment);
    if fragment.starts_with('{') {
        return fragment;
    }

    let value = fragment.split('&').find_map(|pair| {
        KEY_PREFIXES
            .iter()
            .find_map(|key| pair.strip_prefix(*key))
    });
    match value {
        Some(value) => value,
        None if fragment.contains('&') => "",
        None => fragment,
    }
}

/// VAT is written whenever present; [`CashflowState`] keeps it off expenses.
fn positional(item: &CashflowItem) -> Value {
    let mut fields = vec![
        Value::from(item.id.as_str()),
        Value::from(item.name.as_str()),
        Value::from(item.amount),
    ];
    if let Some(vat) = item.vat {
        fields.push(Value::from(vat.amount()));
    }
    Value::Array(fields)
}

fn decode_current(body: &str) -> Option<CashflowState> {
    let bytes = URL_SAFE_NO_PAD.decode(body).ok()?;
    let payload: Value = serde_json::from_slice(&bytes).ok()?;
    let object = payload.as_object()?;

    let incomes = list(object, "i")?;
    let expenses = list(object, "e")?;

    Some(CashflowState::new(
        collect_valid(incomes, |v| positional_item(v, true)),
        collect_valid(expenses, |v| positional_item(v, false)),
    ))
}

fn decode_legacy(fragment: &str) -> Option<CashflowState> {
    let payload = legacy_json(fragment)?;
    let object = payload.as_object()?;

    let incomes = list(object, "incomes")?;
    let expenses = list(object, "expenses")?;

    Some(CashflowState::new(
        collect_valid(incomes, |v| named_item(v, true)),
        collect_valid(expenses, |v| named_item(v, false)),
    ))
}

/// Absent lists read as empty; a present non-array is a malformed state.
fn list<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    match object.get(key) {
        None | Some(Value::Null) => Some(&[][..]),
        Some(Value::Array(values)) => Some(values.as_slice()),
        Some(_) => None,
    }
}

fn legacy_json(fragment: &str) -> Option<Value> {
    if fragment.starts_with('{') {
        return serde_json::from_str(fragment).ok();
    }

    // Query-string parsing may have turned '+' into ' '.
    let fragment = fragment.replace(' ', "+");
    let bytes = [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(&fragment).ok())?;
    let text = String::from_utf8(bytes).ok()?;

    if text.starts_with('{') {
        serde_json::from_str(&text).ok()
    } else {
        let inner = urlencoding::decode(&text).ok()?;
        serde_json::from_str(&inner).ok()
    }
}

fn collect_valid<F>(values: &[Value], parse: F) -> Vec<CashflowItem>
where
    F: Fn(&Value) -> Option<CashflowItem>,
{
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(values.len());
    for value in values {
        match parse(value) {
            Some(item) if seen.insert(item.id.clone()) => items.push(item),
            Some(item) => tracing::debug!(id = %item.id, "Dropping item with duplicate id"),
            None => tracing::debug!("Dropping invalid item from state fragment"),
        }
    }
    items
}

fn positional_item(value: &Value, allow_vat: bool) -> Option<CashflowItem> {
    let fields = value.as_array()?;
    if !(3..=4).contains(&fields.len()) {
        return None;
    }

    let id = ItemId::parse(fields[0].as_str()?)?;
    let name = non_empty(&fields[1])?;
    let amount = whole_amount(&fields[2])?;

    let vat = match fields.get(3) {
        Some(vat_amount) if allow_vat => Some(Vat::for_net(amount, whole_amount(vat_amount)?)?),
        _ => None,
    };

    Some(CashflowItem {
        id,
        name,
        amount,
        vat,
    })
}

fn named_item(value: &Value, allow_vat: bool) -> Option<CashflowItem> {
    let object = value.as_object()?;

    let id = ItemId::parse(object.get("id")?.as_str()?)?;
    let name = non_empty(object.get("name")?)?;
    let amount = whole_amount(object.get("amount")?)?;

    let vat_included = object
        .get("vatIncluded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let vat = if allow_vat && vat_included {
        legacy_vat(object, amount)?
    } else {
        None
    };

    Some(CashflowItem {
        id,
        name,
        amount,
        vat,
    })
}

/// Outer `None` drops the item; inner `None` keeps it without VAT.
fn legacy_vat(object: &Map<String, Value>, net: i64) -> Option<Option<Vat>> {
    let field = |key: &str| match object.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(v) => whole_amount(v).map(Some),
    };

    let vat = match (field("vatAmount")?, field("grossAmount")?) {
        (None, None) => None,
        (Some(amount), None) => Some(Vat::for_net(net, amount)?),
        (None, Some(gross)) => Some(Vat::for_net(net, gross.checked_sub(net)?)?),
        (Some(amount), Some(gross)) => {
            let vat = Vat::for_net(net, amount)?;
            if vat.gross() != gross {
                return None;
            }
            Some(vat)
        }
    };
    Some(vat)
}

fn non_empty(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// An integer in `0..=MAX_AMOUNT`; integral floats such as `500.0` are accepted.
fn whole_amount(value: &Value) -> Option<i64> {
    let amount = match value.as_i64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if f.fract() != 0.0 || !(0.0..=MAX_AMOUNT as f64).contains(&f) {
                return None;
            }
            f as i64
        }
    };
    (0..=MAX_AMOUNT).contains(&amount).then_some(amount)
}
