//! Delivery address normalization
//!
//! 下单前端来源不同，地址字段命名也不同 (`address` / `street`、`lat` / `latitude` ...)。
//! 这里把松散的 JSON 收敛为固定的 [`DeliveryAddress`]，只在编排入口执行一次。

use serde_json::{Map, Value};
use shared::models::DeliveryAddress;

const ADDRESS_LINE: &[&str] = &["address", "street", "address_line", "line1"];
const CITY: &[&str] = &["city", "town"];
const REGION: &[&str] = &["department", "state", "region", "province"];
const NEIGHBORHOOD: &[&str] = &["neighborhood", "district"];
const POSTAL_CODE: &[&str] = &["postal_code", "zip", "zip_code"];
const LATITUDE: &[&str] = &["lat", "latitude"];
const LONGITUDE: &[&str] = &["lng", "lon", "longitude"];
const INSTRUCTIONS: &[&str] = &["instructions", "notes", "reference"];

/// Map a loosely-typed address payload to [`DeliveryAddress`]
///
/// - first non-empty alias wins
/// - a bare string is taken as the address line
/// - coordinates may be numbers or numeric strings; out-of-range values are dropped
pub fn normalize(payload: &Value) -> DeliveryAddress {
    match payload {
        Value::Object(map) => from_map(map),
        Value::String(s) => DeliveryAddress {
            address_line: non_empty(s),
            ..Default::default()
        },
        _ => DeliveryAddress::default(),
    }
}

fn from_map(map: &Map<String, Value>) -> DeliveryAddress {
    DeliveryAddress {
        address_line: text(map, ADDRESS_LINE),
        city: text(map, CITY),
        region: text(map, REGION),
        neighborhood: text(map, NEIGHBORHOOD),
        postal_code: text(map, POSTAL_CODE),
        latitude: coordinate(map, LATITUDE, 90.0),
        longitude: coordinate(map, LONGITUDE, 180.0),
        instructions: text(map, INSTRUCTIONS),
    }
}

fn text(map: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn coordinate(map: &Map<String, Value>, aliases: &[&str], limit: f64) -> Option<f64> {
    aliases
        .iter()
        .find_map(|key| match map.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|v| v.is_finite() && v.abs() <= limit)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
