use serde_json::{Map, Value};

use super::error::RanklistError;
use super::types::Ranklist;

/// Copy the fields this tool may change back into `document`, the JSON
/// object the ranklist was read from.
///
/// Only status times and `sorter.config.timePrecision` / `timeRounding` are
/// written. Every other key keeps its value and its position, and keys that
/// already exist are updated in place.
pub fn write_back(ranklist: &Ranklist, document: &mut Map<String, Value>) -> Result<(), RanklistError> {
    for (index, row) in ranklist.rows.iter().enumerate() {
        for (column, status) in row.statuses.iter().enumerate() {
            let Some(time) = status.time else {
                continue;
            };
            let target = document
                .get_mut("rows")
                .and_then(|rows| rows.pointer_mut(&format!("/{}/statuses/{}", index, column)))
                .and_then(Value::as_object_mut)
                .ok_or_else(|| {
                    RanklistError::malformed(index, format!("status {} is missing from the document", column))
                })?;
            target.insert("time".to_string(), serde_json::to_value(time)?);
        }
    }

    if let Some(config) = ranklist.sorter_config() {
        let mut sorter = take_object(document, "sorter");
        let mut target = take_object(&mut sorter, "config");

        set_or_remove(
            &mut target,
            "timePrecision",
            config.time_precision.map(|unit| Value::from(unit.as_str())),
        );
        set_or_remove(
            &mut target,
            "timeRounding",
            config.time_rounding.map(|rounding| Value::from(rounding.as_str())),
        );

        sorter.insert("config".to_string(), Value::Object(target));
        document.insert("sorter".to_string(), Value::Object(sorter));
    }

    Ok(())
}

/// Move the object under `key` out of `map`, leaving `null` in its slot so a
/// later insert keeps the key's position. Anything that is not an object
/// yields an empty one.
fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.get_mut(key).map(Value::take) {
        Some(Value::Object(object)) => object,
        _ => Map::new(),
    }
}

fn set_or_remove(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            map.insert(key.to_string(), value);
        }
        None => {
            map.shift_remove(key);
        }
    }
}
