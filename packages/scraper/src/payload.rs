//! Decoder for the leaderboard's `__data.json` payloads.
//!
//! The endpoint serves a SvelteKit data document. Somewhere inside it sits
//! a node shaped like `{"type": "data", "data": [...]}` whose array is a
//! flattened object graph: row objects map field names to *indices* into
//! the same array, and the referenced slots hold the actual values.
//!
//! ```text
//! [ ..., {"rank": 12, "name": 13, "peakRating": 14, "seasonRating": 15}, 1, "Boomie", 2410, 2288, ... ]
//! ```
//!
//! Entries with dangling indices or non-integer ratings are skipped; the
//! rest of the page is kept. A page where every row object is malformed is
//! a [`FetchFailure::Parse`], not an empty page.

use bh_ladder_models::{LeaderboardEntry, Region};
use serde_json::Value;

use crate::{FetchFailure, FetchResult};

/// Field holding the leaderboard position.
const RANK_KEY: &str = "rank";
/// Field holding the peak rating.
const PEAK_KEY: &str = "peakRating";
/// Field holding the season rating.
const SEASON_KEY: &str = "seasonRating";
/// Unique player identifier.
const ID_KEY: &str = "brawlhallaId";
/// Display name, used when a row carries no id.
const NAME_KEY: &str = "name";

/// Finds the first `{"type": "data", "data": [...]}` node, depth first.
///
/// Nodes whose `data` array is empty are skipped so that a leading empty
/// placeholder does not hide the real table.
#[must_use]
pub fn find_data_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("data")
                && let Some(Value::Array(data)) = map.get("data")
                && !data.is_empty()
            {
                return Some(data);
            }
            map.values().find_map(find_data_array)
        }
        Value::Array(items) => items.iter().find_map(find_data_array),
        _ => None,
    }
}

/// Decodes every leaderboard row in `body`, tagging each with `region`.
///
/// Returns an empty vector when the document has no data node or the node
/// contains no rows.
///
/// # Errors
///
/// Returns [`FetchFailure::Parse`] if the node holds row objects but none
/// of them decode.
pub fn parse_entries(body: &Value, region: Region) -> FetchResult {
    let Some(data) = find_data_array(body) else {
        log::debug!("{region}: payload has no data node");
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for (index, item) in data.iter().enumerate() {
        let Value::Object(row) = item else {
            continue;
        };
        if !(row.contains_key(RANK_KEY) && row.contains_key(PEAK_KEY) && row.contains_key(SEASON_KEY))
        {
            continue;
        }

        match decode_row(data, row, region) {
            Some(entry) => entries.push(entry),
            None => {
                skipped += 1;
                log::debug!("{region}: skipping malformed row object at index {index}");
            }
        }
    }

    if entries.is_empty() && skipped > 0 {
        return Err(FetchFailure::Parse(format!(
            "none of {skipped} row objects could be decoded"
        )));
    }

    if skipped > 0 {
        log::debug!(
            "{region}: decoded {} entries, skipped {skipped} malformed",
            entries.len()
        );
    }

    Ok(entries)
}

/// Resolves one row object against the flat data array.
fn decode_row(
    data: &[Value],
    row: &serde_json::Map<String, Value>,
    region: Region,
) -> Option<LeaderboardEntry> {
    let rank = u32::try_from(deref(data, row, RANK_KEY)?.as_u64()?).ok()?;
    let peak_rating = deref(data, row, PEAK_KEY)?.as_i64()?;
    let season_rating = deref(data, row, SEASON_KEY)?.as_i64()?;
    let player = player_id(data, row)?;

    Some(LeaderboardEntry {
        rank,
        player,
        region,
        peak_rating,
        season_rating,
    })
}

/// Follows the index stored under `key` into `data`.
fn deref<'a>(
    data: &'a [Value],
    row: &serde_json::Map<String, Value>,
    key: &str,
) -> Option<&'a Value> {
    let index = usize::try_from(row.get(key)?.as_u64()?).ok()?;
    data.get(index)
}

/// `brawlhallaId` rendered as text, or the display name when the row has
/// no usable id. Names are not unique, so the id wins whenever present.
fn player_id(data: &[Value], row: &serde_json::Map<String, Value>) -> Option<String> {
    match deref(data, row, ID_KEY) {
        Some(Value::Number(n)) => return Some(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        _ => {}
    }

    deref(data, row, NAME_KEY)
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_body(rows: &Value) -> Value {
        json!({
            "type": "data",
            "nodes": [
                {"type": "skip"},
                {"type": "data", "data": rows, "uses": {}}
            ]
        })
    }

    #[test]
    fn decodes_indexed_rows() {
        let body = page_body(&json!([
            {"players": 1},
            [2, 8],
            {"rank": 3, "name": 4, "peakRating": 5, "seasonRating": 6, "region": 7},
            1, "Boomie", 2410, 2288, "SEA",
            {"rank": 9, "name": 10, "peakRating": 11, "seasonRating": 12},
            2, "Sandstorm", 2395, 2301
        ]));

        let entries = parse_entries(&body, Region::Sea).unwrap();

        assert_eq!(
            entries,
            vec![
                LeaderboardEntry {
                    rank: 1,
                    player: "Boomie".to_string(),
                    region: Region::Sea,
                    peak_rating: 2410,
                    season_rating: 2288,
                },
                LeaderboardEntry {
                    rank: 2,
                    player: "Sandstorm".to_string(),
                    region: Region::Sea,
                    peak_rating: 2395,
                    season_rating: 2301,
                },
            ]
        );
    }

    #[test]
    fn shared_slots_resolve_for_every_row() {
        // Equal ratings may be deduplicated into one slot.
        let body = page_body(&json!([
            {"rank": 2, "name": 3, "peakRating": 4, "seasonRating": 4},
            {"rank": 5, "name": 6, "peakRating": 4, "seasonRating": 4},
            1, "Alpha", 2000, 2, "Beta"
        ]));

        let entries = parse_entries(&body, Region::Eu).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.peak_rating == 2000));
        assert_eq!(entries[1].player, "Beta");
    }

    #[test]
    fn skips_only_the_malformed_rows() {
        let body = page_body(&json!([
            {"rank": 3, "name": 4, "peakRating": 5, "seasonRating": 6},
            {"rank": 7, "name": 8, "peakRating": 99, "seasonRating": 9},
            {"rank": 7, "name": 8, "peakRating": 10, "seasonRating": 9},
            1, "Good", 1800, 1700,
            2, "Dangling", 1650,
            "not a number"
        ]));

        let entries = parse_entries(&body, Region::UsE).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].player, "Good");
    }

    #[test]
    fn numeric_player_id_is_rendered_as_text() {
        let body = page_body(&json!([
            {"rank": 1, "brawlhallaId": 2, "peakRating": 3, "seasonRating": 4},
            5, 123_456, 1500, 1400
        ]));

        let entries = parse_entries(&body, Region::Brz).unwrap();

        assert_eq!(entries[0].player, "123456");
        assert_eq!(entries[0].rank, 5);
    }

    #[test]
    fn players_sharing_a_name_keep_their_own_ids() {
        let body = page_body(&json!([
            {"rank": 2, "name": 3, "brawlhallaId": 4, "peakRating": 5, "seasonRating": 6},
            {"rank": 7, "name": 3, "brawlhallaId": 8, "peakRating": 9, "seasonRating": 10},
            1, "Alex", 111, 2100, 2000,
            2, 222, 2050, 1990
        ]));

        let entries = parse_entries(&body, Region::Eu).unwrap();

        let players: Vec<&str> = entries.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(players, vec!["111", "222"]);
    }

    #[test]
    fn page_with_only_malformed_rows_is_a_parse_failure() {
        let body = page_body(&json!([
            {"rank": 1, "name": 2, "peakRating": 3, "seasonRating": 3},
            "first", "Alex", "n/a"
        ]));

        let result = parse_entries(&body, Region::Sea);

        assert!(matches!(result, Err(FetchFailure::Parse(_))));
    }

    #[test]
    fn missing_data_node_is_an_empty_page() {
        let body = json!({"type": "redirect", "location": "/rankings"});
        assert_eq!(parse_entries(&body, Region::Sea), Ok(Vec::new()));

        let body = page_body(&json!([]));
        assert_eq!(parse_entries(&body, Region::Sea), Ok(Vec::new()));

        let body = page_body(&json!([{"players": 1}, 0]));
        assert_eq!(parse_entries(&body, Region::Sea), Ok(Vec::new()));
    }
}
