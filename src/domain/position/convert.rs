//! Conversions from wire types to domain types for positions.

use super::wire::PositionEntry;
use super::Position;
use crate::shared::Direction;
use chrono::{DateTime, NaiveDateTime, Utc};

impl From<PositionEntry> for Position {
    fn from(entry: PositionEntry) -> Self {
        let PositionEntry { position, market } = entry;

        // Closing side of the quote: a long is closed at the bid, a short at the offer.
        let quote = match position.direction {
            Direction::Buy => market.bid,
            Direction::Sell => market.offer,
        };

        let created_at = position
            .created_date_utc
            .as_deref()
            .and_then(parse_broker_timestamp)
            .or_else(|| position.created_date.as_deref().and_then(parse_broker_timestamp));

        Self {
            deal_id: position.deal_id,
            epic: market.epic,
            instrument_name: market.instrument_name,
            direction: position.direction,
            size: position.size,
            open_level: position.level,
            current_level: quote.unwrap_or(position.level),
            profit: position.upl.unwrap_or(0.0),
            stop_level: position.stop_level,
            profit_level: position.profit_level,
            created_at,
            currency: position.currency.unwrap_or_default(),
        }
    }
}

/// Broker timestamps come as RFC 3339 or as naive `2022-04-06T10:49:52.056` (UTC).
fn parse_broker_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::wire::{MarketData, PositionData, PositionsResponse};
    use chrono::{Datelike, Timelike};

    fn sample_entry(direction: Direction) -> PositionEntry {
        PositionEntry {
            position: PositionData {
                deal_id: "006011e7-0001-54c4-0000-000080560043".to_string(),
                deal_reference: Some("p_00601".to_string()),
                direction,
                size: 2.0,
                level: 1.0850,
                currency: Some("USD".to_string()),
                upl: Some(-12.5),
                stop_level: Some(1.07),
                profit_level: None,
                guaranteed_stop: Some(false),
                created_date: Some("2022-04-06T13:49:52.056".to_string()),
                created_date_utc: Some("2022-04-06T10:49:52.056".to_string()),
            },
            market: MarketData {
                epic: "EURUSD".to_string(),
                instrument_name: Some("EUR/USD".to_string()),
                bid: Some(1.0840),
                offer: Some(1.0842),
            },
        }
    }

    #[test]
    fn test_buy_position_uses_bid() {
        let position: Position = sample_entry(Direction::Buy).into();
        assert_eq!(position.deal_id, "006011e7-0001-54c4-0000-000080560043");
        assert_eq!(position.epic, "EURUSD");
        assert_eq!(position.open_level, 1.0850);
        assert_eq!(position.current_level, 1.0840);
        assert_eq!(position.profit, -12.5);
        assert_eq!(position.currency, "USD");
        assert_eq!(position.stop_level, Some(1.07));
        assert_eq!(position.profit_level, None);
    }

    #[test]
    fn test_sell_position_uses_offer() {
        let position: Position = sample_entry(Direction::Sell).into();
        assert_eq!(position.current_level, 1.0842);
    }

    #[test]
    fn test_missing_quote_falls_back_to_open_level() {
        let mut entry = sample_entry(Direction::Buy);
        entry.market.bid = None;
        entry.position.upl = None;
        let position: Position = entry.into();
        assert_eq!(position.current_level, 1.0850);
        assert_eq!(position.profit, 0.0);
    }

    #[test]
    fn test_created_at_prefers_utc_field() {
        let position: Position = sample_entry(Direction::Buy).into();
        let created = position.created_at.unwrap();
        assert_eq!(created.year(), 2022);
        assert_eq!(created.hour(), 10);
    }

    #[test]
    fn test_parse_rfc3339_timestamp() {
        let ts = parse_broker_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(ts.minute(), 30);
        assert!(parse_broker_timestamp("not a date").is_none());
    }

    #[test]
    fn test_positions_response_deserialize() {
        let json = r#"{
            "positions": [{
                "position": {
                    "contractSize": 1,
                    "createdDate": "2022-04-06T13:49:52.056",
                    "createdDateUTC": "2022-04-06T10:49:52.056",
                    "dealId": "006011e7-0001-54c4-0000-000080560043",
                    "dealReference": "p_006011e7-0001-54c4-0000-000080560043",
                    "size": 1,
                    "leverage": 30,
                    "upl": -0.022,
                    "direction": "BUY",
                    "level": 21.059,
                    "currency": "USD",
                    "guaranteedStop": false
                },
                "market": {
                    "instrumentName": "Silver",
                    "expiry": "-",
                    "marketStatus": "TRADEABLE",
                    "epic": "SILVER",
                    "bid": 21.037,
                    "offer": 21.057
                }
            }]
        }"#;
        let resp: PositionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.positions.len(), 1);
        let position: Position = resp.positions[0].clone().into();
        assert_eq!(position.epic, "SILVER");
        assert_eq!(position.instrument_name.as_deref(), Some("Silver"));
        assert_eq!(position.size, 1.0);
        assert_eq!(position.current_level, 21.037);
    }

    #[test]
    fn test_empty_positions_response() {
        let resp: PositionsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.positions.is_empty());
    }
}
