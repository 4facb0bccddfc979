//! User-facing mutation channel (§4.6).
//!
//! The remote event's `content` field is an untyped document in the
//! source system; per §9 "Runtime-typed event payloads" we model the
//! recognized message kinds as a tagged union up front instead of
//! threading a `serde_json::Value` through the strategy loop. Unknown
//! kinds are logged at `warn` and discarded by [`StrategyEvent::parse`].

use gridloop_markets::CycleKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Carried by every event, identifying who/what triggered it (§4.6: "all
/// carry `user_name`, `sent_by_admin`, `user_id` where relevant").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    pub sent_by_admin: bool,
}

/// A single user-issued mutation targeting one bot's strategy loop
/// (§4.6). `close_cycle`/`close_order`/`close_pending_order`/
/// `update_order_configs` each target one id/ticket; `id = "all"` on
/// `close_cycle` closes every active cycle on the bot, equivalent to
/// `close_all_cycles`.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyEvent {
    OpenOrder {
        meta: EventMeta,
        side: CycleKind,
        /// `0` means "market"; otherwise a pending price (§4.6: "Price >
        /// current ask => buy stop; price < current ask => buy limit",
        /// mirrored for sell).
        price: Decimal,
    },
    CloseCycle {
        meta: EventMeta,
        id: String,
    },
    CloseAllCycles {
        meta: EventMeta,
    },
    CloseOrder {
        meta: EventMeta,
        ticket: i64,
    },
    ClosePendingOrder {
        meta: EventMeta,
        ticket: i64,
    },
    CloseAllPendingOrders {
        meta: EventMeta,
    },
    UpdateOrderConfigs {
        meta: EventMeta,
        ticket: i64,
        sl: Option<Decimal>,
        tp: Option<Decimal>,
        trailing_steps: Option<i32>,
    },
    StopBot {
        meta: EventMeta,
    },
    StartBot {
        meta: EventMeta,
    },
}

/// Wire shape of one remote event's `content` document (§6 "Remote
/// document store": `content` nested document with `event_type`, ...).
/// `message` is the recognized-kind discriminant; the rest of the fields
/// are kind-specific and simply absent when not applicable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventContent {
    pub message: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sent_by_admin: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub ticket: Option<i64>,
    #[serde(default)]
    pub sl: Option<Decimal>,
    #[serde(default)]
    pub tp: Option<Decimal>,
    #[serde(default)]
    pub trailing_steps: Option<i32>,
}

impl StrategyEvent {
    /// Converts one remote event's content document into a typed
    /// [`StrategyEvent`], or `None` for an unrecognized `message` kind
    /// (logged at `warn` by the caller; §9).
    pub fn parse(content: &EventContent) -> Option<Self> {
        let meta = EventMeta {
            user_name: content.user_name.clone(),
            user_id: content.user_id.clone(),
            sent_by_admin: content.sent_by_admin,
        };
        match content.message.as_str() {
            "open_order" => {
                let side = match content.side.as_deref() {
                    Some("BUY") => CycleKind::Buy,
                    Some("SELL") => CycleKind::Sell,
                    Some("BUY&SELL") | Some("BUY_AND_SELL") => CycleKind::BuyAndSell,
                    _ => return None,
                };
                Some(StrategyEvent::OpenOrder {
                    meta,
                    side,
                    price: content.price.unwrap_or(Decimal::ZERO),
                })
            }
            "close_cycle" => Some(StrategyEvent::CloseCycle {
                meta,
                id: content.id.clone()?,
            }),
            "close_all_cycles" => Some(StrategyEvent::CloseAllCycles { meta }),
            "close_order" => Some(StrategyEvent::CloseOrder {
                meta,
                ticket: content.ticket?,
            }),
            "close_pending_order" => Some(StrategyEvent::ClosePendingOrder {
                meta,
                ticket: content.ticket?,
            }),
            "close_all_pending_orders" => Some(StrategyEvent::CloseAllPendingOrders { meta }),
            "update_order_configs" => Some(StrategyEvent::UpdateOrderConfigs {
                meta,
                ticket: content.ticket?,
                sl: content.sl,
                tp: content.tp,
                trailing_steps: content.trailing_steps,
            }),
            "stop_bot" => Some(StrategyEvent::StopBot { meta }),
            "start_bot" => Some(StrategyEvent::StartBot { meta }),
            other => {
                tracing::warn!(kind = other, "unrecognized strategy event kind, discarding");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_open_order_with_market_price() {
        let content = EventContent {
            message: "open_order".into(),
            side: Some("BUY".into()),
            price: Some(dec!(0)),
            ..Default::default()
        };
        let event = StrategyEvent::parse(&content).unwrap();
        assert_eq!(
            event,
            StrategyEvent::OpenOrder {
                meta: EventMeta::default(),
                side: CycleKind::Buy,
                price: dec!(0),
            }
        );
    }

    #[test]
    fn close_cycle_carries_the_all_sentinel() {
        let content = EventContent {
            message: "close_cycle".into(),
            id: Some("all".into()),
            ..Default::default()
        };
        let event = StrategyEvent::parse(&content).unwrap();
        assert_eq!(
            event,
            StrategyEvent::CloseCycle {
                meta: EventMeta::default(),
                id: "all".into(),
            }
        );
    }

    #[test]
    fn unknown_message_kind_is_discarded() {
        let content = EventContent {
            message: "frobnicate".into(),
            ..Default::default()
        };
        assert!(StrategyEvent::parse(&content).is_none());
    }

    #[test]
    fn open_order_missing_side_is_discarded() {
        let content = EventContent {
            message: "open_order".into(),
            ..Default::default()
        };
        assert!(StrategyEvent::parse(&content).is_none());
    }
}
