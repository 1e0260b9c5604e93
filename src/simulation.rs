//! A random-walk market driving a [`SimulatedSource`], used by `tradecast simulate`.

use core_types::{
    AccountBalances, AccountId, Instrument, MarketPosition, Order, OrderAction, OrderState, OrderType, Position,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use snapshot::{PROFIT_TARGET_ORDER_NAME, STOP_LOSS_ORDER_NAME};
use source::{AccountState, SimulatedSource, SourceError};
use std::sync::Arc;
use std::time::Duration;

const POINT_VALUE: Decimal = dec!(50);
const TICK_SIZE: Decimal = dec!(0.25);

fn front_month() -> Instrument {
    Instrument::new("ES 03-25", "ES")
}

/// A paper account holding one long contract with a bracket around it.
pub fn paper_account(entry: Decimal) -> AccountState {
    let instrument = front_month();
    let bracket = |id: &str, order_type: OrderType, price: Decimal, name: &str| Order {
        order_id: id.to_string(),
        instrument: instrument.clone(),
        order_type,
        action: OrderAction::Sell,
        quantity: 1,
        filled: 0,
        limit_price: if order_type == OrderType::Limit { price } else { Decimal::ZERO },
        stop_price: if order_type == OrderType::StopMarket { price } else { Decimal::ZERO },
        state: OrderState::Working,
        name: name.to_string(),
        oco: "bracket-1".to_string(),
    };

    AccountState {
        balances: AccountBalances {
            cash_value: Some(dec!(100000)),
            realized_pnl: Some(Decimal::ZERO),
            unrealized_pnl: Some(Decimal::ZERO),
        },
        positions: vec![Position {
            instrument: instrument.clone(),
            market_position: MarketPosition::Long,
            quantity: 1,
            average_price: entry,
            unrealized_pnl: Decimal::ZERO,
            last_price: Some(entry),
        }],
        orders: vec![
            bracket("sl-1", OrderType::StopMarket, entry - dec!(20), STOP_LOSS_ORDER_NAME),
            bracket("pt-1", OrderType::Limit, entry + dec!(40), PROFIT_TARGET_ORDER_NAME),
        ],
    }
}

/// Moves the price of one account's position in ticks and raises the
/// notifications a live brokerage would: position, account item and, on
/// occasional fills, execution and order updates.
pub struct RandomWalkFeed {
    source: Arc<SimulatedSource>,
    account: AccountId,
    rng: StdRng,
    entry: Decimal,
    price: Decimal,
    quantity: i64,
    realized: Decimal,
    next_order: u64,
}

impl RandomWalkFeed {
    pub fn new(source: Arc<SimulatedSource>, account: AccountId, entry: Decimal) -> Self {
        Self {
            source,
            account,
            rng: StdRng::from_entropy(),
            entry,
            price: entry,
            quantity: 1,
            realized: Decimal::ZERO,
            next_order: 1,
        }
    }

    /// Ticks forever, every `interval`. Only returns on a source error.
    pub async fn run(&mut self, interval: Duration) -> Result<(), SourceError> {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            // A few price updates per tick land as a burst inside one throttle window.
            let burst = self.rng.gen_range(1..=4);
            for _ in 0..burst {
                self.step()?;
            }
            if self.rng.gen_bool(0.1) {
                self.fill()?;
            }
        }
    }

    fn step(&mut self) -> Result<(), SourceError> {
        let ticks: i64 = self.rng.gen_range(-3..=3);
        self.price += TICK_SIZE * Decimal::from(ticks);
        let unrealized = (self.price - self.entry) * Decimal::from(self.quantity) * POINT_VALUE;

        self.source.upsert_position(
            &self.account,
            Position {
                instrument: front_month(),
                market_position: if self.quantity > 0 { MarketPosition::Long } else { MarketPosition::Flat },
                quantity: self.quantity,
                average_price: self.entry,
                unrealized_pnl: unrealized,
                last_price: Some(self.price),
            },
        )?;
        self.source.modify(&self.account, core_types::ChangeKind::AccountItemUpdate, |state| {
            state.balances.unrealized_pnl = Some(unrealized);
        })
    }

    /// Adds or removes one contract at the current price.
    fn fill(&mut self) -> Result<(), SourceError> {
        let buying = self.quantity == 0 || (self.quantity < 3 && self.rng.gen_bool(0.5));
        let order_id = format!("sim-{}", self.next_order);
        self.next_order += 1;

        if buying {
            let cost = self.entry * Decimal::from(self.quantity) + self.price;
            self.quantity += 1;
            self.entry = (cost / Decimal::from(self.quantity)).round_dp(2);
        } else {
            self.realized += (self.price - self.entry) * POINT_VALUE;
            self.quantity -= 1;
        }
        tracing::debug!(order_id = %order_id, buying, quantity = self.quantity, price = %self.price, "Simulated fill.");

        self.source.upsert_order(
            &self.account,
            Order {
                order_id,
                instrument: front_month(),
                order_type: OrderType::Market,
                action: if buying { OrderAction::Buy } else { OrderAction::Sell },
                quantity: 1,
                filled: 1,
                limit_price: Decimal::ZERO,
                stop_price: Decimal::ZERO,
                state: OrderState::Filled,
                name: "Entry".to_string(),
                oco: String::new(),
            },
        )?;
        self.source.record_execution(&self.account)?;
        let realized = self.realized;
        self.source.modify(&self.account, core_types::ChangeKind::AccountItemUpdate, |state| {
            state.balances.realized_pnl = Some(realized);
        })
    }
}
