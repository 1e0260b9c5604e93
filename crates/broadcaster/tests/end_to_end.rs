use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use broadcaster::Broadcaster;
use configuration::Settings;
use core_types::{
    AccountBalances, AccountId, ConnectionStatus, Diagnostics, Instrument, MarketPosition, Order, OrderAction,
    OrderState, OrderType, Position,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use source::{AccountState, SimulatedSource, StateSource};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Received = Arc<Mutex<Vec<Value>>>;

async fn record(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
    received.lock().unwrap().push(body);
    StatusCode::OK
}

async fn spawn_dashboard() -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/webhook", post(record))
        .with_state(received.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/webhook", addr), received)
}

fn settings_for(url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.transport.endpoint_url = url.to_string();
    settings.throttle.delay_ms = 50;
    settings
}

fn trading_account() -> AccountState {
    let es = Instrument::new("ES 03-25", "ES");
    AccountState {
        balances: AccountBalances {
            cash_value: Some(dec!(10000)),
            realized_pnl: Some(dec!(0)),
            unrealized_pnl: Some(dec!(25)),
        },
        positions: vec![Position {
            instrument: es.clone(),
            market_position: MarketPosition::Long,
            quantity: 2,
            average_price: dec!(100),
            unrealized_pnl: dec!(25),
            last_price: Some(dec!(112.5)),
        }],
        orders: vec![Order {
            order_id: "ord-1".to_string(),
            instrument: es,
            order_type: OrderType::Limit,
            action: OrderAction::Sell,
            quantity: 2,
            filled: 0,
            limit_price: dec!(120),
            stop_price: Decimal::ZERO,
            state: OrderState::Working,
            name: "Exit".to_string(),
            oco: String::new(),
        }],
    }
}

#[tokio::test]
async fn one_signal_produces_exactly_one_post() {
    let (url, received) = spawn_dashboard().await;
    let source = Arc::new(SimulatedSource::new());
    source.add_account(AccountId::new("Sim101"), ConnectionStatus::Connected, trading_account());

    let broadcaster = Broadcaster::from_settings(
        &settings_for(&url),
        source.clone() as Arc<dyn StateSource>,
        Diagnostics::tracing_only(),
    )
    .unwrap();

    assert!(broadcaster.signal());
    broadcaster.wait_idle().await;

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let body = &received[0];
    assert_eq!(body["account"], "Sim101");
    assert_eq!(body["balance"].as_f64(), Some(10000.0));
    assert_eq!(body["positions"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["positions"][0]["quantity"], 2);
    assert_eq!(body["positions"][0]["averagePrice"].as_f64(), Some(100.0));
    assert_eq!(body["positions"][0]["marketPosition"], "Long");
    let orders = body["workingOrders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["state"], "Working");
    assert_eq!(orders[0]["isStopLoss"], false);
    assert_eq!(orders[0]["isProfitTarget"], false);
}

#[tokio::test]
async fn start_posts_the_current_state_and_stop_silences_notifications() {
    let (url, received) = spawn_dashboard().await;
    let source = Arc::new(SimulatedSource::new());
    let account = AccountId::new("Sim101");
    source.add_account(account.clone(), ConnectionStatus::Connected, trading_account());

    let broadcaster = Broadcaster::from_settings(
        &settings_for(&url),
        source.clone() as Arc<dyn StateSource>,
        Diagnostics::tracing_only(),
    )
    .unwrap();

    broadcaster.start();
    broadcaster.wait_idle().await;
    assert_eq!(received.lock().unwrap().len(), 1);

    broadcaster.stop();
    source.record_execution(&account).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    broadcaster.wait_idle().await;

    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_dashboard_does_not_wedge_the_broadcaster() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = Arc::new(SimulatedSource::new());
    source.add_account(AccountId::new("Sim101"), ConnectionStatus::Connected, trading_account());
    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let diagnostics = {
        let messages = Arc::clone(&messages);
        Diagnostics::new(move |msg| messages.lock().unwrap().push(msg.to_string()))
    };
    let broadcaster = Broadcaster::from_settings(
        &settings_for(&format!("http://{}/webhook", addr)),
        source.clone() as Arc<dyn StateSource>,
        diagnostics,
    )
    .unwrap();

    assert!(broadcaster.signal());
    broadcaster.wait_idle().await;
    assert!(broadcaster.signal(), "a failed delivery must release the throttle");
    broadcaster.wait_idle().await;

    let messages = messages.lock().unwrap();
    assert_eq!(messages.iter().filter(|m| m.starts_with("HTTP Post error: ")).count(), 2);
}
