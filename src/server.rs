//! Push channel: one WebSocket endpoint plus the static frontend mount. Each
//! connection runs its own refresh loop and keeps its own last-sent snapshot,
//! so connections never interfere with each other.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::coingecko::CoinGeckoClient;
use crate::engine::Engine;
use crate::model::{QuoteCurrency, RateRecord};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub client: Arc<CoinGeckoClient>,
    /// CoinGecko ids for the universe, precomputed from the baseline artifact.
    pub coin_ids: Arc<Vec<String>>,
    pub default_currency: QuoteCurrency,
    pub refresh_interval: Duration,
    pub frontend_dir: String,
}

/// Wire envelope around one output sequence.
#[derive(Serialize)]
struct RatesEnvelope<'a> {
    channel: &'static str,
    event: &'static str,
    data: &'a [RateRecord],
}

/// Inbound client message; anything that is not a rates subscription is
/// ignored.
#[derive(Debug, Deserialize)]
struct SubscribeRequest {
    event: String,
    channel: String,
    #[serde(default)]
    vs_currency: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/crypto_listings/markets/ws", get(ws_handler))
        .nest_service("/frontend", ServeDir::new(state.frontend_dir.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Response {
    match tokio::fs::read_to_string(Path::new(&state.frontend_dir).join("index.html")).await {
        Ok(body) => Html(body).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("Client connected");
    let mut currency = state.default_currency;
    let mut last_sent: Option<Vec<RateRecord>> = None;

    let mut ticker = tokio::time::interval(state.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // An interval's first tick completes immediately; consume it so nothing
    // is pushed until the client subscribes or a full interval elapses.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !push_cycle(&mut socket, &state, currency, &mut last_sent, false).await {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<SubscribeRequest>(text.as_str()) {
                            Ok(req) if req.event == "subscribe" && req.channel == "rates" => {
                                currency = req
                                    .vs_currency
                                    .as_deref()
                                    .map(QuoteCurrency::parse)
                                    .unwrap_or(state.default_currency);
                                tracing::info!(currency = currency.api_name(), "Subscription received, fetching fresh data");
                                // Explicit subscriptions always get an answer,
                                // even if nothing changed.
                                if !push_cycle(&mut socket, &state, currency, &mut last_sent, true).await {
                                    break;
                                }
                            }
                            Ok(req) => {
                                tracing::debug!(event = %req.event, channel = %req.channel, "Ignoring non-subscribe message");
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "Unparseable client message");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Client disconnected");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "WebSocket read error");
                        break;
                    }
                }
            }
        }
    }
}

/// Fetch, normalize, and transmit one output sequence. Timer-driven cycles
/// are suppressed when nothing changed since the last transmission on this
/// connection. Returns false once the connection is gone. Any failure inside
/// the cycle is logged and skips the transmission rather than tearing the
/// connection down.
async fn push_cycle(
    socket: &mut WebSocket,
    state: &AppState,
    currency: QuoteCurrency,
    last_sent: &mut Option<Vec<RateRecord>>,
    force: bool,
) -> bool {
    let raw = state.client.fetch_markets(currency, &state.coin_ids).await;
    let rates = state.engine.normalize(&raw, currency);

    if !force && last_sent.as_ref() == Some(&rates) {
        tracing::debug!("Output unchanged, skipping push");
        return true;
    }

    let envelope = RatesEnvelope {
        channel: "rates",
        event: "data",
        data: &rates,
    };
    let msg = match serde_json::to_string(&envelope) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize rates envelope, skipping cycle");
            return true;
        }
    };

    if socket.send(Message::Text(msg.into())).await.is_err() {
        return false;
    }
    tracing::debug!(records = rates.len(), currency = currency.api_name(), "Pushed rates");
    *last_sent = Some(rates);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesisConfig;
    use std::collections::HashMap;

    fn test_state(frontend_dir: &str) -> AppState {
        let synthesis = SynthesisConfig {
            spot_band: 0.5,
            spread_min: 0.01,
            spread_max: 0.05,
            yesterday_band: 0.10,
            fallback_change_min: 1.0,
            fallback_change_max: 50.0,
            backdate_days_max: 30,
        };
        AppState {
            engine: Arc::new(Engine::new(Vec::new(), HashMap::new(), synthesis, 0.73)),
            client: Arc::new(CoinGeckoClient::new("http://localhost:0", None, 250)),
            coin_ids: Arc::new(Vec::new()),
            default_currency: QuoteCurrency::Cad,
            refresh_interval: Duration::from_secs(30),
            frontend_dir: frontend_dir.to_string(),
        }
    }

    #[tokio::test]
    async fn index_reports_missing_frontend() {
        let resp = index(State(test_state("no-such-frontend-dir"))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn parses_subscribe_message() {
        let req: SubscribeRequest =
            serde_json::from_str(r#"{"event":"subscribe","channel":"rates"}"#).unwrap();
        assert_eq!(req.event, "subscribe");
        assert_eq!(req.channel, "rates");
        assert_eq!(req.vs_currency, None);

        let req: SubscribeRequest = serde_json::from_str(
            r#"{"event":"subscribe","channel":"rates","vs_currency":"usd"}"#,
        )
        .unwrap();
        assert_eq!(req.vs_currency.as_deref(), Some("usd"));
    }

    #[test]
    fn envelope_shape_on_the_wire() {
        let data = vec![RateRecord {
            name: "Bitcoin".to_string(),
            symbol: "BTC_CAD".to_string(),
            spot: 91234.5,
            ask: 92000.0,
            bid: 90000.0,
            timestamp: 1_704_067_200,
            change: 120.5,
            change_percentage: 0.13,
        }];
        let envelope = RatesEnvelope {
            channel: "rates",
            event: "data",
            data: &data,
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(json["channel"], "rates");
        assert_eq!(json["event"], "data");
        assert_eq!(json["data"][0]["symbol"], "BTC_CAD");
        assert_eq!(json["data"][0]["bid"], 90000.0);
        assert_eq!(json["data"][0]["timestamp"], 1_704_067_200i64);
    }
}
