//! `bargain-live <room-id>` - watches one bargain room and logs every change.

use std::error::Error;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{fmt, EnvFilter};

use bargain_live::adapters::{ConnectionManager, HttpBargainClient, TungsteniteTransport};
use bargain_live::application::{RoomDirectory, RoomSession};
use bargain_live::config::AppConfig;
use bargain_live::domain::foundation::{RoomId, Timestamp};
use bargain_live::domain::view::RoomView;
use bargain_live::ports::BargainApi;

/// How long the socket gets to deliver the room history before HTTP backfill.
const HYDRATION_GRACE: Duration = Duration::from_secs(5);

/// Countdown and local expiry are re-derived at this rate without server events.
const VIEW_TICK: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.log_level);
    config.validate()?;

    let room_id = match std::env::args().nth(1) {
        Some(raw) => RoomId::from_str(&raw)?,
        None => {
            eprintln!("usage: bargain-live <room-id>");
            std::process::exit(2);
        }
    };

    let session = config.session.to_session()?;
    let api: Arc<dyn BargainApi> = Arc::new(HttpBargainClient::new(&config.api, &session)?);
    let directory = RoomDirectory::new(Arc::clone(&api));
    let manager = ConnectionManager::new(
        Arc::new(TungsteniteTransport::new()),
        &config.api,
        config.connection.clone(),
    );

    let detail = directory.get_room(&room_id).await?;
    tracing::info!(
        room_id = %room_id,
        product = detail.room.product_name.as_deref().unwrap_or("-"),
        user_id = %session.user_id,
        role = %session.role,
        "joining bargain room"
    );

    let room = RoomSession::open(detail.room, session, &manager);
    let mut state = room.subscribe();
    let mut connection = room.connection().subscribe();
    let hydration_deadline = tokio::time::sleep(HYDRATION_GRACE);
    tokio::pin!(hydration_deadline);
    let mut backfill_pending = true;
    let mut last_view: Option<RoomView> = None;
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut tick = tokio::time::interval(VIEW_TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!(room_id = %room_id, "shutting down");
                break;
            }
            _ = &mut hydration_deadline, if backfill_pending => {
                backfill_pending = false;
                match room.hydrate_from_http(api.as_ref()).await {
                    Ok(true) => tracing::info!(room_id = %room_id, "room history loaded over HTTP"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!(room_id = %room_id, error = %e, "HTTP backfill failed"),
                }
            }
            _ = tick.tick() => {}
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let view = room.view(&Timestamp::now());
        match last_view.as_ref() {
            Some(last) if *last == view => {}
            Some(last) if only_countdown_moved(last, &view) => {
                tracing::debug!(room_id = %room_id, remaining = view.time_remaining.as_deref().unwrap_or("-"), "countdown");
            }
            _ => log_view(&view),
        }
        last_view = Some(view);
    }

    room.close().await;
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).init();
}

fn only_countdown_moved(last: &RoomView, next: &RoomView) -> bool {
    let mut rewound = next.clone();
    rewound.time_remaining = last.time_remaining.clone();
    rewound == *last
}

fn log_view(view: &RoomView) {
    tracing::info!(
        room_id = %view.room_id,
        status = view.status_label,
        price = %view.current_price_label,
        remaining = view.time_remaining.as_deref().unwrap_or("-"),
        bids = view.bids.len(),
        messages = view.messages.len(),
        online = view.online_count,
        connection = %view.connection_label,
        "room updated"
    );
    if let Some(latest) = view.bids.first() {
        tracing::info!(
            role = %latest.role,
            price = %latest.price_label,
            placed = %latest.placed,
            can_accept = latest.can_accept,
            "latest bid"
        );
    }
    if let Some(typing) = &view.typing_line {
        tracing::info!("{}", typing);
    }
    if let Some(error) = &view.last_error {
        tracing::warn!(error = %error, "room error");
    }
}
