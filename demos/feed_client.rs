use adaptive_realtime_rs::{ConnectOptions, EventFilter, EventType, RealtimeClient};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Connects to a realtime backend, listens to the social feed and sends a few events
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // RUST_LOG=adaptive_realtime_rs=debug for per-frame traffic
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::var("REALTIME_URL").expect("REALTIME_URL must be set in .env");
    let token = std::env::var("REALTIME_TOKEN").expect("REALTIME_TOKEN must be set in .env");
    let user_id = std::env::var("REALTIME_USER_ID").unwrap_or_else(|_| "demo-user".to_string());

    println!("📡 Connecting to: {}\n", url);

    let client = RealtimeClient::builder(&url)?
        .credentials(token, &user_id)?
        .build()?;

    client
        .on_connection_state(|stats| {
            println!(
                "🔌 connected={} transport={:?} quality={} attempts={}",
                stats.connected, stats.transport, stats.quality, stats.reconnect_attempts
            );
        })
        .await;

    client
        .on(EventType::Like, |event| {
            println!("❤️  {} liked {:?}", event.user_id, event.game_id);
        })
        .await;
    client
        .on(EventType::Follow, |event| {
            println!("➕ {} followed {}", event.user_id, event.payload["targetUserId"]);
        })
        .await;
    client
        .on(EventFilter::Any, |event| {
            println!("📨 {} event {}", event.event_type, event.id);
        })
        .await;

    // Queued until the session opens
    client.send_user_online(&user_id).await;

    client.connect(ConnectOptions::default()).await?;
    println!("✅ Connected via {:?}\n", client.transport().await);

    client.send_like("demo-game", &user_id).await;
    client.send_reaction("demo-game", &user_id, "🔥").await;

    println!("⏳ Listening for 30 seconds...");
    for _ in 0..6 {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let stats = client.stats().await;
        println!(
            "📊 sent={} received={} latency={}ms uptime={}ms",
            stats.messages_sent, stats.messages_received, stats.latency_ms, stats.uptime_ms
        );
    }

    client.disconnect().await;
    println!("👋 Disconnected");
    Ok(())
}
