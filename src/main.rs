// ============================================================================
// ARENA LEDGER - WALLET & SETTLEMENT SERVER
// ============================================================================
//
// Entry fees, prize payouts, guild-war wagers and payment approvals behind
// one JSON API. State lives in memory and is snapshotted to ReDB.
//
// Run:  cargo run
// Test: curl http://localhost:8080/health

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_ledger::routes::{build_router, AppState, VERSION};
use arena_ledger::{
    EngineConfig, NewUser, Role, ServerConfig, SettlementEngine, SimulatedScreenshotScorer,
    SnapshotStore, SystemClock,
};

/// Simulated gateway latency
const REVIEW_LATENCY_MS: u64 = 1500;

// ============================================================================
// GRACEFUL SHUTDOWN
// ============================================================================

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("🛑 Shutdown signal received");
}

fn save_snapshot(snapshots: &SnapshotStore, engine: &SettlementEngine) {
    if let Err(e) = snapshots.save(&engine.snapshot()) {
        error!("❌ Snapshot failed: {}", e);
    }
}

// ============================================================================
// MAIN
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,arena_ledger=debug")))
        .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
        .init();

    info!("╔══════════════════════════════════════════════════════╗");
    info!("║       ARENA LEDGER - WALLET & SETTLEMENT             ║");
    info!("╠══════════════════════════════════════════════════════╣");
    info!("║  Version:   {:<41}║", VERSION);
    info!("╚══════════════════════════════════════════════════════╝");

    // 2. Configuration
    let engine_config = EngineConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;
    info!(
        min_bet = %engine_config.min_bet_amount,
        max_bet = %engine_config.max_bet_amount,
        daily_limit = %engine_config.daily_bet_limit,
        "⚙️ Engine configuration loaded"
    );

    // 3. Ledger (restore latest snapshot)
    let snapshots = SnapshotStore::open(&server_config.data_dir)?;
    let engine = match snapshots.load_latest()? {
        Some(state) => SettlementEngine::from_state(state, engine_config, Arc::new(SystemClock)),
        None => SettlementEngine::with_clock(engine_config, Arc::new(SystemClock)),
    };

    if engine.find_user_by_name(&server_config.admin_username).is_none() {
        let admin = engine.register_user(NewUser {
            username: server_config.admin_username.clone(),
            email: server_config.admin_email.clone(),
            role: Role::SuperAdmin,
            upi_id: None,
        })?;
        info!(admin_id = admin.id, username = %admin.username, "🔑 Bootstrap admin created");
    }

    // 4. Periodic snapshots
    {
        let snapshots = snapshots.clone();
        let engine = engine.clone();
        let every = Duration::from_secs(server_config.snapshot_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                save_snapshot(&snapshots, &engine);
            }
        });
    }

    // 5. HTTP
    let gateway = Arc::new(SimulatedScreenshotScorer::new(Duration::from_millis(REVIEW_LATENCY_MS)));
    let app = build_router(AppState::new(engine.clone(), gateway));

    info!("🚀 Listening on http://{}", server_config.bind_addr);
    info!("");
    info!("👤 PLAYERS:");
    info!("   POST /users                     Register");
    info!("   POST /tournaments/{{id}}/join     Join tournament");
    info!("   POST /wars/{{id}}/bets            Bet on a guild war");
    info!("");
    info!("🛡️ ADMIN:");
    info!("   POST /admin/results/{{id}}/verify Verify normal result");
    info!("   POST /admin/wars/{{id}}/resolve   Resolve guild war");
    info!("   GET  /admin/audit               Audit log");
    info!("");

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 6. Final snapshot
    save_snapshot(&snapshots, &engine);
    info!("✅ Server shutdown complete");
    Ok(())
}
