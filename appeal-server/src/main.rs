mod routes;

use std::env;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use appeal_core::config::{env_bool, env_u64};
use appeal_core::{AppealConfig, Data, SystemClock, TokenCodec};
use appeal_database::{CacheService, Database, MIGRATOR};
use appeal_discord::{DiscordOAuthClient, DiscordPlatform};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !target.starts_with("serenity::http::ratelimiting")
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    let config = Arc::new(AppealConfig::from_env()?);
    info!(
        guild_configured = config.guild_id.is_some(),
        skip_ban_check = config.skip_ban_check,
        form_envelope = config.use_form_envelope,
        blocked_users = config.blocked_users.len(),
        "Appeal configuration loaded."
    );

    let database_url = env::var("DATABASE_URL")?;
    let db_pool = PgPoolOptions::new()
        .max_connections(u32::try_from(env_u64("DATABASE_MAX_CONNECTIONS", 5)).unwrap_or(5))
        .connect(&database_url)
        .await?;
    info!("PostgreSQL connection established.");

    let cache = build_cache().await;
    let db = Database::with_cache(db_pool, cache);

    let auto_run_migrations = env_bool("AUTO_RUN_MIGRATIONS", true);
    if auto_run_migrations {
        MIGRATOR.run(db.pool()).await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    let data = Data {
        codec: TokenCodec::new(&config.jwt_secret),
        identity: Arc::new(DiscordOAuthClient::new(
            config.discord_client_id.clone(),
            config.discord_client_secret.clone(),
        )),
        platform: Arc::new(DiscordPlatform::new(&config.bot_token)),
        store: Arc::new(db),
        clock: Arc::new(SystemClock),
        config,
    };

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "Appeal server listening.");

    axum::serve(listener, routes::router(data))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Appeal server stopped.");
    Ok(())
}

async fn build_cache() -> CacheService {
    let redis_key_prefix =
        env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "appeals:prod".to_string());

    if !env_bool("REDIS_ENABLED", false) {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        return CacheService::disabled(redis_key_prefix);
    }

    let cache = match env::var("REDIS_URL") {
        Ok(redis_url) => match CacheService::redis(&redis_url, redis_key_prefix.clone()) {
            Ok(cache) => {
                info!(key_prefix = %redis_key_prefix, "Redis cache enabled.");
                cache
            }
            Err(err) => {
                warn!(?err, key_prefix = %redis_key_prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
                CacheService::disabled(redis_key_prefix)
            }
        },
        Err(_) => {
            warn!(key_prefix = %redis_key_prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
            CacheService::disabled(redis_key_prefix)
        }
    };

    if cache.is_redis_enabled() {
        if let Err(err) = cache.ping().await {
            warn!(
                ?err,
                "Redis cache ping failed; cache operations will continue with fallback behavior."
            );
        } else {
            info!("Redis cache health check passed.");
        }
    }

    cache
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}
