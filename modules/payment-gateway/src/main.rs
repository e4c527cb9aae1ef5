use payment_gateway_rs::{
    router,
    webhook::{InMemoryIdempotencyStore, LoggingHandlers},
    AppState, GatewayConfig, PaymentGateway, WebhookRouter, WebhookVerification,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,payment_gateway_rs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cfg = GatewayConfig::from_env()?;
    tracing::info!(
        base_url = %cfg.base_url,
        environment = %cfg.environment,
        ack_policy = ?cfg.ack_policy,
        "config loaded"
    );
    if cfg.webhook_verification == WebhookVerification::Insecure {
        tracing::warn!("WEBHOOK_ALLOW_UNSIGNED=true: webhook signatures are NOT verified");
    }

    let gateway = PaymentGateway::from_config(&cfg)?;
    let webhooks = WebhookRouter::new(
        &cfg,
        Arc::new(LoggingHandlers),
        Arc::new(
            InMemoryIdempotencyStore::new(cfg.dedup_retention).with_claim_lease(cfg.claim_lease),
        ),
    );

    let app = router(AppState { gateway, webhooks })
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Payment gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
