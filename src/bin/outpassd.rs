// Main entry point for the outpass API server

use std::sync::Arc;

use anyhow::{Context, Result};
use outpass::notify::{MailRelayOptions, TwilioOptions};
use outpass::{
    Config, CredentialIssuer, NotificationDispatcher, OutpassWorkflow, PostgresRecordStore,
    ReqwestTransport, SignedLinkRenderer,
};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,outpass=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting outpass API");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running database migrations...");
    outpass::migrator()
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let transport = ReqwestTransport::new(
        TwilioOptions {
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_from_number.clone(),
        },
        MailRelayOptions {
            url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from: config.mail_from.clone(),
        },
    );
    let dispatcher = NotificationDispatcher::new(Arc::new(transport));

    let validity = config.workflow.credential_validity();
    let renderer = SignedLinkRenderer::new(
        config.credential_base_url.clone(),
        config.credential_signing_secret.clone(),
        validity,
    );
    let issuer = CredentialIssuer::new(
        Arc::new(renderer),
        dispatcher.clone(),
        validity,
        config.credential_signing_secret.clone(),
    );

    let workflow = OutpassWorkflow::new(
        Arc::new(PostgresRecordStore::new(pool)),
        dispatcher,
        issuer,
        config.workflow.clone(),
    );
    let app = outpass::api::router(workflow);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
        signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
