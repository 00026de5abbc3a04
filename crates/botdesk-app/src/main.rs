use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use botdesk_core::config::{BotdeskConfig, LogFormat, TlsConfig};
use botdesk_core::{AccountStore, OnboardingStore, SubscriberStore};
use botdesk_server::email::EmailSender;
use botdesk_server::{AppState, ChatRelay, JwtIdentityProvider, bootstrap_admins, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/botdesk.toml".to_string());
    let config = BotdeskConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    init_tracing(&config.log_format);

    let url = config.database.url.clone();
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        let pool = botdesk_storage_postgres::connect_pool(&url).await?;
        tracing::info!("using postgres storage");
        serve(
            config,
            botdesk_storage_postgres::PostgresAccountStore::new(pool.clone()),
            botdesk_storage_postgres::PostgresSubscriberStore::new(pool.clone()),
            botdesk_storage_postgres::PostgresOnboardingStore::new(pool),
        )
        .await
    } else {
        // Ensure the data directory exists for file-backed databases
        std::fs::create_dir_all("data")?;
        let pool = botdesk_storage_sqlite::connect_pool(&url).await?;
        tracing::info!("using sqlite storage");
        serve(
            config,
            botdesk_storage_sqlite::SqliteAccountStore::new(pool.clone()),
            botdesk_storage_sqlite::SqliteSubscriberStore::new(pool.clone()),
            botdesk_storage_sqlite::SqliteOnboardingStore::new(pool),
        )
        .await
    }
}

fn init_tracing(format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).pretty().init(),
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
    }
}

async fn serve<A, S, O>(
    config: BotdeskConfig,
    account_store: A,
    subscriber_store: S,
    onboarding_store: O,
) -> anyhow::Result<()>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let account_store = Arc::new(account_store);
    bootstrap_admins(account_store.as_ref(), &config.bootstrap_admins).await?;

    let identity = JwtIdentityProvider::new(account_store.clone(), config.jwt.access_secret.clone());
    let chat_relay = ChatRelay::new(&config.chat)?;
    if config.chat.webhook_url.is_none() {
        tracing::warn!("chat webhook not configured, /api/chat will fail");
    }

    let email_sender = match &config.smtp {
        Some(smtp) => Some(Arc::new(EmailSender::new(smtp)?)),
        None => {
            tracing::warn!("SMTP not configured, sign-in codes will not be emailed");
            None
        }
    };

    let addr = format!("0.0.0.0:{}", config.port);

    // Extract TLS config before moving config into Arc
    let tls_config = config.tls.clone();
    let public_url = config.public_url.clone();

    let state = AppState {
        account_store,
        subscriber_store: Arc::new(subscriber_store),
        onboarding_store: Arc::new(onboarding_store),
        identity: Arc::new(identity),
        config: Arc::new(config),
        chat_relay,
        email_sender,
    };

    let router = build_router(state);

    match tls_config {
        Some(tls_config) => serve_tls(router, tls_config, &addr, public_url).await,
        None => {
            tracing::info!("botdesk starting on {}", addr);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, router).await?;
            Ok(())
        }
    }
}

async fn serve_tls(
    router: axum::Router,
    tls_config: TlsConfig,
    addr: &str,
    public_url: String,
) -> anyhow::Result<()> {
    use futures::StreamExt;
    use rustls_acme::{AcmeConfig, caches::DirCache};

    std::fs::create_dir_all(&tls_config.cert_cache)?;

    let mut acme_state = AcmeConfig::new(tls_config.domains)
        .contact([format!("mailto:{}", tls_config.contact_email)])
        .cache(DirCache::new(tls_config.cert_cache))
        .directory_lets_encrypt(tls_config.production)
        .state();
    let acceptor = acme_state.axum_acceptor(acme_state.default_rustls_config());
    tokio::spawn(async move {
        while let Some(event) = acme_state.next().await {
            match event {
                Ok(ok) => tracing::info!("acme event: {:?}", ok),
                Err(err) => tracing::error!("acme error: {:?}", err),
            }
        }
    });

    // HTTP -> HTTPS redirect on port 80
    tokio::spawn(http_redirect_server(public_url));

    tracing::info!("botdesk starting HTTPS on {}", addr);
    let sock_addr: std::net::SocketAddr = addr.parse()?;
    axum_server::bind(sock_addr)
        .acceptor(acceptor)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

async fn http_redirect_server(public_url: String) {
    let app = axum::Router::new().fallback(move |req: axum::extract::Request| {
        let base = public_url.trim_end_matches('/').to_string();
        async move {
            let target = format!("{}{}", base, req.uri());
            axum::response::Redirect::permanent(&target)
        }
    });
    let Ok(listener) = tokio::net::TcpListener::bind("0.0.0.0:80").await else {
        tracing::warn!("could not bind port 80 for HTTP redirect");
        return;
    };
    tracing::info!("HTTP redirect listening on 0.0.0.0:80");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::warn!(error = %e, "HTTP redirect server stopped");
    }
}
