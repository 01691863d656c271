use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use labtrack_auth::{Hs256JwtValidator, JwtValidator};
use labtrack_infra::{
    ChangeFeed, Config, ExpiryPredictor, InMemoryItemStore, ItemStore, LiveListing,
    PostgresItemStore, StoreError, external::SupabaseAuthClient, predictor_from_config,
};

/// Everything a handler needs, shared behind one `Arc`.
pub struct AppServices {
    store: Arc<dyn ItemStore>,
    listing: LiveListing,
    predictor: Arc<dyn ExpiryPredictor>,
    auth_client: Option<SupabaseAuthClient>,
    jwt: Arc<dyn JwtValidator>,
}

impl AppServices {
    pub fn store(&self) -> &dyn ItemStore {
        self.store.as_ref()
    }

    pub fn listing(&self) -> &LiveListing {
        &self.listing
    }

    pub fn predictor(&self) -> &dyn ExpiryPredictor {
        self.predictor.as_ref()
    }

    pub fn auth_client(&self) -> Option<&SupabaseAuthClient> {
        self.auth_client.as_ref()
    }

    pub fn jwt(&self) -> Arc<dyn JwtValidator> {
        self.jwt.clone()
    }
}

/// Wire store, live listing, predictor and auth client from configuration.
///
/// Postgres is used when `DATABASE_URL` is set; otherwise rows live in memory
/// for the lifetime of the process.
pub async fn build_services(config: &Config) -> Result<AppServices, StoreError> {
    let feed = ChangeFeed::new();

    let store: Arc<dyn ItemStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("using postgres item store");
            Arc::new(PostgresItemStore::connect(url, feed).await?)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory item store");
            Arc::new(InMemoryItemStore::new(feed))
        }
    };

    let listing = LiveListing::start(store.clone(), config.listing_debounce).await?;

    let predictor = predictor_from_config(config);
    tracing::info!(backend = predictor.name(), "expiry predictor ready");

    let auth_client = config
        .supabase
        .url
        .clone()
        .map(|url| SupabaseAuthClient::new(url, config.supabase.anon_key.clone()));
    if auth_client.is_none() {
        tracing::warn!("SUPABASE_URL not set, password sign-in disabled");
    }

    let jwt: Arc<dyn JwtValidator> =
        Arc::new(Hs256JwtValidator::new(config.supabase.jwt_secret.as_bytes()));

    Ok(AppServices {
        store,
        listing,
        predictor,
        auth_client,
        jwt,
    })
}

/// Item change notifications as server-sent events named after the change
/// topic (`item.inserted`, `item.updated`, `item.deleted`).
pub fn item_sse_stream(
    services: Arc<AppServices>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.store().changes().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(change) => {
            let data = serde_json::to_string(&change).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(change.topic()).data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
