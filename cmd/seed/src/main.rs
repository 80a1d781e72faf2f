//! Seeds the configured stores with a demo seller and a handful of listings.
//!
//! The seller lives in an in-memory auth provider, so every run registers a
//! fresh account with a new uid. Re-seeding a persistent record store adds
//! another batch of listings under that new owner.
//!
//! ```text
//! WEBCARROS__STORAGE__RECORDS__BACKEND=sqlite \
//! WEBCARROS__STORAGE__RECORDS__SQLITE_URL=sqlite://data/webcarros.db \
//! WEBCARROS__STORAGE__MEDIA__BACKEND=local \
//! WEBCARROS__SEED__IMAGES_DIR=./assets/cars \
//! cargo run -p seed
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use auth_adapters::InMemoryAuthProvider;
use configs::{LogSettings, MediaBackend, RecordBackend, Settings, StorageSettings};
use domains::contact::whatsapp_link;
use domains::validation::SignUpForm;
use domains::{BlobStore, ListingFields, ListingStore, MediaFile};
use secrecy::ExposeSecret;
use services::{
    AccountService, ListingFilter, ListingRepository, MediaUploadPipeline, SessionGate,
    StagingArea,
};
use storage_adapters::{MemoryBlobStore, MemoryListingStore};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 1x1 transparent PNG, used when no images directory is configured.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

async fn record_store(storage: &StorageSettings) -> Result<Arc<dyn ListingStore>> {
    match storage.records.backend {
        RecordBackend::Memory => Ok(Arc::new(MemoryListingStore::new())),
        #[cfg(feature = "db-sqlite")]
        RecordBackend::Sqlite => {
            let url = storage
                .records
                .sqlite_url
                .as_deref()
                .context("storage.records.sqlite_url is not set")?;
            let store = storage_adapters::SqliteListingStore::connect(url)
                .await
                .with_context(|| format!("opening {url}"))?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "db-sqlite"))]
        RecordBackend::Sqlite => bail!("built without the db-sqlite feature"),
    }
}

fn blob_store(storage: &StorageSettings) -> Result<Arc<dyn BlobStore>> {
    let media = &storage.media;
    match media.backend {
        MediaBackend::Memory => Ok(Arc::new(MemoryBlobStore::new(media.public_url.as_str()))),
        #[cfg(feature = "media-local")]
        MediaBackend::Local => Ok(Arc::new(storage_adapters::LocalBlobStore::new(
            media.root.clone(),
            media.public_url.as_str(),
        ))),
        #[cfg(not(feature = "media-local"))]
        MediaBackend::Local => bail!("built without the media-local feature"),
    }
}

/// Every .jpg/.jpeg/.png in `dir`, sorted by file name.
async fn load_images(dir: &Path) -> Result<Vec<MediaFile>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("reading {}", dir.display()))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        paths.push(entry.path());
    }
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        let Some(mime) = mime_guess::from_path(&path).first() else {
            continue;
        };
        if !services::ACCEPTED_MEDIA_TYPES.contains(&mime.essence_str()) {
            continue;
        }
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push(MediaFile::new(name, mime.essence_str(), bytes));
    }
    Ok(files)
}

fn demo_listings() -> Vec<ListingFields> {
    let car = |name: &str, model: &str, year: &str, km: &str, price: &str, city: &str| {
        ListingFields {
            name: name.into(),
            model: model.into(),
            year: year.into(),
            km: km.into(),
            price: price.into(),
            city: city.into(),
            whatsapp: "11991019231".into(),
            description: format!("{name} {model} em ótimo estado, documentação em dia."),
        }
    };
    vec![
        car("onix", "1.0 Flex Manual", "2016/2016", "23.900", "69.000", "Coroatá"),
        car("onix plus", "1.0 Turbo", "2021/2022", "18.000", "92.000", "São Luís"),
        car("palio", "Fire 1.0", "2012/2013", "98.500", "24.900", "Teresina"),
        car("civic", "EXL 2.0", "2019/2019", "41.200", "118.000", "Imperatriz"),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);

    let gate = Arc::new(SessionGate::new());
    let accounts = AccountService::new(Arc::new(InMemoryAuthProvider::new()), gate.clone());
    let listings = ListingRepository::new(record_store(&settings.storage).await?, gate.clone());
    let media = MediaUploadPipeline::new(blob_store(&settings.storage)?, gate.clone());

    let seed = &settings.seed;
    accounts.enter_registration().await?;
    let seller = accounts
        .register(SignUpForm::new(
            &seed.name,
            &seed.email,
            seed.password.expose_secret(),
        ))
        .await
        .context("registering the demo seller")?;
    info!(uid = %seller.uid, email = %seller.email, "demo seller ready");

    let pictures = match &seed.images_dir {
        Some(dir) => load_images(dir).await?,
        None => Vec::new(),
    };
    if pictures.is_empty() {
        warn!("no images configured, using a placeholder");
    }

    for (i, fields) in demo_listings().into_iter().enumerate() {
        let file = if pictures.is_empty() {
            MediaFile::new(format!("placeholder-{i}.png"), "image/png", PLACEHOLDER_PNG)
        } else {
            pictures[i % pictures.len()].clone()
        };

        let mut staging = StagingArea::new();
        for failure in media.submit_all(vec![file], &mut staging).await {
            warn!(error = %failure, "demo image upload failed");
        }
        if staging.is_empty() {
            bail!("no image could be uploaded for {}", fields.name);
        }

        let name = fields.name.clone();
        let id = listings
            .create(fields, staging.take())
            .await
            .with_context(|| format!("creating listing {name}"))?;
        info!(listing_id = %id, %name, "demo listing created");
    }

    let all = listings.list(ListingFilter::All).await?;
    let onix = listings.search("onix").await?;
    info!(total = all.len(), onix = onix.len(), "seed complete");
    if let Some(newest) = all.first() {
        info!(listing_id = %newest.id, contact = %whatsapp_link(newest), "newest listing");
    }
    Ok(())
}
