use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;

const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub bucket: String,
    pub blob_base_url: String,
    pub static_dir: String,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Photo gallery API")]
pub struct Args {
    /// Host to bind to (overrides PHOTO_GALLERY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PHOTO_GALLERY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where photo blobs are stored (overrides PHOTO_GALLERY_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides PHOTO_GALLERY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Bucket name blobs are grouped under (overrides PHOTO_GALLERY_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Public prefix of blob locators (overrides PHOTO_GALLERY_BLOB_BASE_URL)
    #[arg(long)]
    pub blob_base_url: Option<String>,

    /// Directory of static front-end assets (overrides PHOTO_GALLERY_STATIC_DIR)
    #[arg(long)]
    pub static_dir: Option<String>,

    /// Maximum request body size for uploads (overrides PHOTO_GALLERY_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::merge(args, |name| env::var(name))?;
        Ok((cfg, migrate))
    }

    /// Merge CLI args over values from `lookup`, falling back to defaults.
    fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|_| default.into());

        let env_port = parse_var(&lookup, "PHOTO_GALLERY_PORT", 3000u16)?;
        let env_max_upload = parse_var(&lookup, "PHOTO_GALLERY_MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;

        let cfg = Self {
            host: args
                .host
                .unwrap_or_else(|| var("PHOTO_GALLERY_HOST", "0.0.0.0")),
            port: args.port.unwrap_or(env_port),
            storage_dir: args
                .storage_dir
                .unwrap_or_else(|| var("PHOTO_GALLERY_STORAGE_DIR", "./data/blobs")),
            database_url: args.database_url.unwrap_or_else(|| {
                var("PHOTO_GALLERY_DATABASE_URL", "sqlite://./data/meta/photos.db")
            }),
            bucket: args
                .bucket
                .unwrap_or_else(|| var("PHOTO_GALLERY_BUCKET", "photos")),
            blob_base_url: args.blob_base_url.unwrap_or_else(|| {
                var("PHOTO_GALLERY_BLOB_BASE_URL", "http://localhost:3000/blobs")
            }),
            static_dir: args
                .static_dir
                .unwrap_or_else(|| var("PHOTO_GALLERY_STATIC_DIR", "./public")),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        };

        ensure_bucket_name_safe(&cfg.bucket)?;
        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

/// Validate bucket name format with S3-like rules:
/// - 3–63 characters
/// - lowercase letters, digits, dots, hyphens only
/// - cannot start/end with dot or hyphen
/// - cannot contain consecutive dots or dot-hyphen patterns
/// - cannot look like an IPv4 address
fn ensure_bucket_name_safe(name: &str) -> Result<()> {
    let len = name.len();
    if !(BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&len) {
        bail!("bucket `{}` must be between 3 and 63 characters", name);
    }
    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        bail!(
            "bucket `{}` may only contain lowercase letters, digits, dots, and hyphens",
            name
        );
    }
    if name.starts_with(['.', '-']) || name.ends_with(['.', '-']) {
        bail!("bucket `{}` must start and end with a lowercase letter or digit", name);
    }
    if name.contains("..") || name.contains("-.") || name.contains(".-") {
        bail!("bucket `{}` cannot contain consecutive dots or dot-hyphen combinations", name);
    }
    if is_ipv4_like(name) {
        bail!("bucket `{}` must not be formatted like an IP address", name);
    }
    Ok(())
}

/// Check if a string matches IPv4-like dotted decimal form.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|segment| {
            !segment.is_empty()
                && segment.len() <= 3
                && segment.chars().all(|c| c.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}
