use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_PDF_RENDER_SCALE: f32 = 2.0;
const DEFAULT_SCRATCH_POOL_SIZE: usize = 4;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Uploads above this size are rejected before analysis.
    pub max_upload_bytes: usize,
    /// Scale at which page 1 of a PDF is rasterized (1.0 = 72 dpi).
    pub pdf_render_scale: f32,
    /// Directory containing the pdfium shared library. `None` uses the system library.
    pub pdfium_library_path: Option<PathBuf>,
    /// Max idle scratch buffers kept between analyses.
    pub scratch_pool_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            pdf_render_scale: env_or("PDF_RENDER_SCALE", DEFAULT_PDF_RENDER_SCALE)?,
            pdfium_library_path: std::env::var("PDFIUM_LIBRARY_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            scratch_pool_size: env_or("SCRATCH_POOL_SIZE", DEFAULT_SCRATCH_POOL_SIZE)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.pdf_render_scale.is_finite() && self.pdf_render_scale > 0.0) {
            bail!(
                "PDF_RENDER_SCALE must be a positive number, got {}",
                self.pdf_render_scale
            );
        }
        if self.max_upload_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES must be greater than zero");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            pdf_render_scale: DEFAULT_PDF_RENDER_SCALE,
            pdfium_library_path: None,
            scratch_pool_size: DEFAULT_SCRATCH_POOL_SIZE,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'"))
}
