#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # remove.bg client
//!
//! An async Rust client for the [remove.bg](https://www.remove.bg) background
//! removal API.
//!
//! The image can be supplied three ways, all sharing the same options,
//! defaults and result handling:
//!
//! - **URL**: the API fetches the image itself (`image_url`)
//! - **File**: a local file uploaded as multipart (`image_file`)
//! - **Base64**: an encoded image sent inline (`image_file_b64`)
//!
//! A call yields either a [`RemoveBgResult`] (base64 image, credits charged,
//! detected type, dimensions, rate-limit counters) or a [`RemoveBgError`].
//! Non-200 responses become [`RemoveBgError::Api`] with the structured
//! `{title, detail}` list, or the raw body when the API sent something else.
//!
//! No retries, caching or local image processing happen here; retry policy
//! belongs to the caller, who gets `Retry-After` through
//! [`RateLimit::retry_after`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use removebg::{Client, ClientConfig, ProcessingOptions, Size};
//!
//! # async fn example() -> removebg::Result<()> {
//! let client = Client::new(ClientConfig::with_api_key("YOUR-API-KEY")?)?;
//!
//! let options = ProcessingOptions::builder()
//!     .size(Size::Regular)
//!     .crop(true)
//!     .output_file("cat-no-bg.png")
//!     .build()?;
//!
//! let result = client
//!     .remove_background_from_file("cat.jpg", &options)
//!     .await?;
//! println!(
//!     "{}x{}, {} credit(s) charged",
//!     result.result_width, result.result_height, result.credits_charged
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Defaults
//!
//! Unset options are either defaulted (`size = "preview"`, `type = "auto"`,
//! `crop = false`) or left out of the request entirely; nothing is ever sent
//! as an empty value.
//!
//! ## Feature Flags
//!
//! - `cli` (default): the `removebg` command-line tool
//! - `tracing-json`: JSON log output for the CLI
//!
//! To use only as a library without CLI dependencies:
//!
//! ```toml
//! [dependencies]
//! removebg = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod options;
pub mod request;
pub mod response;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod transport;

// Public API exports
pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder, API_KEY_HEADER, DEFAULT_ENDPOINT};
pub use error::{ApiErrorBody, ErrorDetail, RemoveBgError, Result};
pub use options::{
    DetectedType, ForegroundType, OutputFormat, ProcessingOptions, ProcessingOptionsBuilder, Size,
};
pub use request::{ImageSource, NormalizedApiParameters, ParamValue, PreparedRequest, RequestBody};
pub use response::{RateLimit, RemoveBgResult};
pub use services::ImageIoService;
pub use transport::{RawResponse, ReqwestTransport, Transport};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Remove the background of an image the API fetches from `url`
///
/// Builds a one-off [`Client`]; reuse a `Client` when making many calls.
///
/// # Examples
///
/// ```rust,no_run
/// use removebg::{remove_background_from_url, ClientConfig, ProcessingOptions};
///
/// # async fn example() -> removebg::Result<()> {
/// let config = ClientConfig::with_api_key("YOUR-API-KEY")?;
/// let result = remove_background_from_url(
///     "https://www.remove.bg/example.jpg",
///     &ProcessingOptions::default(),
///     &config,
/// )
/// .await?;
/// let png_bytes = result.decode_image()?;
/// # Ok(())
/// # }
/// ```
pub async fn remove_background_from_url(
    url: &str,
    options: &ProcessingOptions,
    config: &ClientConfig,
) -> Result<RemoveBgResult> {
    Client::new(config.clone())?
        .remove_background_from_url(url, options)
        .await
}

/// Remove the background of a local image file
///
/// # Examples
///
/// ```rust,no_run
/// use removebg::{remove_background_from_file, ClientConfig, ProcessingOptions};
///
/// # async fn example() -> removebg::Result<()> {
/// let config = ClientConfig::with_api_key("YOUR-API-KEY")?;
/// let options = ProcessingOptions::builder()
///     .output_file("output.png")
///     .build()?;
/// remove_background_from_file("input.jpg", &options, &config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn remove_background_from_file<P: AsRef<std::path::Path>>(
    path: P,
    options: &ProcessingOptions,
    config: &ClientConfig,
) -> Result<RemoveBgResult> {
    Client::new(config.clone())?
        .remove_background_from_file(path.as_ref(), options)
        .await
}

/// Remove the background of a base64-encoded image
///
/// Use [`ImageSource::from_bytes`] to encode raw bytes first.
pub async fn remove_background_from_base64(
    base64_image: &str,
    options: &ProcessingOptions,
    config: &ClientConfig,
) -> Result<RemoveBgResult> {
    Client::new(config.clone())?
        .remove_background_from_base64(base64_image, options)
        .await
}
