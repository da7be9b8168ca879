//! The remove.bg client
//!
//! One pipeline serves all three input modes:
//! options → normalized parameters → prepared request → transport →
//! interpreted response → optional output file.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::options::ProcessingOptions;
use crate::request::{self, ImageSource, NormalizedApiParameters};
use crate::response::{self, RemoveBgResult};
use crate::transport::{ReqwestTransport, Transport};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Client for the remove.bg API
///
/// Cheap to clone and safe to share between tasks. It holds only immutable
/// configuration and the transport; every call builds its own request.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client using the default `reqwest` transport
    ///
    /// # Errors
    /// - Invalid configuration (missing API key, bad endpoint)
    /// - Failed to create HTTP client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        })
    }

    /// Create a client with a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Remove the background of an image the API fetches from `url`
    pub async fn remove_background_from_url<S: Into<String>>(
        &self,
        url: S,
        options: &ProcessingOptions,
    ) -> Result<RemoveBgResult> {
        self.remove_background(&ImageSource::Url(url.into()), options)
            .await
    }

    /// Remove the background of a local image file
    ///
    /// The file is read before anything is sent; an unreadable path fails
    /// with `RemoveBgError::Io`.
    pub async fn remove_background_from_file<P: Into<PathBuf>>(
        &self,
        path: P,
        options: &ProcessingOptions,
    ) -> Result<RemoveBgResult> {
        self.remove_background(&ImageSource::File(path.into()), options)
            .await
    }

    /// Remove the background of a base64-encoded image
    pub async fn remove_background_from_base64<S: Into<String>>(
        &self,
        base64_image: S,
        options: &ProcessingOptions,
    ) -> Result<RemoveBgResult> {
        self.remove_background(&ImageSource::Base64(base64_image.into()), options)
            .await
    }

    /// Shared pipeline behind the three entry points
    ///
    /// Dropping the returned future cancels the request. No retries are
    /// attempted for any kind of failure.
    pub async fn remove_background(
        &self,
        source: &ImageSource,
        options: &ProcessingOptions,
    ) -> Result<RemoveBgResult> {
        let span = tracing::debug_span!(
            "remove_background",
            modality = source.modality(),
            endpoint = %self.config.endpoint
        );

        async move {
            options.validate()?;
            let params = NormalizedApiParameters::from_options(options);
            let prepared = request::prepare(source, &params, &self.config.api_key).await?;

            tracing::debug!(parameters = params.len(), "Sending request");
            let start = Instant::now();
            let raw = self.transport.send(prepared).await?;
            tracing::debug!(
                status = raw.status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Response received"
            );

            let result = response::interpret(raw)?;

            if let Some(path) = &options.output_file {
                result.save(path).await?;
            }

            Ok(result)
        }
        .instrument(span)
        .await
    }
}
