//! File I/O for input images and result images
//!
//! Kept apart from request/response logic so both sides can be tested
//! without a network.

use crate::error::{RemoveBgError, Result};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Service for reading input images and writing result images
pub struct ImageIoService;

impl ImageIoService {
    /// Read an input image fully into memory
    ///
    /// The file handle is scoped to this call and closed on every return
    /// path, including read errors.
    ///
    /// # Errors
    /// - `RemoveBgError::Io` if the path is missing, unreadable or a directory
    pub async fn read_input<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path_ref = path.as_ref();

        let mut file = tokio::fs::File::open(path_ref)
            .await
            .map_err(|e| RemoveBgError::file_io_error("open input image", path_ref, &e))?;

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .await
            .map_err(|e| RemoveBgError::file_io_error("read input image", path_ref, &e))?;

        tracing::trace!(
            path = %path_ref.display(),
            bytes = buffer.len(),
            "Read input image"
        );
        Ok(buffer)
    }

    /// Write result bytes, creating parent directories as needed
    ///
    /// # Errors
    /// - `RemoveBgError::OutputWrite` on any filesystem failure
    pub async fn write_output<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| {
                    RemoveBgError::OutputWrite {
                        path: path_ref.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        tokio::fs::write(path_ref, bytes)
            .await
            .map_err(|source| RemoveBgError::OutputWrite {
                path: path_ref.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            path = %path_ref.display(),
            bytes = bytes.len(),
            "Wrote result image"
        );
        Ok(())
    }

    /// File name reported in the multipart upload
    pub fn upload_file_name<P: AsRef<Path>>(path: P) -> String {
        path.as_ref()
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("image")
            .to_string()
    }
}
