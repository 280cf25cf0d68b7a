//! Entry points consumed by a transport layer.
//!
//! Every call returns a serializable payload on success; failures map to an
//! [`ErrorPayload`] through [`ErrorPayload::from`]. Images are embedded as
//! base64 text.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tracing::{error, info};

use crate::codec::{DicomDecoder, FrameDecoder};
use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::metadata::ImageMetadata;
use crate::pipeline::{FileEntry, ImageSource, ImagingPipeline, ProcessedImage};
use crate::session::UploadSessionStore;

/// One file of an upload batch as received by the transport layer
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub image: String,
    pub metadata: ImageMetadata,
    pub files: Vec<FileEntry>,
    pub current_index: usize,
    pub upload_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
    pub image: String,
    pub metadata: ImageMetadata,
}

impl From<ProcessedImage> for ImageResponse {
    fn from(processed: ProcessedImage) -> Self {
        Self {
            image: STANDARD.encode(&processed.encoded),
            metadata: processed.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustResponse {
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&Error> for ErrorPayload {
    fn from(err: &Error) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

pub struct Viewer<D = DicomDecoder> {
    store: UploadSessionStore,
    pipeline: ImagingPipeline<D>,
}

impl Viewer<DicomDecoder> {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_decoder(DicomDecoder, config)
    }
}

impl<D: FrameDecoder> Viewer<D> {
    pub fn with_decoder(decoder: D, config: &Config) -> Result<Self> {
        Ok(Self {
            store: UploadSessionStore::new(config)?,
            pipeline: ImagingPipeline::with_decoder(decoder, config),
        })
    }

    pub fn store(&self) -> &UploadSessionStore {
        &self.store
    }

    pub fn pipeline(&self) -> &ImagingPipeline<D> {
        &self.pipeline
    }

    /// Store a batch of files in a new session, replacing `previous_id` if
    /// given, and return the first rendered image with the series listing.
    ///
    /// The new session is removed again if nothing in it could be listed.
    pub fn scan_upload(
        &self,
        previous_id: Option<&str>,
        files: &[UploadedFile],
    ) -> Result<ScanResponse> {
        if let Some(previous_id) = previous_id {
            self.store.replace_if_present(previous_id);
        }
        if files.is_empty() {
            return Err(Error::NotFound("No files uploaded".into()));
        }

        let session = self.store.create_session()?;
        info!("Number of uploaded files: {}", files.len());

        let listing = self
            .store
            .accept_batch(
                &session,
                files.iter().map(|file| (file.name.as_str(), file.bytes.as_slice())),
            )
            .and_then(|stored| {
                info!("Found {} DICOM files", stored.len());
                self.pipeline.list_series(&session)
            });

        let listing = match listing {
            Ok(listing) => listing,
            Err(err) => {
                error!("Error processing folder: {err}");
                self.store.replace_if_present(&session.id.to_string());
                return Err(err);
            }
        };

        Ok(ScanResponse {
            image: STANDARD.encode(&listing.first_image.encoded),
            metadata: listing.first_image.metadata,
            files: listing.files,
            current_index: 0,
            upload_id: session.id.to_string(),
        })
    }

    /// Re-render a stored file at the given window
    pub fn adjust(&self, path: impl AsRef<Path>, center: f64, width: f64) -> Result<AdjustResponse> {
        let path = self.store.resolve_stored_file(path)?;
        let encoded = self.pipeline.render(&path, center, width)?;
        Ok(AdjustResponse {
            image: STANDARD.encode(encoded),
        })
    }

    /// Reload a stored file with its default window
    pub fn load_image(&self, path: impl AsRef<Path>) -> Result<ImageResponse> {
        let path = self.store.resolve_stored_file(path)?;
        info!("Loading image from: {}", path.display());
        let processed = self.pipeline.process_one(ImageSource::Path(&path))?;
        Ok(processed.into())
    }

    /// Render a single file that is not part of any session
    pub fn process_file(&self, bytes: &[u8]) -> Result<ImageResponse> {
        let processed = self.pipeline.process_one(ImageSource::Bytes(bytes))?;
        Ok(processed.into())
    }

    pub fn cleanup(&self, upload_id: &str) -> Result<CleanupResponse> {
        let message = if self.store.destroy_session(upload_id)? {
            "Files cleaned up successfully"
        } else {
            "Folder already removed"
        };
        Ok(CleanupResponse {
            message: message.to_string(),
        })
    }
}
