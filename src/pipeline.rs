use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::codec::{DecodedImage, DicomDecoder, FrameDecoder, encode};
use crate::config::Config;
use crate::enums::{OutputFormat, Processor};
use crate::error::{Error, Result};
use crate::metadata::ImageMetadata;
use crate::normalizer::PixelNormalizer;
use crate::series_scanner::SeriesScanner;
use crate::session::UploadSession;
use crate::window_level::{WindowLevel, WindowLevelCalculator};

pub enum ImageSource<'a> {
    Bytes(&'a [u8]),
    Path(&'a Path),
}

/// Encoded raster plus the metadata of the file it came from
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub encoded: Vec<u8>,
    pub metadata: ImageMetadata,
}

/// Position of one file in a series listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Derived window center of the file
    #[serde(rename = "instanceNumber")]
    pub ordering_key: f64,
    #[serde(rename = "seriesDescription")]
    pub series_description: String,
}

#[derive(Debug, Clone)]
pub struct SeriesListing {
    /// First file of the series, fully rendered
    pub first_image: ProcessedImage,
    pub files: Vec<FileEntry>,
}

/// Decode, window, normalize and encode image files
pub struct ImagingPipeline<D = DicomDecoder> {
    decoder: D,
    format: OutputFormat,
    processor: Processor,
}

impl ImagingPipeline<DicomDecoder> {
    pub fn new(config: &Config) -> Self {
        Self::with_decoder(DicomDecoder, config)
    }
}

impl<D: FrameDecoder> ImagingPipeline<D> {
    pub fn with_decoder(decoder: D, config: &Config) -> Self {
        Self {
            decoder,
            format: config.output_format,
            processor: config.processor,
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    /// Render one file with its default window
    pub fn process_one(&self, source: ImageSource<'_>) -> Result<ProcessedImage> {
        let decoded = match source {
            ImageSource::Bytes(bytes) => self.decoder.decode(bytes)?,
            ImageSource::Path(path) => self.decoder.decode_file(path)?,
        };
        let window = Self::default_window(&decoded)?;
        self.render_decoded(decoded, window)
    }

    /// Describe every file of the session in series order and render the first one
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the session holds no recognized files,
    /// or the first error hit while decoding any of them
    pub fn list_series(&self, session: &UploadSession) -> Result<SeriesListing> {
        let paths = SeriesScanner::scan(&session.directory)?;
        if paths.is_empty() {
            return Err(Error::NotFound(format!(
                "No DICOM files found in session {}",
                session.id
            )));
        }

        let total = paths.len();
        let done = AtomicUsize::new(0);
        let describe = |index: usize, path: &PathBuf| {
            let result = self.describe(index, path);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            info!(
                "Processing progress: {:.1}%",
                finished as f64 / total as f64 * 100.0
            );
            result
        };

        // Indexed collection keeps scanner order regardless of completion order.
        let described: Vec<(FileEntry, Option<ProcessedImage>)> = match self.processor {
            Processor::Sequential => paths
                .iter()
                .enumerate()
                .map(|(index, path)| describe(index, path))
                .collect::<Result<_>>()?,
            Processor::Parallel => paths
                .par_iter()
                .enumerate()
                .map(|(index, path)| describe(index, path))
                .collect::<Result<_>>()?,
        };

        let mut first_image = None;
        let mut files = Vec::with_capacity(total);
        for (entry, rendered) in described {
            if rendered.is_some() {
                first_image = rendered;
            }
            files.push(entry);
        }
        let first_image = first_image
            .ok_or_else(|| Error::Session("first file of the series was not rendered".into()))?;

        info!("Successfully processed all {total} files");
        Ok(SeriesListing { first_image, files })
    }

    /// Re-render a stored file with a caller-supplied window
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] for a non-positive width and
    /// [`Error::NotFound`] if the file does not exist
    pub fn render(&self, path: &Path, center: f64, width: f64) -> Result<Vec<u8>> {
        let window = WindowLevel::new(center, width)?;
        let decoded = self.decoder.decode_file(path)?;
        let pixels = PixelNormalizer::apply(&decoded.grid, window)?;
        encode(&pixels, self.format)
    }

    fn describe(&self, index: usize, path: &Path) -> Result<(FileEntry, Option<ProcessedImage>)> {
        debug!("Processing file: {}", path.display());
        let decoded = self.decoder.decode_file(path)?;
        let window = Self::default_window(&decoded)?;
        let entry = FileEntry {
            path: path.to_path_buf(),
            ordering_key: window.center,
            series_description: decoded.fields.series_description.clone(),
        };
        let rendered = if index == 0 {
            Some(self.render_decoded(decoded, window)?)
        } else {
            None
        };
        Ok((entry, rendered))
    }

    fn default_window(decoded: &DecodedImage) -> Result<WindowLevel> {
        let window = WindowLevelCalculator::compute_default(&decoded.grid)?;
        let (height, width) = decoded.grid.dim();
        debug!("Image dimensions: {width}x{height}");
        debug!(
            "Calculated WindowWidth: {}, WindowCenter: {}",
            window.width, window.center
        );
        Ok(window)
    }

    fn render_decoded(&self, decoded: DecodedImage, window: WindowLevel) -> Result<ProcessedImage> {
        let pixels = PixelNormalizer::apply(&decoded.grid, window)?;
        let encoded = encode(&pixels, self.format)?;
        let metadata = ImageMetadata::new(decoded.fields, &decoded.grid, window);
        Ok(ProcessedImage { encoded, metadata })
    }
}
