//! # DICOM-windowing library
//!
//! This crate turns grayscale DICOM images into displayable 8-bit rasters
//! and manages short-lived upload sessions holding a series of such files.
//!
//! It builds on the dicom-rs ecosystem for parsing and pixel decoding and on
//! `image` for encoding. The pieces are:
//!  - [`WindowLevelCalculator`]: default window spanning the value range of
//!    an image, clamped to width `[1, 4096]` and center `[-1024, 1024]`
//!  - [`PixelNormalizer`]: clips samples to a window and rescales them to
//!    `0..=255`
//!  - [`SeriesScanner`]: recursive search for `.dcm` files, sorted by path
//!  - [`UploadSessionStore`]: one directory per upload session, with
//!    replace-on-reupload and idempotent cleanup
//!  - [`ImagingPipeline`]: decode, window, normalize and encode, for one
//!    file or a whole session
//!  - [`Viewer`]: the entry points a transport layer calls
//!
//! Only the first frame of a file is used. Series order is the
//! lexicographic order of the stored paths, not the acquisition order.
//!
//! # Examples
//!
//! ## Listing an uploaded series
//!
//! ```no_run
//! # use dicom_windowing::{Config, UploadedFile, Viewer};
//! let config = Config::default().with_upload_root("uploads");
//! let viewer = Viewer::new(&config).expect("should have opened the upload root");
//! let files = vec![
//!     UploadedFile::new("IM0001.dcm", std::fs::read("IM0001.dcm").unwrap()),
//!     UploadedFile::new("IM0002.dcm", std::fs::read("IM0002.dcm").unwrap()),
//! ];
//! let response = viewer
//!     .scan_upload(None, &files)
//!     .expect("should have listed the uploaded series");
//! println!("{} files in session {}", response.files.len(), response.upload_id);
//! viewer.cleanup(&response.upload_id).unwrap();
//! ```

pub mod codec;
pub mod config;
pub mod enums;
pub mod error;
pub mod metadata;
pub mod normalizer;
pub mod pipeline;
pub mod pixel_grid;
pub mod series_scanner;
pub mod session;
pub mod viewer;
pub mod window_level;

pub use codec::{DecodedImage, DicomDecoder, FrameDecoder, encode};
pub use config::Config;
pub use enums::{OutputFormat, Processor};
pub use error::{Error, ErrorKind, Result};
pub use metadata::{ImageMetadata, MetadataFields};
pub use normalizer::PixelNormalizer;
pub use pipeline::{FileEntry, ImageSource, ImagingPipeline, ProcessedImage, SeriesListing};
pub use pixel_grid::PixelGrid;
pub use series_scanner::SeriesScanner;
pub use session::{UploadSession, UploadSessionStore};
pub use viewer::{UploadedFile, Viewer};
pub use window_level::{WindowLevel, WindowLevelCalculator};
