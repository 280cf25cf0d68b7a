use std::io::Cursor;
use std::path::Path;

use dicom::core::Tag;
use dicom::object::{DefaultDicomObject, OpenFileOptions, file::ReadPreamble};
use dicom::pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use dicom_dictionary_std::tags;
use image::error::{ImageError, ParameterError, ParameterErrorKind};
use image::{GrayImage, ImageBuffer};
use ndarray::{Array2, s};

use crate::enums::OutputFormat;
use crate::error::{Error, Result};
use crate::metadata::MetadataFields;
use crate::pixel_grid::PixelGrid;

/// Pixel grid and descriptive fields of one decoded file
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub grid: PixelGrid,
    pub fields: MetadataFields,
}

/// Turns the bytes of one image file into a [`DecodedImage`]
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage>;

    fn decode_file(&self, path: &Path) -> Result<DecodedImage> {
        let bytes = std::fs::read(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            _ => Error::Io(err),
        })?;
        self.decode(&bytes)
    }
}

/// Decoder backed by dicom-rs. Uses the first frame and the first sample
/// of every pixel, without applying a modality LUT.
#[derive(Debug, Default, Clone, Copy)]
pub struct DicomDecoder;

impl FrameDecoder for DicomDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        let object = OpenFileOptions::new()
            .read_preamble(ReadPreamble::Auto)
            .from_reader(bytes)
            .map_err(|err| Error::Decode(err.to_string()))?;

        let grid = Self::decode_grid(&object)?;
        let fields = Self::extract_fields(&object);
        Ok(DecodedImage { grid, fields })
    }
}

impl DicomDecoder {
    fn decode_grid(object: &DefaultDicomObject) -> Result<PixelGrid> {
        let pixel_data = object
            .decode_pixel_data()
            .map_err(|err| Error::Decode(err.to_string()))?;
        if pixel_data.number_of_frames() == 0 {
            return Err(Error::Decode("pixel data has no frames".to_string()));
        }

        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
        let samples: Array2<i32> = pixel_data
            .to_ndarray_with_options::<i32>(&options)
            .map_err(|err| Error::Decode(err.to_string()))?
            .slice_move(s![0, .., .., 0]);

        let bits_stored = Self::attribute_int(object, tags::BITS_STORED)
            .or_else(|| Self::attribute_int(object, tags::BITS_ALLOCATED))
            .unwrap_or(16);
        let signed = Self::attribute_int(object, tags::PIXEL_REPRESENTATION) == Some(1);

        Ok(PixelGrid::new(samples, bits_stored, signed))
    }

    fn extract_fields(object: &DefaultDicomObject) -> MetadataFields {
        MetadataFields {
            patient_name: Self::attribute_text(object, tags::PATIENT_NAME),
            patient_id: Self::attribute_text(object, tags::PATIENT_ID),
            study_date: Self::attribute_text(object, tags::STUDY_DATE),
            modality: Self::attribute_text(object, tags::MODALITY),
            series_description: Self::attribute_text(object, tags::SERIES_DESCRIPTION),
        }
    }

    fn attribute_text(object: &DefaultDicomObject, tag: Tag) -> String {
        object
            .element(tag)
            .ok()
            .and_then(|element| element.to_str().ok())
            .map(|value| {
                value
                    .trim_matches(|c: char| c.is_whitespace() || c == '\0')
                    .to_string()
            })
            .unwrap_or_default()
    }

    fn attribute_int(object: &DefaultDicomObject, tag: Tag) -> Option<u16> {
        object.element(tag).ok()?.to_int::<u16>().ok()
    }
}

/// Encode an 8-bit grid into a lossless raster container
pub fn encode(grid: &Array2<u8>, format: OutputFormat) -> Result<Vec<u8>> {
    let (height, width) = grid.dim();
    let pixels: Vec<u8> = grid.iter().copied().collect();
    let image: GrayImage = ImageBuffer::from_raw(width as u32, height as u32, pixels).ok_or(
        ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )),
    )?;

    let mut output = Vec::new();
    image.write_to(&mut Cursor::new(&mut output), format.image_format())?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_encode_png_preserves_order_and_size() {
        let grid = array![[0u8, 64, 128], [129, 200, 255]];
        let bytes = encode(&grid, OutputFormat::Png).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let decoded = image::load_from_memory(&bytes).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (3, 2));
        let values: Vec<u8> = decoded.pixels().map(|p| p.0[0]).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_encode_bmp() {
        let grid = Array2::from_elem((5, 4), 17u8);
        let bytes = encode(&grid, OutputFormat::Bmp).unwrap();
        assert_eq!(&bytes[0..2], b"BM");
        let decoded = image::load_from_memory(&bytes).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (4, 5));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let result = DicomDecoder.decode(b"definitely not a dicom file");
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = DicomDecoder.decode_file(Path::new("/nonexistent/dir/slice.dcm"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
