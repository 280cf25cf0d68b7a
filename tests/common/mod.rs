#![allow(dead_code)]

use dicom_windowing::{DecodedImage, Error, FrameDecoder, MetadataFields, PixelGrid, Result};
use ndarray::Array2;

/// Plain-text stand-in for a DICOM file: the first line is the series
/// description, every following line one row of samples.
pub struct TextDecoder;

impl FrameDecoder for TextDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        let text = std::str::from_utf8(bytes).map_err(|err| Error::Decode(err.to_string()))?;
        let mut lines = text.lines();
        let description = lines
            .next()
            .ok_or_else(|| Error::Decode("missing header".into()))?;

        let rows = lines
            .map(|line| {
                line.split_whitespace()
                    .map(|v| v.parse::<i32>().map_err(|err| Error::Decode(err.to_string())))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let data = Array2::from_shape_vec((height, width), rows.concat())
            .map_err(|err| Error::Decode(err.to_string()))?;

        Ok(DecodedImage {
            grid: PixelGrid::from_i16(data),
            fields: MetadataFields {
                series_description: description.to_string(),
                modality: "CT".to_string(),
                ..Default::default()
            },
        })
    }
}

pub fn image_file(description: &str, rows: &[&[i32]]) -> Vec<u8> {
    let mut text = format!("{description}\n");
    for row in rows {
        let values: Vec<String> = row.iter().map(i32::to_string).collect();
        text.push_str(&values.join(" "));
        text.push('\n');
    }
    text.into_bytes()
}

pub fn gray_pixels(encoded: &[u8]) -> (u32, u32, Vec<u8>) {
    let image = image::load_from_memory(encoded).unwrap().into_luma8();
    let (width, height) = image.dimensions();
    (width, height, image.into_raw())
}
