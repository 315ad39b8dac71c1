//! MNIST IDX file reader
//!
//! Images are stored as big-endian `magic, count, rows, cols` followed by one
//! byte per pixel; labels as `magic, count` followed by one byte per label.
//! Pixels are scaled into [0, 1] by dividing by 255.

use crate::error::DatasetError;
use crate::tensor::Tensor;
use log::debug;
use std::fs;

pub const IMAGE_MAGIC: u32 = 0x0000_0803;
pub const LABEL_MAGIC: u32 = 0x0000_0801;

/// Number of digit classes a label may name.
pub const NUM_CLASSES: usize = 10;

/// One normalized image and its class.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImage {
    pub image: Tensor,
    pub label: usize,
}

// Read a big-endian u32 and advance the byte offset (IDX format uses BE).
fn read_be_u32(data: &[u8], offset: &mut usize) -> Result<u32, DatasetError> {
    let end = *offset + 4;
    let bytes = data.get(*offset..end).ok_or(DatasetError::Truncated {
        needed: end,
        available: data.len(),
    })?;
    *offset = end;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

// End offset of `count` records of `record_size` bytes after the header.
// Header values come straight from the file, so overflow means it cannot fit.
fn body_end(data: &[u8], offset: usize, count: usize, record_size: usize) -> Result<usize, DatasetError> {
    count
        .checked_mul(record_size)
        .and_then(|body| body.checked_add(offset))
        .ok_or(DatasetError::Truncated {
            needed: usize::MAX,
            available: data.len(),
        })
}

fn check_magic(expected: u32, found: u32) -> Result<(), DatasetError> {
    if found != expected {
        return Err(DatasetError::BadMagic { expected, found });
    }
    Ok(())
}

/// Parse an IDX image file into `rows x cols` tensors scaled to [0, 1].
pub fn parse_images(data: &[u8]) -> Result<Vec<Tensor>, DatasetError> {
    let mut offset = 0usize;
    check_magic(IMAGE_MAGIC, read_be_u32(data, &mut offset)?)?;
    let count = read_be_u32(data, &mut offset)? as usize;
    let rows = read_be_u32(data, &mut offset)? as usize;
    let cols = read_be_u32(data, &mut offset)? as usize;

    let image_size = match rows.checked_mul(cols) {
        Some(size) if size > 0 => size,
        _ => return Err(DatasetError::InvalidDimensions { rows, cols }),
    };
    let needed = body_end(data, offset, count, image_size)?;
    if data.len() < needed {
        return Err(DatasetError::Truncated {
            needed,
            available: data.len(),
        });
    }

    data[offset..needed]
        .chunks_exact(image_size)
        .map(|pixels| -> Result<Tensor, DatasetError> {
            let raw: Vec<f64> = pixels.iter().map(|&p| p as f64).collect();
            let mut image = Tensor::from_vec(raw, [rows, cols])?;
            image.normalize_with(255.0);
            Ok(image)
        })
        .collect()
}

/// Parse an IDX label file.
pub fn parse_labels(data: &[u8]) -> Result<Vec<u8>, DatasetError> {
    let mut offset = 0usize;
    check_magic(LABEL_MAGIC, read_be_u32(data, &mut offset)?)?;
    let count = read_be_u32(data, &mut offset)? as usize;

    let needed = body_end(data, offset, count, 1)?;
    if data.len() < needed {
        return Err(DatasetError::Truncated {
            needed,
            available: data.len(),
        });
    }
    Ok(data[offset..needed].to_vec())
}

/// Pair parsed images with their labels.
pub fn pair(images: Vec<Tensor>, labels: Vec<u8>) -> Result<Vec<LabeledImage>, DatasetError> {
    if images.len() != labels.len() {
        return Err(DatasetError::CountMismatch {
            images: images.len(),
            labels: labels.len(),
        });
    }

    images
        .into_iter()
        .zip(labels)
        .enumerate()
        .map(|(index, (image, label))| {
            if label as usize >= NUM_CLASSES {
                return Err(DatasetError::InvalidLabel { index, label });
            }
            Ok(LabeledImage {
                image,
                label: label as usize,
            })
        })
        .collect()
}

fn read_file(path: &str) -> Result<Vec<u8>, DatasetError> {
    fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_string(),
        source,
    })
}

/// Load an image file and its label file.
pub fn load_dataset(images_path: &str, labels_path: &str) -> Result<Vec<LabeledImage>, DatasetError> {
    let images = parse_images(&read_file(images_path)?)?;
    let labels = parse_labels(&read_file(labels_path)?)?;
    if let Some(first) = images.first() {
        debug!(
            "{}: {} images of {}x{}",
            images_path,
            images.len(),
            first.rows(),
            first.cols()
        );
    }
    pair(images, labels)
}
