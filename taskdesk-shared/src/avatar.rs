/// Avatar upload validation and normalization
///
/// Uploaded images are checked for size and file extension, decoded, cropped
/// to a square and stored as a 250x250 PNG regardless of the upload format.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::avatar::{normalize, validate_upload};
///
/// # fn example(upload: Vec<u8>) -> Result<(), taskdesk_shared::avatar::AvatarError> {
/// validate_upload("me.JPG", upload.len())?;
/// let png = normalize(&upload)?;
/// # Ok(())
/// # }
/// ```

use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat, ImageReader, Limits};
use sha2::{Digest, Sha256};

/// Largest accepted upload, in bytes
pub const MAX_AVATAR_BYTES: usize = 1_000_000;

/// Edge length of the stored square avatar, in pixels
pub const AVATAR_DIMENSION: u32 = 250;

/// File extensions accepted for upload (compared case-insensitively)
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Largest accepted source width or height, in pixels
pub const MAX_SOURCE_DIMENSION: u32 = 6000;

/// Content type of every stored avatar
pub const AVATAR_CONTENT_TYPE: &str = "image/png";

/// Error type for avatar processing
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    /// Upload exceeds [`MAX_AVATAR_BYTES`]
    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    /// Filename does not end in an allowed extension
    #[error("Please upload an image (jpg, jpeg or png)")]
    UnsupportedType,

    /// Upload is empty
    #[error("No file uploaded")]
    Empty,

    /// Bytes could not be decoded as an image
    #[error("Could not decode image: {0}")]
    Decode(String),

    /// Re-encoding as PNG failed
    #[error("Could not encode avatar: {0}")]
    Encode(String),
}

impl AvatarError {
    /// Whether the error is the client's fault (as opposed to an encoder failure)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AvatarError::Encode(_))
    }
}

/// Checks an upload's filename and size before decoding
pub fn validate_upload(filename: &str, size: usize) -> Result<(), AvatarError> {
    if size == 0 {
        return Err(AvatarError::Empty);
    }

    if size > MAX_AVATAR_BYTES {
        return Err(AvatarError::TooLarge {
            size,
            max: MAX_AVATAR_BYTES,
        });
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or(AvatarError::UnsupportedType)?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AvatarError::UnsupportedType);
    }

    Ok(())
}

/// Decodes an uploaded image and re-encodes it as a 250x250 PNG
///
/// The image is center-cropped to a square and then scaled, so the aspect
/// ratio is never distorted. Sources wider or taller than
/// [`MAX_SOURCE_DIMENSION`] are rejected before any pixels are allocated.
pub fn normalize(bytes: &[u8]) -> Result<Vec<u8>, AvatarError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SOURCE_DIMENSION);
    limits.max_image_height = Some(MAX_SOURCE_DIMENSION);
    limits.max_alloc = Some(u64::from(MAX_SOURCE_DIMENSION).pow(2) * 4);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AvatarError::Decode(e.to_string()))?;
    reader.limits(limits);

    let image = reader
        .decode()
        .map_err(|e| AvatarError::Decode(e.to_string()))?;

    // Crop before scaling so extreme aspect ratios never blow up the buffer
    let side = image.width().min(image.height());
    let square = image.crop_imm(
        (image.width() - side) / 2,
        (image.height() - side) / 2,
        side,
        side,
    );
    let resized = square.resize_exact(AVATAR_DIMENSION, AVATAR_DIMENSION, FilterType::Lanczos3);

    let mut png = Cursor::new(Vec::new());
    resized
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| AvatarError::Encode(e.to_string()))?;

    Ok(png.into_inner())
}

/// Runs [`normalize`] on the blocking thread pool
///
/// Decoding and resampling a megabyte-sized JPEG takes long enough to stall
/// the async executor.
pub async fn normalize_blocking(bytes: Vec<u8>) -> Result<Vec<u8>, AvatarError> {
    tokio::task::spawn_blocking(move || normalize(&bytes))
        .await
        .map_err(|e| AvatarError::Encode(format!("image task failed: {}", e)))?
}

/// Strong entity tag for a stored avatar
pub fn etag(png: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(png)))
}
