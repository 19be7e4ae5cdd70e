/// Server-side avatar downscaling
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// Downscale an image so its larger side is at most `max_side`
///
/// Images already within bounds are returned untouched. The result is
/// re-encoded in the source format. Data that cannot be decoded or
/// re-encoded is returned as-is.
pub fn downscale(data: Vec<u8>, max_side: u32) -> Vec<u8> {
    let decoded = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| format!("failed to inspect format: {}", e))
        .and_then(|reader| {
            let format = reader
                .format()
                .ok_or_else(|| "not a recognised image format".to_string())?;
            let img = reader
                .decode()
                .map_err(|e| format!("failed to decode: {}", e))?;
            Ok((format, img))
        });

    let (format, img) = match decoded {
        Ok(decoded) => decoded,
        Err(reason) => {
            tracing::warn!(reason = %reason, "storing avatar as-is");
            return data;
        }
    };

    if img.width().max(img.height()) <= max_side {
        return data;
    }

    // Resize preserving aspect ratio
    let resized = img.thumbnail(max_side, max_side);

    let mut buf = Vec::new();
    let encoded = match format {
        // The JPEG encoder rejects alpha channels
        ImageFormat::Jpeg => resized
            .to_rgb8()
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg),
        other => resized.write_to(&mut Cursor::new(&mut buf), other),
    };

    match encoded {
        Ok(()) => {
            tracing::debug!(
                from = data.len(),
                to = buf.len(),
                width = resized.width(),
                height = resized.height(),
                "downscaled avatar"
            );
            buf
        }
        Err(e) => {
            tracing::warn!("Failed to encode downscaled avatar: {}", e);
            data
        }
    }
}
