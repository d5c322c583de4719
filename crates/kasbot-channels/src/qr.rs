//! QR rendering for pairing codes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use kasbot_core::error::KasbotError;

/// Generate a QR code as PNG image bytes.
pub fn generate_qr_image(qr_data: &str) -> Result<Vec<u8>, KasbotError> {
    use image::{ImageBuffer, Luma};
    use qrcode::{Color, EcLevel, QrCode};

    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::M)
        .map_err(|e| KasbotError::Transport(format!("QR generation failed: {e}")))?;

    let module_size: u32 = 8;
    let quiet_zone: u32 = 4;
    let modules = code.width() as u32;
    let img_size = (modules + quiet_zone * 2) * module_size;

    let img = ImageBuffer::from_fn(img_size, img_size, |x, y| {
        let (cx, cy) = (x / module_size, y / module_size);
        if cx < quiet_zone || cy < quiet_zone {
            return Luma([255u8]);
        }
        let (mx, my) = (cx - quiet_zone, cy - quiet_zone);
        if mx >= modules || my >= modules {
            return Luma([255u8]);
        }
        match code[(mx as usize, my as usize)] {
            Color::Dark => Luma([0u8]),
            Color::Light => Luma([255u8]),
        }
    });

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| KasbotError::Transport(format!("PNG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

/// Render a pairing code as a `data:image/png;base64,...` URL, ready for an `<img>` tag.
pub fn qr_data_url(qr_data: &str) -> Result<String, KasbotError> {
    let png = generate_qr_image(qr_data)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
}
