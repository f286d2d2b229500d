//! PNG rendering of a QRIS payload as a `data:` URL.

use crate::error::{QrisError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;

/// Side of the rendered image, in pixels.
pub const IMAGE_WIDTH: u32 = 480;
/// Light border around the symbol, in modules.
pub const MARGIN_MODULES: usize = 2;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Renders `payload` as a square black-on-white PNG and returns it as a
/// base64 `data:` URL.
pub fn png_data_url(payload: &str) -> Result<String> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| QrisError::InvalidPayload(format!("cannot encode QR symbol: {}", e)))?;
    let modules = code.width();
    let colors = code.to_colors();
    let span = modules + 2 * MARGIN_MODULES;

    let image = GrayImage::from_fn(IMAGE_WIDTH, IMAGE_WIDTH, |x, y| {
        let col = x as usize * span / IMAGE_WIDTH as usize;
        let row = y as usize * span / IMAGE_WIDTH as usize;
        let dark = (MARGIN_MODULES..MARGIN_MODULES + modules).contains(&col)
            && (MARGIN_MODULES..MARGIN_MODULES + modules).contains(&row)
            && colors[(row - MARGIN_MODULES) * modules + (col - MARGIN_MODULES)] == Color::Dark;
        Luma([if dark { 0 } else { 255 }])
    });

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| QrisError::InternalError(Box::new(e)))?;

    Ok(format!("{}{}", DATA_URL_PREFIX, b64.encode(png)))
}
