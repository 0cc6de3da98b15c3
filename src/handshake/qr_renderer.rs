use crate::error_handling::types::HandshakeError;
use image::Luma;
use qrcode::{EcLevel, QrCode};

/// Renders raw handshake codes into square PNG rasters.
///
/// Fixed encoding: grayscale, medium error correction, edge length taken from
/// configuration.
pub struct QrRenderer {
    width: u32,
}

impl QrRenderer {
    pub fn new(width: u32) -> Self {
        QrRenderer { width }
    }

    /// Encodes `code` as a QR image and returns the PNG bytes.
    pub fn render_png(&self, code: &str) -> Result<Vec<u8>, HandshakeError> {
        if code.is_empty() {
            return Err(HandshakeError::RenderFailed(
                "empty handshake code".to_string(),
            ));
        }

        let qr = QrCode::with_error_correction_level(code.as_bytes(), EcLevel::M)
            .map_err(|e| HandshakeError::RenderFailed(e.to_string()))?;

        let image = qr
            .render::<Luma<u8>>()
            .min_dimensions(self.width, self.width)
            .max_dimensions(self.width, self.width)
            .build();

        let mut png = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageFormat::Png,
            )
            .map_err(|e| HandshakeError::RenderFailed(e.to_string()))?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_png() {
        let renderer = QrRenderer::new(100);
        let png = renderer.render_png("2@abcdef0123456789").unwrap();
        // PNG magic bytes.
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    fn rejects_empty_code() {
        let renderer = QrRenderer::new(100);
        assert!(matches!(
            renderer.render_png(""),
            Err(HandshakeError::RenderFailed(_))
        ));
    }

    #[test]
    fn oversized_payload_fails_instead_of_panicking() {
        let renderer = QrRenderer::new(100);
        let huge = "x".repeat(8000);
        assert!(matches!(
            renderer.render_png(&huge),
            Err(HandshakeError::RenderFailed(_))
        ));
    }
}
