//! Image encoding: `DynamicImage` → PNG bytes.
//!
//! Base64 wrapping is left to the model client.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// A rasterised page ready to be sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPage {
    /// 1-indexed page number.
    pub page_num: usize,
    pub png: Vec<u8>,
}

/// Encode a rasterised page as PNG.
pub fn encode_page(page_num: usize, img: &DynamicImage) -> Result<EncodedPage, image::ImageError> {
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    debug!("Encoded page {} → {} bytes PNG", page_num, png.len());
    Ok(EncodedPage { page_num, png })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let page = encode_page(4, &img).expect("encode should succeed");
        assert_eq!(page.page_num, 4);
        assert_eq!(&page.png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
