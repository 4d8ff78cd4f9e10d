//! Reader for the binary PPM (P6) texture format.
//!
//! Header: three text lines (magic `P6`, then `width height`, then the
//! maximum value `255`) with `#` comment lines allowed before each. Pixel
//! data follows as
//! raw top-to-bottom RGB triples; rows are flipped on read to the
//! bottom-to-top convention the rest of the pipeline expects.

use std::path::Path;

use anyhow::{Context, Result, bail};

use super::material::TextureImage;

pub fn read_p6(path: &Path) -> Result<TextureImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("can't open texture file '{}'", path.display()))?;
    decode_p6(&bytes).with_context(|| format!("bad PPM file '{}'", path.display()))
}

pub(crate) fn decode_p6(bytes: &[u8]) -> Result<TextureImage> {
    let mut pos = 0usize;

    let magic = header_line(bytes, &mut pos)?;
    if !magic.starts_with(b"P6") {
        bail!("not a P6 file");
    }

    let dims = header_line(bytes, &mut pos)?;
    let dims = std::str::from_utf8(dims).context("dimension line is not text")?;
    let mut it = dims.split_whitespace();
    let width: u32 = it
        .next()
        .and_then(|t| t.parse().ok())
        .context("missing image width")?;
    let height: u32 = it
        .next()
        .and_then(|t| t.parse().ok())
        .context("missing image height")?;

    let maxval = header_line(bytes, &mut pos)?;
    if !maxval.starts_with(b"255") {
        bail!("unsupported bit depth (maximum value is not 255)");
    }

    let size = width as usize * height as usize * 3;
    let data = bytes
        .get(pos..pos + size)
        .context("truncated pixel data")?;

    // Stored top-to-bottom; flip to bottom-to-top.
    let row = width as usize * 3;
    let mut pixels = vec![0u8; size];
    for y in 0..height as usize {
        let src = &data[y * row..(y + 1) * row];
        let dst_y = height as usize - 1 - y;
        pixels[dst_y * row..(dst_y + 1) * row].copy_from_slice(src);
    }

    Ok(TextureImage {
        width,
        height,
        has_alpha: false,
        pixels,
    })
}

/// Returns the next newline-terminated header line, skipping `#` comments.
fn header_line<'a>(bytes: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    loop {
        let start = *pos;
        let end = bytes[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| start + i)
            .context("truncated header")?;
        *pos = end + 1;
        if !bytes[start..].starts_with(b"#") {
            return Ok(&bytes[start..end]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p6(header: &str, pixels: &[u8]) -> Vec<u8> {
        let mut bytes = header.as_bytes().to_vec();
        bytes.extend_from_slice(pixels);
        bytes
    }

    #[test]
    fn decodes_and_flips_rows() {
        // 1x2: red row on top, blue row below.
        let bytes = p6("P6\n1 2\n255\n", &[255, 0, 0, 0, 0, 255]);
        let img = decode_p6(&bytes).unwrap();
        assert_eq!((img.width, img.height), (1, 2));
        assert!(!img.has_alpha);
        // Bottom-to-top: blue first.
        assert_eq!(img.pixels, vec![0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn skips_comment_lines_in_header() {
        let bytes = p6("P6\n# made by hand\n2 1\n# maxval next\n255\n", &[0; 6]);
        let img = decode_p6(&bytes).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
    }

    #[test]
    fn rejects_wrong_magic() {
        let bytes = p6("P3\n1 1\n255\n", &[0; 3]);
        assert!(decode_p6(&bytes).is_err());
    }

    #[test]
    fn rejects_unsupported_maxval() {
        let bytes = p6("P6\n1 1\n65535\n", &[0; 3]);
        assert!(decode_p6(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_pixel_data() {
        let bytes = p6("P6\n2 2\n255\n", &[0; 5]);
        assert!(decode_p6(&bytes).is_err());
    }
}
