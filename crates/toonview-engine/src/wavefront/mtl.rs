//! Line parser for the companion material-library (.mtl) grammar and the
//! texture decoding dispatch.
//!
//! Texture files keep the legacy convention: a `.ppm` extension (or none)
//! selects the built-in P6 reader, anything else is handed to the `image`
//! crate.

use std::path::Path;

use anyhow::{Context, Result};

use super::material::{Material, TextureImage};
use super::ppm;

pub(crate) fn load_library(
    path: &Path,
    base_dir: &Path,
    materials: &mut Vec<Material>,
) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("can't open material library '{}'", path.display()))?;
    parse_mtl_source(&source, base_dir, materials)
        .with_context(|| format!("while reading '{}'", path.display()))
}

pub(crate) fn parse_mtl_source(
    source: &str,
    base_dir: &Path,
    materials: &mut Vec<Material>,
) -> Result<()> {
    if materials.is_empty() {
        materials.push(Material::named("default"));
    }
    let mut current = 0usize;

    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let mut tokens = raw.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };

        match directive {
            "#" => {}

            "newmtl" => {
                let name = tokens
                    .next()
                    .with_context(|| format!("newmtl without a name on line {line}"))?;
                // Duplicate names reuse the existing material.
                current = match materials.iter().position(|m| m.name == name) {
                    Some(i) => i,
                    None => {
                        materials.push(Material::named(name));
                        materials.len() - 1
                    }
                };
            }

            "Ns" => {
                materials[current].shininess = tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .with_context(|| format!("malformed shininess on line {line}"))?;
            }

            "Kd" => {
                let rgb = read_rgb(&mut tokens, line, "diffuse")?;
                materials[current].diffuse[..3].copy_from_slice(&rgb);
            }

            "Ks" => {
                let rgb = read_rgb(&mut tokens, line, "specular")?;
                materials[current].specular[..3].copy_from_slice(&rgb);
            }

            "Ka" => {
                let rgb = read_rgb(&mut tokens, line, "ambient")?;
                materials[current].ambient[..3].copy_from_slice(&rgb);
            }

            "map_Kd" => {
                let name = tokens
                    .next()
                    .with_context(|| format!("map_Kd without a filename on line {line}"))?;
                let texture = load_texture(&base_dir.join(name))?;
                materials[current].texture = Some(texture);
            }

            other => {
                log::warn!("unrecognized material directive '{other}' on line {line}");
            }
        }
    }

    Ok(())
}

/// Decodes a texture file by extension: `.ppm` (or no extension) uses the
/// P6 reader, anything else the delegated image decoder.
pub(crate) fn load_texture(path: &Path) -> Result<TextureImage> {
    let legacy = match path.extension().and_then(|e| e.to_str()) {
        None => true,
        Some(ext) => ext.eq_ignore_ascii_case("ppm"),
    };
    if legacy {
        ppm::read_p6(path)
    } else {
        decode_with_image(path)
    }
}

fn decode_with_image(path: &Path) -> Result<TextureImage> {
    let img = image::open(path)
        .with_context(|| format!("can't decode texture file '{}'", path.display()))?;
    let has_alpha = img.color().has_alpha();

    // Match the P6 reader's bottom-to-top row order.
    let img = img.flipv();
    let (width, height) = (img.width(), img.height());
    let pixels = if has_alpha {
        img.to_rgba8().into_raw()
    } else {
        img.to_rgb8().into_raw()
    };

    Ok(TextureImage {
        width,
        height,
        has_alpha,
        pixels,
    })
}

fn read_rgb(
    tokens: &mut std::str::SplitWhitespace<'_>,
    line: usize,
    what: &str,
) -> Result<[f32; 3]> {
    let mut out = [0.0f32; 3];
    for slot in &mut out {
        *slot = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .with_context(|| format!("malformed {what} colour on line {line}"))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Material> {
        let mut materials = vec![Material::named("default")];
        parse_mtl_source(source, Path::new(""), &mut materials).unwrap();
        materials
    }

    #[test]
    fn newmtl_creates_and_coefficients_apply() {
        let mats = parse("newmtl brass\nNs 27.9\nKd 0.78 0.57 0.11\nKs 0.99 0.94 0.8\nKa 0.33 0.22 0.03\n");
        assert_eq!(mats.len(), 2);
        let m = &mats[1];
        assert_eq!(m.name, "brass");
        assert_eq!(m.shininess, 27.9);
        assert_eq!(m.diffuse, [0.78, 0.57, 0.11, 1.0]);
        assert_eq!(m.specular, [0.99, 0.94, 0.8, 1.0]);
        assert_eq!(m.ambient, [0.33, 0.22, 0.03, 1.0]);
    }

    #[test]
    fn duplicate_newmtl_reuses_existing_material() {
        let mats = parse("newmtl a\nKd 1 0 0\nnewmtl b\nnewmtl a\nNs 5\n");
        assert_eq!(mats.len(), 3);
        assert_eq!(mats[1].diffuse[..3], [1.0, 0.0, 0.0]);
        assert_eq!(mats[1].shininess, 5.0);
    }

    #[test]
    fn directives_before_any_newmtl_hit_the_default_material() {
        let mats = parse("Kd 0.1 0.2 0.3\n");
        assert_eq!(mats[0].diffuse[..3], [0.1, 0.2, 0.3]);
    }

    #[test]
    fn unknown_directive_is_skipped() {
        let mats = parse("newmtl a\nillum 2\nd 1.0\nNs 3\n");
        assert_eq!(mats[1].shininess, 3.0);
    }

    #[test]
    fn missing_texture_file_is_fatal() {
        let mut materials = vec![Material::named("default")];
        let err = parse_mtl_source(
            "newmtl a\nmap_Kd nope.ppm\n",
            Path::new("/nonexistent"),
            &mut materials,
        );
        assert!(err.is_err());
    }
}
