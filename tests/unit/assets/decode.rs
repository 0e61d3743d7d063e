use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let prepared = decode_image(&png_bytes(1, 1, vec![100, 50, 200, 128])).unwrap();
    assert_eq!((prepared.width, prepared.height), (1, 1));
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn malformed_bytes_are_asset_load_errors() {
    let err = decode_image(b"definitely not a png").unwrap_err();
    assert!(matches!(err, ComposerError::AssetLoad(_)));
}

#[test]
fn missing_file_is_asset_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_image_file(&dir.path().join("nope.png")).unwrap_err();
    assert!(matches!(err, ComposerError::AssetLoad(_)));
}

#[test]
fn buffer_length_is_checked() {
    assert!(PreparedImage::from_premul_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(PreparedImage::from_premul_rgba8(0, 2, Vec::new()).is_err());
    let img = PreparedImage::solid(2, 3, [255, 255, 255, 255]).unwrap();
    assert_eq!(img.rgba8_premul.len(), 24);
}
