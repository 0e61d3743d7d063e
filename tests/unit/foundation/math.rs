use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn premultiply_zeroes_transparent_pixels() {
    let mut px = vec![200u8, 100, 50, 0, 255, 255, 255, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0, 128, 128, 128, 128]);
}

#[test]
fn round_to_u32_rounds_half_up_and_saturates() {
    assert_eq!(round_to_u32(88.5), 89);
    assert_eq!(round_to_u32(88.49), 88);
    assert_eq!(round_to_u32(-3.0), 0);
    assert_eq!(round_to_u32(f64::NAN), 0);
}
