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
fn luminance_weights_sum_to_one() {
    assert!((luminance(1.0, 1.0, 1.0) - 1.0).abs() < 1e-6);
    assert_eq!(luminance(0.0, 0.0, 0.0), 0.0);
}

#[test]
fn premultiply_zero_alpha_clears_color() {
    let mut px = vec![200u8, 100, 50, 0, 255, 255, 255, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0, 255, 255, 255, 255]);
}

#[test]
fn unpremultiply_recovers_straight_color() {
    let [r, g, b, a] = unpremultiply_px(&[128, 0, 64, 128]);
    assert!((r - 1.0).abs() < 0.01);
    assert_eq!(g, 0.0);
    assert!((b - 0.5).abs() < 0.01);
    assert!((a - 128.0 / 255.0).abs() < 1e-6);
}
