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
fn unit_weight_clamps_and_rounds() {
    assert_eq!(unit_to_u8_weight(-1.0), 0);
    assert_eq!(unit_to_u8_weight(0.3), 77);
    assert_eq!(unit_to_u8_weight(2.0), 255);
}
