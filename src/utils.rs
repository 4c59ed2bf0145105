pub const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Returns how many leading bytes of `slice` continue a UTF-8 BOM of which
/// `matched` bytes were already seen.
#[inline]
pub fn match_bom(matched: usize, slice: &[u8]) -> usize {
    UTF8_BOM[matched..]
        .iter()
        .zip(slice)
        .take_while(|(expected, byte)| expected == byte)
        .count()
}

#[inline]
pub fn trim_trailing_cr(line: &[u8]) -> &[u8] {
    match line.split_last() {
        Some((b'\r', rest)) => rest,
        _ => line,
    }
}
