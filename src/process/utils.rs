/// Coerce a finite float to a whole `u32`, rejecting fractions and negatives.
pub fn whole_u32(value: f64) -> Option<u32> {
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        None
    } else {
        Some(value as u32)
    }
}

/// Lowercase hex rendering of a digest.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
