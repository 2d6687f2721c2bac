/// Extracts the inclusive bit range `[END:START]` of `n`, shifted down to bit 0.
pub const fn get_bits<const START: usize, const END: usize>(n: u16) -> u16 {
    assert!(
        END <= 15 && START <= END,
        "start and end bits out of bounds"
    );
    let mask = u16::MAX >> (15 - (END - START));
    (n >> START) & mask
}

/// Sign-extends the low `NUM_BITS` bits of `n` to a full 16-bit two's-complement value.
/// Anything above bit `NUM_BITS - 1` is ignored.
pub const fn sign_extend<const NUM_BITS: usize>(n: u16) -> i16 {
    assert!(NUM_BITS >= 1 && NUM_BITS <= 16);
    ((n << (16 - NUM_BITS)) as i16) >> (16 - NUM_BITS)
}
