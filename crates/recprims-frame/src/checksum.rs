//! Masked CRC-32C.
//!
//! Stored checksums are not raw CRCs. The raw CRC-32C is rotated right by
//! 15 bits and offset by a fixed constant, so that checksums of data which
//! itself embeds CRCs (or is all zeroes) do not degenerate. The transform is
//! part of the on-disk format and must stay bit-exact.

/// Constant added after rotation.
pub const MASK_DELTA: u32 = 0xA282_EAD8;

/// Standard CRC-32C (Castagnoli) of `data`.
pub fn crc32c(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// Apply the storage mask to a raw CRC.
pub fn mask(crc: u32) -> u32 {
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Recover the raw CRC from a stored (masked) value.
pub fn unmask(masked: u32) -> u32 {
    masked.wrapping_sub(MASK_DELTA).rotate_left(15)
}

/// Masked CRC-32C of `data`, as written to the stream.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    mask(crc32c(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32c_check_value() {
        assert_eq!(crc32c(b"123456789"), 0xE306_9283);
        assert_eq!(crc32c(&[0u8; 32]), 0x8A91_36AA);
    }

    #[test]
    fn mask_matches_shift_formula() {
        for crc in [0u32, 1, 0xE306_9283, 0x8A91_36AA, u32::MAX] {
            let expected = ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA);
            assert_eq!(mask(crc), expected);
        }
    }

    #[test]
    fn masked_known_vectors() {
        assert_eq!(masked_crc32c(b""), 0xA282_EAD8);
        assert_eq!(masked_crc32c(b"123456789"), 0xC78A_B0E5);
        assert_eq!(masked_crc32c(&0u64.to_le_bytes()), 0x0798_0329);
        assert_eq!(masked_crc32c(b"hello"), 0x191C_1FBB);
    }

    #[test]
    fn unmask_inverts_mask() {
        for crc in [0u32, 7, 0xDEAD_BEEF, u32::MAX] {
            assert_eq!(unmask(mask(crc)), crc);
        }
    }

    #[test]
    fn mask_changes_value() {
        let crc = crc32c(b"foo");
        assert_ne!(mask(crc), crc);
        assert_ne!(mask(mask(crc)), crc);
    }
}
