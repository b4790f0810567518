use byteorder::{ByteOrder, LittleEndian};

use crate::hash::normalize_name;

/// Number of leading state bytes used to unmask a file record.
pub const MASK_LEN: usize = 12;

/// Per-file RC4 key schedule.
///
/// The 12-byte record mask is captured from the freshly scheduled state at
/// construction, before any keystream is drawn, so it stays valid no matter
/// how much of the payload has been decrypted since.
#[derive(Clone)]
pub struct FileKey {
    state: [u8; 256],
    i:     u8,
    j:     u8,
    mask:  [u32; 3],
}

impl FileKey {
    /// Schedule the key for `name` (lowercased, single-byte encoded).
    pub fn new(name: &str) -> Self {
        Self::from_key(&normalize_name(name))
    }

    /// Schedule from raw key bytes. An empty key schedules as a single zero byte.
    pub fn from_key(key: &[u8]) -> Self {
        let mut state = [0u8; 256];
        for (i, s) in state.iter_mut().enumerate() {
            *s = i as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            let k = if key.is_empty() { 0 } else { key[i % key.len()] };
            j = j.wrapping_add(state[i]).wrapping_add(k);
            state.swap(i, j as usize);
        }

        let mut mask = [0u32; 3];
        LittleEndian::read_u32_into(&state[..MASK_LEN], &mut mask);

        Self { state, i: 0, j: 0, mask }
    }

    /// XOR masks for the `file_offset`, `uncompressed_size` and
    /// `compressed_size` record fields, in that order.
    pub fn mask(&self) -> [u32; 3] {
        self.mask
    }

    /// XOR the next `buf.len()` keystream bytes into `buf`, advancing the cursors.
    pub fn apply_keystream(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.state[self.i as usize]);
            self.state.swap(self.i as usize, self.j as usize);
            let idx = self.state[self.i as usize].wrapping_add(self.state[self.j as usize]);
            *byte ^= self.state[idx as usize];
        }
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKey")
            .field("i", &self.i)
            .field("j", &self.j)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classic_rc4_vector() {
        let mut key = FileKey::from_key(b"Key");
        let mut data = *b"Plaintext";
        key.apply_keystream(&mut data);
        assert_eq!(hex::encode(data), "bbf316e8d940af0ad3");
    }

    #[test]
    fn mask_comes_from_scheduled_state() {
        let key = FileKey::new("data/foo.bin");
        assert_eq!(key.mask(), [0xA03C_63E4, 0x6622_3ED3, 0xB66B_CA5F]);
    }

    #[test]
    fn mask_survives_keystream_use() {
        let mut key = FileKey::new("data/foo.bin");
        let before = key.mask();
        key.apply_keystream(&mut [0u8; 64]);
        assert_eq!(key.mask(), before);
    }

    #[test]
    fn name_is_lowercased() {
        let mut lower = FileKey::new("data/foo.bin");
        let mut mixed = FileKey::new("Data/FOO.bin");
        assert_eq!(lower.mask(), mixed.mask());

        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        lower.apply_keystream(&mut a);
        mixed.apply_keystream(&mut b);
        assert_eq!(hex::encode(a), "a4c2cf27ba55324a27a9844e750396a6");
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn keystream_continues_across_segments(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            split in 0usize..2048,
        ) {
            let split = split.min(data.len());

            let mut whole = data.clone();
            FileKey::new("seg/test.dat").apply_keystream(&mut whole);

            let mut pieces = data.clone();
            let mut key = FileKey::new("seg/test.dat");
            let (head, tail) = pieces.split_at_mut(split);
            key.apply_keystream(head);
            key.apply_keystream(tail);

            prop_assert_eq!(whole, pieces);
        }
    }
}
