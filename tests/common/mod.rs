//! Builds encrypted containers for the integration tests by applying the
//! inverse of each read-side layer.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;

use bbfs::crypto::DELTA;
use bbfs::{CipherKey, FileKey, FormatProfile, BLOCK_SIZE, MAGIC};
use flate2::{write::ZlibEncoder, Compression};
use tempfile::NamedTempFile;

pub const ARCHIVE_KEY: CipherKey = [0x1A2B_3C4D, 0x5E6F_7081, 0x92A3_B4C5, 0xD6E7_F809];
pub const TOC_KEY: CipherKey = [0x0BAD_F00D, 0xDEAD_BEEF, 0xCAFE_BABE, 0x8BAD_F00D];

const HEADER_SIZE: usize = 20;
const LEAF: u16 = 0x0008;
const NON_LEAF: u16 = 0x0002;

pub fn test_profile() -> FormatProfile {
    FormatProfile::new(ARCHIVE_KEY, TOC_KEY)
}

/// Content of the `data/foo.bin` reference file.
pub fn scenario_a_content() -> Vec<u8> {
    (0..768usize).map(|i| (i * 7 + i / 13) as u8).collect()
}

pub const SCENARIO_A_BLAKE3: &str = "86d9510f0c2c1291e00044ea7c7a4573a564fd126da0cb4a000c447858a78946";

#[derive(Debug, Clone)]
pub struct FixtureFile {
    pub name:       String,
    pub data:       Vec<u8>,
    pub compressed: bool,
    /// Absolute payload position; placed after the previous payload if unset.
    pub offset:     Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltFile {
    pub file_offset:       u32,
    pub uncompressed_size: u32,
    pub compressed_size:   u32,
}

pub struct Fixture {
    pub file:       NamedTempFile,
    pub bytes:      Vec<u8>,
    pub toc_length: usize,
    pub files:      BTreeMap<String, BuiltFile>,
}

pub struct ContainerBuilder {
    profile:        FormatProfile,
    hash_size:      usize,
    files:          Vec<FixtureFile>,
    fillers:        bool,
    magic:          u32,
    version:        i32,
    raw_toc_length: Option<i32>,
    min_blocks:     usize,
}

impl ContainerBuilder {
    pub fn new(profile: FormatProfile) -> Self {
        Self {
            profile,
            hash_size: 7,
            files: Vec::new(),
            fillers: true,
            magic: MAGIC,
            version: 3,
            raw_toc_length: None,
            min_blocks: 0,
        }
    }

    pub fn hash_size(mut self, n: usize) -> Self {
        self.hash_size = n;
        self
    }

    /// Put a non-leaf entry in front of every leaf.
    pub fn fillers(mut self, on: bool) -> Self {
        self.fillers = on;
        self
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn raw_toc_length(mut self, raw: i32) -> Self {
        self.raw_toc_length = Some(raw);
        self
    }

    pub fn min_blocks(mut self, n: usize) -> Self {
        self.min_blocks = n;
        self
    }

    pub fn compressed(mut self, name: &str, data: Vec<u8>) -> Self {
        self.files.push(FixtureFile { name: name.into(), data, compressed: true, offset: None });
        self
    }

    pub fn stored(mut self, name: &str, data: Vec<u8>) -> Self {
        self.files.push(FixtureFile { name: name.into(), data, compressed: false, offset: None });
        self
    }

    pub fn file(mut self, file: FixtureFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn build(self) -> Fixture {
        let p = &self.profile;

        // ── Layout ───────────────────────────────────────────────────────────
        let mut by_bucket: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, f) in self.files.iter().enumerate() {
            let bucket = p.bucket_hash(&f.name) as usize % self.hash_size;
            by_bucket.entry(bucket).or_default().push(i);
        }

        let filler_len = 24 + 2 * 4;
        let leaf_len = 24 + 4;
        let per_leaf = leaf_len + if self.fillers { filler_len } else { 0 };
        let entries_at = HEADER_SIZE + 4 + 8 * self.hash_size;
        let toc_length = entries_at + per_leaf * self.files.len();

        let mut cursor = toc_length.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        let mut payloads = Vec::new();
        let mut built = BTreeMap::new();
        for f in &self.files {
            let payload = if f.compressed {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(&f.data).unwrap();
                let mut z = enc.finish().unwrap();
                FileKey::new(&f.name).apply_keystream(&mut z);
                z
            } else {
                f.data.clone()
            };
            let at = f.offset.map_or(cursor, |o| o as usize);
            assert!(at >= toc_length, "payload of {} overlaps the TOC", f.name);
            cursor = at + payload.len();
            built.insert(
                f.name.clone(),
                BuiltFile {
                    file_offset:       at as u32,
                    uncompressed_size: f.data.len() as u32,
                    compressed_size:   payload.len() as u32,
                },
            );
            payloads.push((at, payload));
        }

        let blocks = cursor.div_ceil(BLOCK_SIZE).max(self.min_blocks).max(1);
        let mut img = vec![0u8; blocks * BLOCK_SIZE];
        for (at, payload) in &payloads {
            img[*at..*at + payload.len()].copy_from_slice(payload);
        }

        // ── Header and TOC ───────────────────────────────────────────────────
        let raw = self.raw_toc_length.unwrap_or(toc_length as i32 | i32::MIN);
        put_u32(&mut img, 0, self.magic);
        put_u32(&mut img, 4, self.version as u32);
        put_u32(&mut img, 8, raw as u32);
        put_u32(&mut img, 12, self.files.len() as u32);
        put_u32(&mut img, HEADER_SIZE, self.hash_size as u32);

        let mut at = entries_at;
        for (bucket, members) in &by_bucket {
            let slot = HEADER_SIZE + 4 + 8 * bucket;
            let count = members.len() * if self.fillers { 2 } else { 1 };
            put_u32(&mut img, slot, at as u32);
            put_u32(&mut img, slot + 4, count as u32);

            for &i in members {
                let f = &self.files[i];
                if self.fillers {
                    put_u16(&mut img, at, NON_LEAF);
                    put_u16(&mut img, at + 2, 2);
                    // Non-leaves never have their checksum compared, even
                    // when the bytes happen to match.
                    img[at + 16..at + 24].copy_from_slice(&p.entry_hash(&f.name).to_le_bytes());
                    img[at + 24..at + 32].fill(0xCC);
                    at += filler_len;
                }
                let b = built[&f.name];
                let mask = FileKey::new(&f.name).mask();
                let flags = LEAF | if f.compressed { p.compressed_flag } else { 0 };
                put_u16(&mut img, at, flags);
                put_u16(&mut img, at + 2, 1);
                put_u32(&mut img, at + 4, b.file_offset ^ mask[0]);
                put_u32(&mut img, at + 8, b.uncompressed_size ^ mask[1]);
                put_u32(&mut img, at + 12, b.compressed_size ^ mask[2]);
                img[at + 16..at + 24].copy_from_slice(&p.entry_hash(&f.name).to_le_bytes());
                put_u32(&mut img, at + 24, 0xA5A5_A5A5);
                at += leaf_len;
            }
        }
        assert_eq!(at, toc_length);

        // ── Cipher layers, innermost first ───────────────────────────────────
        encrypt_toc(&mut img[HEADER_SIZE..toc_length], &p.toc_key);
        for block in img.chunks_mut(BLOCK_SIZE) {
            encrypt_archive_block(block, &p.archive_key);
        }

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&img).unwrap();
        file.flush().unwrap();
        Fixture { file, bytes: img, toc_length, files: built }
    }
}

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn word(buf: &[u8], i: usize) -> u32 {
    u32::from_le_bytes(buf[i * 4..i * 4 + 4].try_into().unwrap())
}

fn mix(sum: u32, y: u32, z: u32, k: u32) -> u32 {
    ((sum ^ y).wrapping_add(z ^ k)) ^ (((y << 2) ^ (z >> 5)).wrapping_add((y >> 3) ^ (z << 4)))
}

/// Standard Corrected Block TEA encryption.
pub fn encrypt_toc(buf: &mut [u8], key: &CipherKey) {
    let n = buf.len() / 4;
    if n < 2 {
        return;
    }
    let mut v: Vec<u32> = (0..n).map(|i| word(buf, i)).collect();
    let rounds = 6 + 52 / n;
    let mut sum = 0u32;
    let mut z = v[n - 1];
    for _ in 0..rounds {
        sum = sum.wrapping_add(DELTA);
        let e = ((sum >> 2) & 3) as usize;
        for p in 0..n - 1 {
            let y = v[p + 1];
            v[p] = v[p].wrapping_add(mix(sum, y, z, key[(p & 3) ^ e]));
            z = v[p];
        }
        let y = v[0];
        v[n - 1] = v[n - 1].wrapping_add(mix(sum, y, z, key[((n - 1) & 3) ^ e]));
        z = v[n - 1];
    }
    for (i, w) in v.iter().enumerate() {
        put_u32(buf, i * 4, *w);
    }
}

/// Inverse of the single-round archive layer.
pub fn encrypt_archive_block(buf: &mut [u8], key: &CipherKey) {
    let n = buf.len() / 4;
    if n < 2 {
        return;
    }
    let plain: Vec<u32> = (0..n).map(|i| word(buf, i)).collect();
    let last = n - 1;
    let mut c = vec![0u32; n];
    c[last] = plain[last].wrapping_add(mix(DELTA, plain[last - 1], plain[0], key[(last ^ 0xFE) & 3]));
    for i in (0..last).rev() {
        let prev = if i == 0 { c[last] } else { plain[i - 1] };
        c[i] = plain[i].wrapping_add(mix(DELTA, prev, c[i + 1], key[(i ^ 0xFE) & 3]));
    }
    for (i, w) in c.iter().enumerate() {
        put_u32(buf, i * 4, *w);
    }
}

/// A name whose bucket holds none of `used`.
pub fn name_in_empty_bucket(profile: &FormatProfile, hash_size: usize, used: &[&str]) -> String {
    let taken: Vec<usize> = used
        .iter()
        .map(|n| profile.bucket_hash(n) as usize % hash_size)
        .collect();
    (0..)
        .map(|i| format!("absent/{i}.bin"))
        .find(|n| !taken.contains(&(profile.bucket_hash(n) as usize % hash_size)))
        .unwrap()
}
