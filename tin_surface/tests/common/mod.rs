#![allow(dead_code)]

use std::path::Path;

/// A synthetic point record: position and classification.
#[derive(Debug, Clone, Copy)]
pub struct Rec {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub class: u8,
}

pub fn rec(x: f64, y: f64, z: f64, class: u8) -> Rec {
    Rec { x, y, z, class }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Encodes a LAS 1.4 file by hand. Formats 0-5 store the class in the low
/// five bits of byte 15; formats 6-10 in byte 16.
pub fn las_bytes(format: u8, records: &[Rec]) -> Vec<u8> {
    let record_len: u16 = if format >= 6 { 30 } else { 28 };
    let vlr_padding = 17usize;
    let point_offset = 375 + vlr_padding;
    let scale: [f64; 3] = [0.001, 0.001, 0.001];
    let offset: [f64; 3] = [1000.0, 2000.0, 0.0];

    let mut h = vec![0u8; 375];
    h[..4].copy_from_slice(b"LASF");
    h[24] = 1;
    h[25] = 4;
    h[94..96].copy_from_slice(&375u16.to_le_bytes());
    h[96..100].copy_from_slice(&(point_offset as u32).to_le_bytes());
    h[104] = format;
    h[105..107].copy_from_slice(&record_len.to_le_bytes());
    for (i, s) in scale.iter().enumerate() {
        h[131 + i * 8..139 + i * 8].copy_from_slice(&s.to_le_bytes());
    }
    for (i, o) in offset.iter().enumerate() {
        h[155 + i * 8..163 + i * 8].copy_from_slice(&o.to_le_bytes());
    }
    h[247..255].copy_from_slice(&(records.len() as u64).to_le_bytes());

    let mut out = h;
    out.extend(std::iter::repeat(0xAB).take(vlr_padding));
    for r in records {
        let mut buf = vec![0u8; record_len as usize];
        let raw = |v: f64, i: usize| (((v - offset[i]) / scale[i]).round() as i32).to_le_bytes();
        buf[0..4].copy_from_slice(&raw(r.x, 0));
        buf[4..8].copy_from_slice(&raw(r.y, 1));
        buf[8..12].copy_from_slice(&raw(r.z, 2));
        if format >= 6 {
            buf[15] = 0xFF;
            buf[16] = r.class;
        } else {
            // Synthetic, key-point and withheld flags in the high bits.
            buf[15] = 0xE0 | (r.class & 0x1F);
            buf[16] = 0xFF;
        }
        out.extend(buf);
    }
    out
}

pub fn write_las(path: &Path, format: u8, records: &[Rec]) {
    std::fs::write(path, las_bytes(format, records)).unwrap();
}

/// Regular grid of ground points with elevation `f(x, y)`.
pub fn grid(n: usize, spacing: f64, f: impl Fn(f64, f64) -> f64) -> Vec<Rec> {
    let mut out = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let x = 1000.0 + i as f64 * spacing;
            let y = 2000.0 + j as f64 * spacing;
            out.push(rec(x, y, f(x, y), 2));
        }
    }
    out
}
