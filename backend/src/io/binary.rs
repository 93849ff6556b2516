//! Binary container
//!
//! ```text
//! offset  size  field
//! 0       4     magic "SSRC"
//! 4       2     format version (u16)
//! 6       2     reserved, zero
//! 8       8     record count (u64)
//! 16      8     max_particles (u64)
//! 24      8     seen_count (u64)
//! 32      84×n  records: r.xyz, u.xyz, E, time, wgt (f64); delayed_group, surf_id, particle (i32)
//! end-32  32    SHA-256 of every preceding byte
//! ```
//!
//! All integers and floats are little-endian.

use super::{FormatError, SourceBank, FORMAT_VERSION};
use crate::models::{ParticleType, Position, SourceSite};
use bytes::{Buf, BufMut, BytesMut};
use sha2::{Digest, Sha256};

pub const MAGIC: &[u8; 4] = b"SSRC";
pub const HEADER_SIZE: usize = 32;
pub const RECORD_SIZE: usize = 9 * 8 + 3 * 4;
pub const DIGEST_SIZE: usize = 32;

pub(super) fn encode(bank: &SourceBank) -> Vec<u8> {
    let body_len = HEADER_SIZE + RECORD_SIZE * bank.sites.len();
    let mut buf = BytesMut::with_capacity(body_len + DIGEST_SIZE);

    buf.put_slice(MAGIC);
    buf.put_u16_le(FORMAT_VERSION);
    buf.put_u16_le(0);
    buf.put_u64_le(bank.sites.len() as u64);
    buf.put_u64_le(bank.max_particles);
    buf.put_u64_le(bank.seen_count);

    for site in &bank.sites {
        put_site(&mut buf, site);
    }

    let digest = Sha256::digest(&buf[..]);
    buf.put_slice(&digest);
    buf.to_vec()
}

fn put_site(buf: &mut BytesMut, site: &SourceSite) {
    for v in site.r.to_array() {
        buf.put_f64_le(v);
    }
    for v in site.u.to_array() {
        buf.put_f64_le(v);
    }
    buf.put_f64_le(site.e);
    buf.put_f64_le(site.time);
    buf.put_f64_le(site.wgt);
    buf.put_i32_le(site.delayed_group);
    buf.put_i32_le(site.surf_id);
    buf.put_i32_le(site.particle.code());
}

pub(super) fn decode(bytes: &[u8]) -> Result<SourceBank, FormatError> {
    if bytes.len() < HEADER_SIZE + DIGEST_SIZE {
        return Err(FormatError::Truncated {
            expected: HEADER_SIZE + DIGEST_SIZE,
            actual: bytes.len(),
        });
    }

    let mut header = &bytes[..HEADER_SIZE];
    if &header[..4] != MAGIC {
        return Err(FormatError::BadMagic);
    }
    header.advance(4);
    let version = header.get_u16_le();
    if version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }
    header.advance(2);
    let count = header.get_u64_le();
    let max_particles = header.get_u64_le();
    let seen_count = header.get_u64_le();

    let expected = usize::try_from(count)
        .ok()
        .and_then(|n| n.checked_mul(RECORD_SIZE))
        .and_then(|n| n.checked_add(HEADER_SIZE + DIGEST_SIZE))
        .ok_or(FormatError::Truncated {
            expected: usize::MAX,
            actual: bytes.len(),
        })?;
    if bytes.len() < expected {
        return Err(FormatError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(FormatError::TrailingData {
            expected,
            actual: bytes.len(),
        });
    }

    let (body, digest) = bytes.split_at(expected - DIGEST_SIZE);
    if Sha256::digest(body).as_slice() != digest {
        return Err(FormatError::DigestMismatch);
    }

    let mut records = &body[HEADER_SIZE..];
    let mut sites = Vec::with_capacity(count as usize);
    for _ in 0..count {
        sites.push(get_site(&mut records)?);
    }

    Ok(SourceBank {
        max_particles,
        seen_count,
        sites,
    })
}

fn get_site(buf: &mut &[u8]) -> Result<SourceSite, FormatError> {
    let r = Position::new(buf.get_f64_le(), buf.get_f64_le(), buf.get_f64_le());
    let u = Position::new(buf.get_f64_le(), buf.get_f64_le(), buf.get_f64_le());
    let e = buf.get_f64_le();
    let time = buf.get_f64_le();
    let wgt = buf.get_f64_le();
    let delayed_group = buf.get_i32_le();
    let surf_id = buf.get_i32_le();
    let particle = ParticleType::try_from(buf.get_i32_le())?;
    Ok(SourceSite {
        r,
        u,
        e,
        time,
        wgt,
        delayed_group,
        surf_id,
        particle,
    })
}
