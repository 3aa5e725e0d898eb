use zerocopy::{
    byteorder::{BigEndian, U16, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

/*
 * https://cdn.kernel.org/pub/linux/utils/cryptsetup/LUKS_docs/on-disk-format.pdf
 */

pub(crate) const LUKS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "crypto_LUKS",
    usage: UsageFlags::CRYPTO,
    probe_fn: Some(probe_luks),
    magics: &[ProbeMagic {
        magic: b"LUKS\xba\xbe",
        kb_offset: 0,
        sb_offset: 0,
    }],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct LuksHeader {
    magic: [u8; 6],
    version: U16<BigEndian>,
    cipher_name: [u8; 32],
    cipher_mode: [u8; 32],
    hash_spec: [u8; 32],
    payload_offset: U32<BigEndian>,
    key_bytes: U32<BigEndian>,
    mk_digest: [u8; 20],
    mk_digest_salt: [u8; 32],
    mk_digest_iterations: U32<BigEndian>,
    uuid: [u8; 40],
}

fn probe_luks(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let header: LuksHeader = probe.read_as(0)?;

    if header.version.get() != 1 {
        return Err(ProbeError::Invalid("unsupported LUKS header version"));
    }

    // the uuid is stored as NUL-terminated ASCII text
    let end = header
        .uuid
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(header.uuid.len());
    let text = std::str::from_utf8(&header.uuid[..end])
        .map_err(|_| ProbeError::Invalid("LUKS uuid is not ASCII"))?;

    probe.set_uuid_str(&header.uuid, text)?;
    probe.set_version(&format!("{}", header.version.get()))?;
    return Ok(());
}
