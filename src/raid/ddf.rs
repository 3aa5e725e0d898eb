use std::fmt::Write;

use zerocopy::{
    byteorder::{BigEndian, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const DDF_MAGIC: u32 = 0xDE11DE11;

pub(crate) const DDFRAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "ddf_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_ddf),
    magics: &[],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct DdfHeader {
    signature: U32<BigEndian>,
    crc: U32<BigEndian>,
    guid: [u8; 24],
    ddf_rev: [u8; 8],
}

fn probe_ddf(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < 0x10000 {
        return Err(ProbeError::Invalid("device too small for a ddf anchor"));
    }

    // anchor header in the last sector
    let off = ((size / 0x200) - 1) * 0x200;
    let ddf: DdfHeader = probe.read_as(off)?;

    let sig = ddf.signature.get();
    if sig != DDF_MAGIC && sig.swap_bytes() != DDF_MAGIC {
        return Err(ProbeError::Invalid("no ddf signature"));
    }

    let mut text = String::with_capacity(ddf.guid.len() * 2);
    for b in ddf.guid {
        let _ = write!(text, "{b:02x}");
    }
    probe.set_uuid_str(&ddf.guid, &text)?;

    if let Ok(rev) = std::str::from_utf8(&ddf.ddf_rev) {
        let rev = rev.trim_end_matches(['\0', ' ']);
        if !rev.is_empty() {
            probe.set_version(rev)?;
        }
    }
    return Ok(());
}
