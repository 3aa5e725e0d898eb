use zerocopy::{
    byteorder::{LittleEndian, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const SILICON_MAGIC: u32 = 0x2F000000;

pub(crate) const SILRAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "silicon_medley_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_silicon),
    magics: &[],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct SiliconMetadata {
    unknown0: [u8; 0x2E],
    ascii_version: [u8; 8],
    diskname: [u8; 32],
    unknown1: [u8; 10],
    magic: U32<LittleEndian>,
}

fn probe_silicon(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < 0x10000 {
        return Err(ProbeError::Invalid("device too small for silicon metadata"));
    }

    let off = ((size / 0x200) - 1) * 0x200;
    let sil: SiliconMetadata = probe.read_as(off)?;

    if sil.magic.get() != SILICON_MAGIC {
        return Err(ProbeError::Invalid("no silicon medley magic"));
    }

    if let Ok(version) = std::str::from_utf8(&sil.ascii_version) {
        let version = version.trim_end_matches(['\0', ' ']);
        if !version.is_empty() {
            probe.set_version(version)?;
        }
    }
    return Ok(());
}
