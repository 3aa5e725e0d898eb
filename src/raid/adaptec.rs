use zerocopy::{
    byteorder::{BigEndian, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const AD_SIGNATURE: &[u8] = b"DPTM";
const AD_MAGIC_B0: u32 = 0x37FC4D1E;

pub(crate) const ADRAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "adaptec_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_adaptec),
    magics: &[],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct AdaptecMetadata {
    b0: U32<BigEndian>,
    smagic: [u8; 4],
}

fn probe_adaptec(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < 0x10000 {
        return Err(ProbeError::Invalid("device too small for adaptec metadata"));
    }

    let off = ((size / 0x200) - 1) * 0x200;
    let ad: AdaptecMetadata = probe.read_as(off)?;

    if &ad.smagic != AD_SIGNATURE || ad.b0.get() != AD_MAGIC_B0 {
        return Err(ProbeError::Invalid("no adaptec signature"));
    }
    return Ok(());
}
