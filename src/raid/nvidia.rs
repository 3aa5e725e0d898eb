use zerocopy::{
    byteorder::{LittleEndian, U16, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const NVIDIA_SIGNATURE: &[u8] = b"NVIDIA";

pub(crate) const NVRAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "nvidia_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_nvidia),
    magics: &[],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct NvidiaMetadata {
    vendor: [u8; 8],
    size: U32<LittleEndian>,
    chksum: U32<LittleEndian>,
    version: U16<LittleEndian>,
}

fn probe_nvidia(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < 0x10000 {
        return Err(ProbeError::Invalid("device too small for nvidia metadata"));
    }

    let off = ((size / 0x200) - 2) * 0x200;
    let nv: NvidiaMetadata = probe.read_as(off)?;

    if &nv.vendor[..NVIDIA_SIGNATURE.len()] != NVIDIA_SIGNATURE {
        return Err(ProbeError::Invalid("no nvidia signature"));
    }

    probe.set_version(&format!("{}", nv.version.get()))?;
    return Ok(());
}
