use zerocopy::{
    byteorder::{LittleEndian, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const ISW_SIGNATURE: &[u8] = b"Intel Raid ISM Cfg Sig. ";

pub(crate) const ISWRAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "isw_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_isw),
    magics: &[],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct IswHeader {
    sig: [u8; 32],
    check_sum: U32<LittleEndian>,
    mpb_size: U32<LittleEndian>,
    family_num: U32<LittleEndian>,
    generation_num: U32<LittleEndian>,
}

fn probe_isw(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < 0x10000 {
        return Err(ProbeError::Invalid("device too small for isw metadata"));
    }

    // metadata block in the second-to-last sector
    let off = ((size / 0x200) - 2) * 0x200;
    let isw: IswHeader = probe.read_as(off)?;

    if &isw.sig[..ISW_SIGNATURE.len()] != ISW_SIGNATURE {
        return Err(ProbeError::Invalid("no isw signature"));
    }

    // the bytes after the signature text carry the metadata version
    if let Ok(version) = std::str::from_utf8(&isw.sig[ISW_SIGNATURE.len()..]) {
        let version = version.trim_end_matches(['\0', ' ']);
        if !version.is_empty() {
            probe.set_version(version)?;
        }
    }
    return Ok(());
}
