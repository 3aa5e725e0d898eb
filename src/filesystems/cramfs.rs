use zerocopy::{
    byteorder::{LittleEndian, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

pub(crate) const CRAMFS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "cramfs",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_cramfs),
    magics: &[
        ProbeMagic {
            magic: &[0x45, 0x3d, 0xcd, 0x28],
            kb_offset: 0,
            sb_offset: 0,
        },
        ProbeMagic {
            magic: &[0x28, 0xcd, 0x3d, 0x45],
            kb_offset: 0,
            sb_offset: 0,
        },
    ],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct CramfsSuperBlock {
    magic: [u8; 4],
    size: U32<LittleEndian>,
    flags: U32<LittleEndian>,
    future: U32<LittleEndian>,
    signature: [u8; 16],
    fsid: [u8; 16],
    name: [u8; 16],
}

fn probe_cramfs(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let sb: CramfsSuperBlock = probe.read_as(0)?;

    if sb.name[0] != 0 {
        probe.set_label(&sb.name)?;
    }
    return Ok(());
}
