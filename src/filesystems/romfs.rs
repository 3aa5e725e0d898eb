use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

pub(crate) const ROMFS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "romfs",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_romfs),
    magics: &[ProbeMagic {
        magic: b"-rom1fs-",
        kb_offset: 0,
        sb_offset: 0,
    }],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct RomfsSuperBlock {
    ros_magic: [u8; 8],
    ros_dummy1: [u8; 8],
    ros_volume: [u8; 16],
}

fn probe_romfs(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let ros: RomfsSuperBlock = probe.read_as(0)?;

    if ros.ros_volume[0] != 0 {
        probe.set_label(&ros.ros_volume)?;
    }
    return Ok(());
}
