use zerocopy::{
    byteorder::{LittleEndian, U32, U64},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

pub(crate) const JFS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "jfs",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_jfs),
    magics: &[ProbeMagic {
        magic: b"JFS1",
        kb_offset: 32,
        sb_offset: 0,
    }],
};

const JFS_SUPERBLOCK_OFFSET: u64 = 0x8000;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct JfsSuperBlock {
    js_magic: [u8; 4],
    js_version: U32<LittleEndian>,
    js_size: U64<LittleEndian>,
    js_bsize: U32<LittleEndian>,
    js_dummy1: U32<LittleEndian>,
    js_pbsize: U32<LittleEndian>,
    js_dummy2: [u8; 108],
    js_uuid: [u8; 16],
    js_label: [u8; 16],
    js_loguuid: [u8; 16],
}

fn probe_jfs(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let js: JfsSuperBlock = probe.read_as(JFS_SUPERBLOCK_OFFSET)?;

    if js.js_version.get() > 2 {
        return Err(ProbeError::Invalid("unknown jfs version"));
    }

    if js.js_label[0] != 0 {
        probe.set_label(&js.js_label)?;
    }
    probe.set_uuid(&js.js_uuid)?;
    probe.set_version(&format!("{}", js.js_version.get()))?;
    return Ok(());
}
