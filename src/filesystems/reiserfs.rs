use zerocopy::{
    byteorder::{LittleEndian, U16, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

/*
 * reiserfs keeps its superblock either at 8 KiB (old 3.5 layout) or at
 * 64 KiB; the magic string doubles as the format version. Label and uuid
 * fields only exist in the 3.6/JR formats.
 */

pub(crate) const REISER_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "reiserfs",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_reiser),
    magics: &[
        ProbeMagic {
            magic: b"ReIsErFs",
            kb_offset: 8,
            sb_offset: 0x34,
        },
        ProbeMagic {
            magic: b"ReIsEr2Fs",
            kb_offset: 64,
            sb_offset: 0x34,
        },
        ProbeMagic {
            magic: b"ReIsEr3Fs",
            kb_offset: 64,
            sb_offset: 0x34,
        },
        ProbeMagic {
            magic: b"ReIsErFs",
            kb_offset: 64,
            sb_offset: 0x34,
        },
        ProbeMagic {
            magic: b"ReIsErFs",
            kb_offset: 8,
            sb_offset: 20,
        },
    ],
};

pub(crate) const REISER4_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "reiser4",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_reiser4),
    magics: &[ProbeMagic {
        magic: b"ReIsEr4",
        kb_offset: 64,
        sb_offset: 0,
    }],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct ReiserSuperBlock {
    rs_blocks_count: U32<LittleEndian>,
    rs_free_blocks: U32<LittleEndian>,
    rs_root_block: U32<LittleEndian>,
    rs_journal_block: U32<LittleEndian>,
    rs_journal_dev: U32<LittleEndian>,
    rs_orig_journal_size: U32<LittleEndian>,
    rs_dummy2: [u8; 20],
    rs_blocksize: U16<LittleEndian>,
    rs_dummy3: [u8; 6],
    rs_magic: [u8; 12],
    rs_dummy4: [u8; 20],
    rs_uuid: [u8; 16],
    rs_label: [u8; 16],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct Reiser4SuperBlock {
    rs4_magic: [u8; 17],
    rs4_dummy: [u8; 3],
    rs4_uuid: [u8; 16],
    rs4_label: [u8; 16],
    rs4_dummy2: [u8; 8],
}

fn probe_reiser(probe: &mut Probe, mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let mag = mag.ok_or(ProbeError::Invalid("reiserfs needs a matched magic"))?;
    let rs: ReiserSuperBlock = probe.read_as(mag.kb_offset << 10)?;

    if rs.rs_blocks_count.get() == 0 {
        return Err(ProbeError::Invalid("empty reiserfs block count"));
    }

    let new_format = mag.magic == b"ReIsEr2Fs" || mag.magic == b"ReIsEr3Fs";
    if new_format {
        if rs.rs_label[0] != 0 {
            probe.set_label(&rs.rs_label)?;
        }
        probe.set_uuid(&rs.rs_uuid)?;
    }

    if mag.magic == b"ReIsEr2Fs" {
        probe.set_version("3.6")?;
    } else if mag.magic == b"ReIsEr3Fs" {
        probe.set_version("JR")?;
    } else {
        probe.set_version("3.5")?;
    }
    return Ok(());
}

fn probe_reiser4(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let rs: Reiser4SuperBlock = probe.read_as(64 << 10)?;

    if rs.rs4_label[0] != 0 {
        probe.set_label(&rs.rs4_label)?;
    }
    probe.set_uuid(&rs.rs4_uuid)?;
    probe.set_version("4")?;
    return Ok(());
}
