use zerocopy::{
    byteorder::{BigEndian, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

/*
 * gfs and gfs2 share the metadata-header magic at 64 KiB; the
 * fs_format/multihost_format pair tells the generations apart.
 */

const GFS_SUPERBLOCK_OFFSET: u64 = 64 << 10;

const GFS_FORMAT_FS: u32 = 1309;
const GFS_FORMAT_MULTI: u32 = 1401;
const GFS2_FORMAT_FS: u32 = 1801;
const GFS2_FORMAT_MULTI: u32 = 1900;

const GFS_MAGIC: ProbeMagic = ProbeMagic {
    magic: &[0x01, 0x16, 0x19, 0x70],
    kb_offset: 64,
    sb_offset: 0,
};

pub(crate) const GFS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "gfs",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_gfs),
    magics: &[GFS_MAGIC],
};

pub(crate) const GFS2_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "gfs2",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_gfs2),
    magics: &[GFS_MAGIC],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct GfsSuperBlock {
    /* metadata header */
    mh_magic: U32<BigEndian>,
    mh_type: U32<BigEndian>,
    mh_pad0: [u8; 8],
    mh_format: U32<BigEndian>,
    mh_pad1: [u8; 4],

    sb_fs_format: U32<BigEndian>,
    sb_multihost_format: U32<BigEndian>,
    sb_pad0: [u8; 4],
    sb_bsize: U32<BigEndian>,
    sb_bsize_shift: U32<BigEndian>,
    sb_pad1: [u8; 4],
    sb_master_dir: [u8; 16],
    sb_pad2: [u8; 16],
    sb_root_dir: [u8; 16],
    sb_lockproto: [u8; 64],
    sb_locktable: [u8; 64],
}

fn probe_gfs(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let sb: GfsSuperBlock = probe.read_as(GFS_SUPERBLOCK_OFFSET)?;

    if sb.sb_fs_format.get() != GFS_FORMAT_FS
        || sb.sb_multihost_format.get() != GFS_FORMAT_MULTI
    {
        return Err(ProbeError::Invalid("format numbers are not gfs"));
    }
    if sb.sb_locktable[0] != 0 {
        probe.set_label(&sb.sb_locktable)?;
    }
    return Ok(());
}

fn probe_gfs2(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let sb: GfsSuperBlock = probe.read_as(GFS_SUPERBLOCK_OFFSET)?;

    if sb.sb_fs_format.get() != GFS2_FORMAT_FS
        || sb.sb_multihost_format.get() != GFS2_FORMAT_MULTI
    {
        return Err(ProbeError::Invalid("format numbers are not gfs2"));
    }
    if sb.sb_locktable[0] != 0 {
        probe.set_label(&sb.sb_locktable)?;
    }
    return Ok(());
}
