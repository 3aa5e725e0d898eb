use zerocopy::{
    byteorder::{BigEndian, U16, U32, U64},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};
use crate::util::is_power_2;

pub(crate) const XFS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "xfs",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_xfs),
    magics: &[ProbeMagic {
        magic: b"XFSB",
        kb_offset: 0,
        sb_offset: 0,
    }],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
pub(crate) struct XfsSuperBlock {
    pub sb_magicnum: U32<BigEndian>,
    pub sb_blocksize: U32<BigEndian>,
    pub sb_dblocks: U64<BigEndian>,
    pub sb_rblocks: U64<BigEndian>,
    pub sb_rextents: U64<BigEndian>,
    pub sb_uuid: [u8; 16],
    pub sb_logstart: U64<BigEndian>,
    pub sb_rootino: U64<BigEndian>,
    pub sb_rbmino: U64<BigEndian>,
    pub sb_rsumino: U64<BigEndian>,
    pub sb_rextsize: U32<BigEndian>,
    pub sb_agblocks: U32<BigEndian>,
    pub sb_agcount: U32<BigEndian>,
    pub sb_rbmblocks: U32<BigEndian>,
    pub sb_logblocks: U32<BigEndian>,
    pub sb_versionnum: U16<BigEndian>,
    pub sb_sectsize: U16<BigEndian>,
    pub sb_inodesize: U16<BigEndian>,
    pub sb_inopblock: U16<BigEndian>,
    pub sb_fname: [u8; 12],
    pub sb_blocklog: u8,
    pub sb_sectlog: u8,
    pub sb_inodelog: u8,
    pub sb_inopblog: u8,
    pub sb_agblklog: u8,
    pub sb_rextslog: u8,
    pub sb_inprogress: u8,
    pub sb_imax_pct: u8,
}

fn probe_xfs(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let sb: XfsSuperBlock = probe.read_as(0)?;

    if !is_power_2(u64::from(sb.sb_blocksize.get()))
        || !(512..=65536).contains(&sb.sb_blocksize.get())
    {
        return Err(ProbeError::Invalid("implausible xfs block size"));
    }
    if !is_power_2(u64::from(sb.sb_sectsize.get())) || sb.sb_sectsize.get() > 0x8000 {
        return Err(ProbeError::Invalid("implausible xfs sector size"));
    }
    if sb.sb_dblocks.get() == 0 || sb.sb_agcount.get() == 0 {
        return Err(ProbeError::Invalid("empty xfs geometry"));
    }

    if sb.sb_fname[0] != 0 {
        probe.set_label(&sb.sb_fname)?;
    }
    probe.set_uuid(&sb.sb_uuid)?;
    return Ok(());
}
