use zerocopy::{
    byteorder::{LittleEndian, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

/*
 * The swap signature sits in the last ten bytes of the first page, so
 * there is one magic rule per supported page size (4k .. 64k). The v1
 * header with uuid and label always starts at byte 1024, independent of
 * the page size.
 */

const fn page_magic(magic: &'static [u8], kb: u64) -> ProbeMagic {
    ProbeMagic {
        magic,
        kb_offset: kb,
        sb_offset: 0x3f6,
    }
}

pub(crate) const SWAP_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "swap",
    usage: UsageFlags::OTHER,
    probe_fn: Some(probe_swap),
    magics: &[
        page_magic(b"SWAP-SPACE", 3),
        page_magic(b"SWAPSPACE2", 3),
        page_magic(b"SWAP-SPACE", 7),
        page_magic(b"SWAPSPACE2", 7),
        page_magic(b"SWAP-SPACE", 15),
        page_magic(b"SWAPSPACE2", 15),
        page_magic(b"SWAP-SPACE", 31),
        page_magic(b"SWAPSPACE2", 31),
        page_magic(b"SWAP-SPACE", 63),
        page_magic(b"SWAPSPACE2", 63),
    ],
};

pub(crate) const SWSUSPEND_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "swsuspend",
    usage: UsageFlags::OTHER,
    probe_fn: Some(probe_swsuspend),
    magics: &[
        page_magic(b"S1SUSPEND", 3),
        page_magic(b"S2SUSPEND", 3),
        page_magic(b"ULSUSPEND", 3),
        page_magic(b"S1SUSPEND", 7),
        page_magic(b"S2SUSPEND", 7),
        page_magic(b"ULSUSPEND", 7),
        page_magic(b"S1SUSPEND", 15),
        page_magic(b"S2SUSPEND", 15),
        page_magic(b"ULSUSPEND", 15),
        page_magic(b"S1SUSPEND", 31),
        page_magic(b"S2SUSPEND", 31),
        page_magic(b"ULSUSPEND", 31),
        page_magic(b"S1SUSPEND", 63),
        page_magic(b"S2SUSPEND", 63),
        page_magic(b"ULSUSPEND", 63),
    ],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct SwapHeaderV1 {
    version: U32<LittleEndian>,
    last_page: U32<LittleEndian>,
    nr_badpages: U32<LittleEndian>,
    uuid: [u8; 16],
    volume_name: [u8; 16],
}

const SWAP_HEADER_OFFSET: u64 = 1024;

fn swap_set_info(probe: &mut Probe) -> Result<(), ProbeError> {
    let hdr: SwapHeaderV1 = probe.read_as(SWAP_HEADER_OFFSET)?;

    if hdr.version.get() != 1 {
        return Err(ProbeError::Invalid("unsupported swap header version"));
    }
    probe.set_uuid(&hdr.uuid)?;
    if hdr.volume_name[0] != 0 {
        probe.set_label(&hdr.volume_name)?;
    }
    probe.set_version("1")?;
    return Ok(());
}

fn probe_swap(probe: &mut Probe, mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let mag = mag.ok_or(ProbeError::Invalid("swap needs a matched magic"))?;

    // SWAP-SPACE is the old v0 layout without uuid or label
    if mag.magic == b"SWAP-SPACE" {
        return Ok(());
    }
    return swap_set_info(probe);
}

fn probe_swsuspend(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    // suspend images reuse the swap v1 header
    return swap_set_info(probe);
}
