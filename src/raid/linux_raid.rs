use zerocopy::{
    byteorder::{LittleEndian, U32, U64},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

/*
 * md superblocks sit at device-size-dependent offsets, so there is no
 * magic table; the parser locates and validates them itself. 0.90 lives
 * in the last 64 KiB-aligned reserved area, 1.x at 0 (v1.1), 4 KiB
 * (v1.2) or 8 KiB before the end (v1.0), cross-checked against the
 * stored super_offset.
 */

const MD_RESERVED_BYTES: u64 = 0x10000;
const MD_SB_MAGIC: u32 = 0xa92b4efc;

pub(crate) const LINUXRAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "linux_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_linux_raid),
    magics: &[],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct Mdp0SuperBlock {
    md_magic: U32<LittleEndian>,
    major_version: U32<LittleEndian>,
    minor_version: U32<LittleEndian>,
    patch_version: U32<LittleEndian>,
    gvalid_words: U32<LittleEndian>,
    set_uuid0: U32<LittleEndian>,
    ctime: U32<LittleEndian>,
    level: U32<LittleEndian>,
    size: U32<LittleEndian>,
    nr_disks: U32<LittleEndian>,
    raid_disks: U32<LittleEndian>,
    md_minor: U32<LittleEndian>,
    not_persistent: U32<LittleEndian>,
    set_uuid1: U32<LittleEndian>,
    set_uuid2: U32<LittleEndian>,
    set_uuid3: U32<LittleEndian>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct Mdp1SuperBlock {
    magic: U32<LittleEndian>,
    major_version: U32<LittleEndian>,
    feature_map: U32<LittleEndian>,
    pad0: U32<LittleEndian>,
    set_uuid: [u8; 16],
    set_name: [u8; 32],
    ctime: U64<LittleEndian>,
    level: U32<LittleEndian>,
    layout: U32<LittleEndian>,
    size: U64<LittleEndian>,
    chunksize: U32<LittleEndian>,
    raid_disks: U32<LittleEndian>,
    bitmap_offset: U32<LittleEndian>,
    new_level: U32<LittleEndian>,
    reshape_position: U64<LittleEndian>,
    delta_disks: U32<LittleEndian>,
    new_layout: U32<LittleEndian>,
    new_chunk: U32<LittleEndian>,
    pad1: [u8; 4],
    data_offset: U64<LittleEndian>,
    data_size: U64<LittleEndian>,
    super_offset: U64<LittleEndian>,
}

fn probe_raid0(probe: &mut Probe, off: u64) -> Result<(), ProbeError> {
    let sb: Mdp0SuperBlock = probe.read_as(off)?;

    // the 0.90 superblock is written in host byte order
    let native = sb.md_magic.get() == MD_SB_MAGIC;
    if !native && sb.md_magic.get().swap_bytes() != MD_SB_MAGIC {
        return Err(ProbeError::Invalid("no md 0.90 magic"));
    }
    let rd = |v: U32<LittleEndian>| if native { v.get() } else { v.get().swap_bytes() };

    // the uuid words keep their on-disk byte order
    let mut uuid = [0u8; 16];
    uuid[0..4].copy_from_slice(&sb.set_uuid0.get().to_le_bytes());
    uuid[4..8].copy_from_slice(&sb.set_uuid1.get().to_le_bytes());
    uuid[8..12].copy_from_slice(&sb.set_uuid2.get().to_le_bytes());
    uuid[12..16].copy_from_slice(&sb.set_uuid3.get().to_le_bytes());

    probe.set_uuid(&uuid)?;
    probe.set_version(&format!(
        "{}.{}.{}",
        rd(sb.major_version),
        rd(sb.minor_version),
        rd(sb.patch_version)
    ))?;
    return Ok(());
}

fn probe_raid1(probe: &mut Probe, off: u64, version: &str) -> Result<(), ProbeError> {
    let sb: Mdp1SuperBlock = probe.read_as(off)?;

    if sb.magic.get() != MD_SB_MAGIC {
        return Err(ProbeError::Invalid("no md 1.x magic"));
    }
    if sb.major_version.get() != 1 {
        return Err(ProbeError::Invalid("not an md 1.x superblock"));
    }
    if sb.super_offset.get() != off >> 9 {
        return Err(ProbeError::Invalid("super_offset does not match"));
    }

    probe.set_uuid(&sb.set_uuid)?;
    if sb.set_name[0] != 0 {
        probe.set_label(&sb.set_name)?;
    }
    probe.set_version(version)?;
    return Ok(());
}

fn probe_linux_raid(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < MD_RESERVED_BYTES {
        return Err(ProbeError::Invalid("device too small for md metadata"));
    }

    let off = (size & !(MD_RESERVED_BYTES - 1)) - MD_RESERVED_BYTES;
    if probe_raid0(probe, off).is_ok() {
        return Ok(());
    }
    if probe_raid1(probe, 0, "1.1").is_ok() {
        return Ok(());
    }
    if probe_raid1(probe, 0x1000, "1.2").is_ok() {
        return Ok(());
    }
    if probe_raid1(probe, size - 0x2000, "1.0").is_ok() {
        return Ok(());
    }
    return Err(ProbeError::Invalid("no md superblock found"));
}
