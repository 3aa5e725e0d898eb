use bitflags::bitflags;
use zerocopy::{
    byteorder::{LittleEndian, U16, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};
use crate::util::is_power_2;

pub(crate) const VFAT_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "vfat",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_vfat),
    magics: &[
        ProbeMagic {
            magic: b"MSWIN",
            kb_offset: 0,
            sb_offset: 0x52,
        },
        ProbeMagic {
            magic: b"FAT32   ",
            kb_offset: 0,
            sb_offset: 0x52,
        },
        ProbeMagic {
            magic: b"MSDOS",
            kb_offset: 0,
            sb_offset: 0x36,
        },
        ProbeMagic {
            magic: b"FAT16   ",
            kb_offset: 0,
            sb_offset: 0x36,
        },
        ProbeMagic {
            magic: b"FAT12   ",
            kb_offset: 0,
            sb_offset: 0x36,
        },
        ProbeMagic {
            magic: b"FAT     ",
            kb_offset: 0,
            sb_offset: 0x36,
        },
        // x86 jump instructions opening any BPB boot sector; the
        // structural checks below carry the real decision for these
        ProbeMagic {
            magic: &[0xEB],
            kb_offset: 0,
            sb_offset: 0,
        },
        ProbeMagic {
            magic: &[0xE9],
            kb_offset: 0,
            sb_offset: 0,
        },
        ProbeMagic {
            magic: &[0x55, 0xAA],
            kb_offset: 0,
            sb_offset: 0x1fe,
        },
    ],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
pub(crate) struct VFatSuperBlock {
    pub vs_ignored: [u8; 3],
    pub vs_sysid: [u8; 8],
    pub vs_sector_size: U16<LittleEndian>,
    pub vs_cluster_size: u8,
    pub vs_reserved: U16<LittleEndian>,
    pub vs_fats: u8,
    pub vs_dir_entries: U16<LittleEndian>,
    pub vs_sectors: U16<LittleEndian>,
    pub vs_media: u8,
    pub vs_fat_length: U16<LittleEndian>,
    pub vs_secs_track: U16<LittleEndian>,
    pub vs_heads: U16<LittleEndian>,
    pub vs_hidden: U32<LittleEndian>,
    pub vs_total_sect: U32<LittleEndian>,

    pub vs_fat32_length: U32<LittleEndian>,
    pub vs_flags: U16<LittleEndian>,
    pub vs_version: U16<LittleEndian>,
    pub vs_root_cluster: U32<LittleEndian>,
    pub vs_fsinfo_sector: U16<LittleEndian>,
    pub vs_backup_boot: U16<LittleEndian>,
    pub vs_reserved2: [u8; 12],
    pub vs_drive_number: u8,
    pub vs_boot_flags: u8,
    pub vs_ext_boot_sign: u8, /* 0x28 - without vs_label/vs_magic; 0x29 - with */
    pub vs_serno: [u8; 4],
    pub vs_label: [u8; 11],
    pub vs_magic: [u8; 8],
    pub vs_dummy2: [u8; 420],
    pub vs_pmagic: [u8; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
pub(crate) struct MsDosSuperBlock {
    /* DOS 2.0 BPB */
    pub ms_ignored: [u8; 3],
    pub ms_sysid: [u8; 8],
    pub ms_sector_size: U16<LittleEndian>,
    pub ms_cluster_size: u8,
    pub ms_reserved: U16<LittleEndian>,
    pub ms_fats: u8,
    pub ms_dir_entries: U16<LittleEndian>,
    pub ms_sectors: U16<LittleEndian>, /* =0 iff V3 or later */
    pub ms_media: u8,
    pub ms_fat_length: U16<LittleEndian>, /* Sectors per FAT */
    /* DOS 3.0 BPB */
    pub ms_secs_track: U16<LittleEndian>,
    pub ms_heads: U16<LittleEndian>,
    pub ms_hidden: U32<LittleEndian>,
    /* DOS 3.31 BPB */
    pub ms_total_sect: U32<LittleEndian>,
    /* DOS 3.4 EBPB */
    pub ms_drive_number: u8,
    pub ms_boot_flags: u8,
    pub ms_ext_boot_sign: u8,
    pub ms_serno: [u8; 4],
    /* DOS 4.0 EBPB */
    pub ms_label: [u8; 11],
    pub ms_magic: [u8; 8],
    /* padding */
    pub ms_dummy2: [u8; 448],
    pub ms_pmagic: [u8; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct VfatDirEntry {
    name: [u8; 11],
    attr: u8,
    time_creat: U16<LittleEndian>,
    date_creat: U16<LittleEndian>,
    time_acc: U16<LittleEndian>,
    date_acc: U16<LittleEndian>,
    cluster_high: U16<LittleEndian>,
    time_write: U16<LittleEndian>,
    date_write: U16<LittleEndian>,
    cluster_low: U16<LittleEndian>,
    size: U32<LittleEndian>,
}

impl VfatDirEntry {
    fn flags(&self) -> FatAttr {
        FatAttr::from_bits_truncate(self.attr)
    }
}

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct FatAttr: u8 {
        const VOLUME_ID = 0x08;
        const DIR       = 0x10;
        const LONG_NAME = 0x0f;
        const MASK      = 0x3f;
    }
}

const FAT_ENTRY_FREE: u8 = 0xe5;
const DIR_ENTRY_SIZE: usize = 32;
const NO_NAME: &[u8; 11] = b"NO NAME    ";

const FAT12_MAX: u32 = 0xFF4;
const FAT16_MAX: u32 = 0xFFF4;
const FAT32_MAX: u32 = 0x0FFFFFF6;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum FatWidth {
    Fat12,
    Fat16,
    Fat32,
}

impl FatWidth {
    fn version(self) -> &'static str {
        match self {
            FatWidth::Fat12 => "FAT12",
            FatWidth::Fat16 => "FAT16",
            FatWidth::Fat32 => "FAT32",
        }
    }
}

fn fat_size(ms: &MsDosSuperBlock, vs: &VFatSuperBlock) -> u32 {
    let num_fat = u32::from(ms.ms_fats);
    let fat_length: u32 = if ms.ms_fat_length.get() == 0 {
        vs.vs_fat32_length.get()
    } else {
        ms.ms_fat_length.get().into()
    };
    return fat_length * num_fat;
}

fn sect_count(ms: &MsDosSuperBlock) -> u32 {
    if ms.ms_sectors.get() == 0 {
        return ms.ms_total_sect.get();
    }
    return ms.ms_sectors.get().into();
}

fn cluster_count(ms: &MsDosSuperBlock, vs: &VFatSuperBlock) -> Result<u32, ProbeError> {
    let sector_size = u32::from(ms.ms_sector_size.get());
    let dir_size =
        (u32::from(ms.ms_dir_entries.get()) * DIR_ENTRY_SIZE as u32 + (sector_size - 1))
            / sector_size;

    let used = u32::from(ms.ms_reserved.get()) + fat_size(ms, vs) + dir_size;
    let clusters = sect_count(ms)
        .checked_sub(used)
        .ok_or(ProbeError::Invalid("BPB geometry does not fit the device"))?
        / u32::from(ms.ms_cluster_size);
    return Ok(clusters);
}

fn valid_fat(
    ms: &MsDosSuperBlock,
    vs: &VFatSuperBlock,
    mag: Option<&ProbeMagic>,
) -> Result<FatWidth, ProbeError> {
    let maglen = mag.map_or(0, |m| m.magic.len());

    if maglen <= 2 {
        if ms.ms_pmagic != [0x55, 0xAA] {
            return Err(ProbeError::Invalid("boot sector signature missing"));
        }

        /*
         * OS/2 and apparently DFSee will place a FAT12/16-like
         * pseudo-superblock in the first 512 bytes of non-FAT
         * filesystems, at least JFS and HPFS. Rule those out despite the
         * FAT-like header.
         */
        if &ms.ms_magic == b"JFS     " || &ms.ms_magic == b"HPFS    " {
            return Err(ProbeError::Invalid("JFS/HPFS pseudo-superblock"));
        }
    }

    if ms.ms_fats == 0 {
        return Err(ProbeError::Invalid("no FAT tables"));
    }
    if ms.ms_reserved.get() == 0 {
        return Err(ProbeError::Invalid("no reserved sectors"));
    }
    if !matches!(ms.ms_sector_size.get(), 512 | 1024 | 2048 | 4096) {
        return Err(ProbeError::Invalid("unsupported sector size"));
    }
    if !is_power_2(u64::from(ms.ms_cluster_size)) {
        return Err(ProbeError::Invalid("cluster size not a power of two"));
    }

    let clusters = cluster_count(ms, vs)?;

    let max_count = if ms.ms_fat_length.get() == 0 && vs.vs_fat32_length.get() > 0 {
        FAT32_MAX
    } else if clusters > FAT12_MAX {
        FAT16_MAX
    } else {
        FAT12_MAX
    };
    if clusters > max_count {
        return Err(ProbeError::Invalid("too many clusters"));
    }

    if clusters < FAT12_MAX {
        return Ok(FatWidth::Fat12);
    } else if clusters < FAT16_MAX {
        return Ok(FatWidth::Fat16);
    }
    return Ok(FatWidth::Fat32);
}

/// Scans `entries` root-directory slots at `off` for the volume-ID entry.
fn search_fat_label(
    probe: &mut Probe,
    off: u64,
    entries: u32,
) -> Result<Option<[u8; 11]>, ProbeError> {
    let buf = probe.get_buffer(off, entries as usize * DIR_ENTRY_SIZE)?;

    for chunk in buf.chunks_exact(DIR_ENTRY_SIZE) {
        let entry = VfatDirEntry::read_from_bytes(chunk)
            .map_err(|_| ProbeError::Invalid("directory entry out of bounds"))?;

        if entry.name[0] == 0x00 {
            break;
        }
        let attr = entry.flags();
        if entry.name[0] == FAT_ENTRY_FREE
            || entry.cluster_high.get() != 0
            || entry.cluster_low.get() != 0
            || attr.intersection(FatAttr::MASK) == FatAttr::LONG_NAME
        {
            continue;
        }
        if attr.contains(FatAttr::VOLUME_ID) && !attr.contains(FatAttr::DIR) {
            let mut label = entry.name;
            if label[0] == 0x05 {
                label[0] = 0xE5;
            }
            return Ok(Some(label));
        }
    }
    return Ok(None);
}

fn probe_fat16(
    probe: &mut Probe,
    ms: &MsDosSuperBlock,
    vs: &VFatSuperBlock,
) -> Result<Option<[u8; 11]>, ProbeError> {
    let sector_size = u64::from(ms.ms_sector_size.get());
    let root_start = (u64::from(ms.ms_reserved.get()) + u64::from(fat_size(ms, vs))) * sector_size;

    return search_fat_label(probe, root_start, vs.vs_dir_entries.get().into());
}

fn probe_fat32(
    probe: &mut Probe,
    ms: &MsDosSuperBlock,
    vs: &VFatSuperBlock,
) -> Result<Option<[u8; 11]>, ProbeError> {
    let sector_size = u64::from(ms.ms_sector_size.get());
    let reserved = u64::from(ms.ms_reserved.get());
    let buf_size = u64::from(vs.vs_cluster_size) * sector_size;
    let start_data_sect = reserved + u64::from(fat_size(ms, vs));
    let entries = (u64::from(vs.vs_fat32_length.get()) * sector_size / 4) as u32;

    let mut label = None;
    let mut next = vs.vs_root_cluster.get();
    let mut maxloop = 100;

    // walk the root directory cluster chain; data clusters start at 2
    while next >= 2 && next < entries && maxloop > 0 {
        maxloop -= 1;

        let next_sect_off = u64::from(next - 2) * u64::from(vs.vs_cluster_size);
        let next_off = (start_data_sect + next_sect_off) * sector_size;
        let count = (buf_size / DIR_ENTRY_SIZE as u64) as u32;

        if let Some(found) = search_fat_label(probe, next_off, count)? {
            label = Some(found);
            break;
        }

        let fat_entry_off = reserved * sector_size + u64::from(next) * 4;
        let buf = probe.get_buffer(fat_entry_off, 4)?;
        next = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) & 0x0FFFFFFF;
    }

    let fsinfo_sect = u64::from(vs.vs_fsinfo_sector.get());
    if fsinfo_sect != 0 {
        let fsinfo: Fat32FsInfo = probe.read_as(fsinfo_sect * sector_size)?;
        if &fsinfo.signature1 != b"\x52\x52\x61\x41"
            && &fsinfo.signature1 != b"\x52\x52\x64\x41"
            && &fsinfo.signature1 != b"\x00\x00\x00\x00"
        {
            return Err(ProbeError::Invalid("bad fsinfo signature1"));
        }
        if &fsinfo.signature2 != b"\x72\x72\x41\x61" && &fsinfo.signature2 != b"\x00\x00\x00\x00" {
            return Err(ProbeError::Invalid("bad fsinfo signature2"));
        }
    }
    return Ok(label);
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct Fat32FsInfo {
    signature1: [u8; 4],
    reserved1: [u8; 120],
    signature2: [u8; 4],
    free_clusters: U32<LittleEndian>,
    next_cluster: U32<LittleEndian>,
    reserved2: [u8; 4],
}

fn probe_vfat(probe: &mut Probe, mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let ms: MsDosSuperBlock = probe.read_as(0)?;
    let vs: VFatSuperBlock = probe.read_as(0)?;

    let width = valid_fat(&ms, &vs, mag)?;

    let (dir_label, bpb_label, serno, boot_sign) = if ms.ms_fat_length.get() != 0 {
        (
            probe_fat16(probe, &ms, &vs)?,
            ms.ms_label,
            ms.ms_serno,
            ms.ms_ext_boot_sign,
        )
    } else if vs.vs_fat32_length.get() != 0 {
        (
            probe_fat32(probe, &ms, &vs)?,
            vs.vs_label,
            vs.vs_serno,
            vs.vs_ext_boot_sign,
        )
    } else {
        return Err(ProbeError::Invalid("neither FAT16 nor FAT32 length set"));
    };

    // prefer the root-directory volume entry, fall back to the BPB field
    let label = match dir_label {
        Some(l) if &l != NO_NAME => Some(l),
        _ if boot_sign == 0x29 && &bpb_label != NO_NAME && bpb_label[0] != 0 => Some(bpb_label),
        _ => None,
    };
    if let Some(label) = label {
        probe.set_label(&label)?;
    }

    if boot_sign == 0x28 || boot_sign == 0x29 {
        probe.set_uuid_str(
            &serno,
            &format!(
                "{:02X}{:02X}-{:02X}{:02X}",
                serno[3], serno[2], serno[1], serno[0]
            ),
        )?;
    }
    probe.set_version(width.version())?;
    return Ok(());
}
