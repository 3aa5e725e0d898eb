use bitflags::bitflags;
use zerocopy::{
    byteorder::{LittleEndian, U16, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

/*
 * The whole ext family shares one superblock layout at byte 1024; the
 * variants are told apart purely by feature bits, which is why the
 * registry order (ext4dev, ext4, ext3, ext2, jbd) matters.
 */

const EXT_SB_OFFSET: u64 = 1024;

const EXT_MAGIC: ProbeMagic = ProbeMagic {
    magic: &[0x53, 0xEF],
    kb_offset: 1,
    sb_offset: 0x38,
};

pub(crate) const EXT2_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "ext2",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_ext2),
    magics: &[EXT_MAGIC],
};

pub(crate) const EXT3_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "ext3",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_ext3),
    magics: &[EXT_MAGIC],
};

pub(crate) const EXT4_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "ext4",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_ext4),
    magics: &[EXT_MAGIC],
};

pub(crate) const EXT4DEV_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "ext4dev",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_ext4dev),
    magics: &[EXT_MAGIC],
};

pub(crate) const JBD_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "jbd",
    usage: UsageFlags::OTHER,
    probe_fn: Some(probe_jbd),
    magics: &[EXT_MAGIC],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
pub(crate) struct ExtSuperBlock {
    pub s_inodes_count: U32<LittleEndian>,
    pub s_blocks_count: U32<LittleEndian>,
    pub s_r_blocks_count: U32<LittleEndian>,
    pub s_free_blocks_count: U32<LittleEndian>,
    pub s_free_inodes_count: U32<LittleEndian>,
    pub s_first_data_block: U32<LittleEndian>,
    pub s_log_block_size: U32<LittleEndian>,
    s_dummy3: [u8; 28],
    pub s_magic: [u8; 2],
    pub s_state: U16<LittleEndian>,
    pub s_errors: U16<LittleEndian>,
    pub s_minor_rev_level: U16<LittleEndian>,
    pub s_lastcheck: U32<LittleEndian>,
    pub s_checkinterval: U32<LittleEndian>,
    pub s_creator_os: U32<LittleEndian>,
    pub s_rev_level: U32<LittleEndian>,
    pub s_def_resuid: U16<LittleEndian>,
    pub s_def_resgid: U16<LittleEndian>,
    pub s_first_ino: U32<LittleEndian>,
    pub s_inode_size: U16<LittleEndian>,
    pub s_block_group_nr: U16<LittleEndian>,
    pub s_feature_compat: U32<LittleEndian>,
    pub s_feature_incompat: U32<LittleEndian>,
    pub s_feature_ro_compat: U32<LittleEndian>,
    pub s_uuid: [u8; 16],
    pub s_volume_name: [u8; 16],
    pub s_last_mounted: [u8; 64],
    pub s_algorithm_usage_bitmap: U32<LittleEndian>,
    pub s_prealloc_blocks: u8,
    pub s_prealloc_dir_blocks: u8,
    pub s_reserved_gdt_blocks: U16<LittleEndian>,
    pub s_journal_uuid: [u8; 16],
    pub s_journal_inum: U32<LittleEndian>,
    pub s_journal_dev: U32<LittleEndian>,
    pub s_last_orphan: U32<LittleEndian>,
    pub s_hash_seed: [U32<LittleEndian>; 4],
    pub s_def_hash_version: u8,
    pub s_jnl_backup_type: u8,
    pub s_reserved_word_pad: U16<LittleEndian>,
    pub s_default_mount_opts: U32<LittleEndian>,
    pub s_first_meta_bg: U32<LittleEndian>,
    pub s_mkfs_time: U32<LittleEndian>,
    pub s_jnl_blocks: [U32<LittleEndian>; 17],
    pub s_blocks_count_hi: U32<LittleEndian>,
    pub s_r_blocks_count_hi: U32<LittleEndian>,
    pub s_free_blocks_hi: U32<LittleEndian>,
    pub s_min_extra_isize: U16<LittleEndian>,
    pub s_want_extra_isize: U16<LittleEndian>,
    pub s_flags: U32<LittleEndian>,
}

bitflags! {
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    struct FeatureCompat: u32 {
        const HAS_JOURNAL = 0x0004;
    }

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    struct FeatureIncompat: u32 {
        const FILETYPE    = 0x0002;
        const RECOVER     = 0x0004;
        const JOURNAL_DEV = 0x0008;
        const META_BG     = 0x0010;
        const EXTENTS     = 0x0040;
        const BITS_64     = 0x0080;
        const MMP         = 0x0100;
        const FLEX_BG     = 0x0200;
    }

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    struct FeatureRoCompat: u32 {
        const SPARSE_SUPER = 0x0001;
        const LARGE_FILE   = 0x0002;
        const BTREE_DIR    = 0x0004;
        const HUGE_FILE    = 0x0008;
        const GDT_CSUM     = 0x0010;
        const DIR_NLINK    = 0x0020;
        const EXTRA_ISIZE  = 0x0040;
    }

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    struct ExtFlags: u32 {
        const TEST_FILESYS = 0x0004;
    }
}

const EXT2_INCOMPAT_SUPP: FeatureIncompat =
    FeatureIncompat::FILETYPE.union(FeatureIncompat::META_BG);
const EXT3_INCOMPAT_SUPP: FeatureIncompat = FeatureIncompat::FILETYPE
    .union(FeatureIncompat::RECOVER)
    .union(FeatureIncompat::META_BG);
const EXT2_RO_COMPAT_SUPP: FeatureRoCompat = FeatureRoCompat::SPARSE_SUPER
    .union(FeatureRoCompat::LARGE_FILE)
    .union(FeatureRoCompat::BTREE_DIR);
const EXT3_RO_COMPAT_SUPP: FeatureRoCompat = EXT2_RO_COMPAT_SUPP;

impl ExtSuperBlock {
    fn compat(&self) -> FeatureCompat {
        FeatureCompat::from_bits_truncate(self.s_feature_compat.get())
    }

    fn incompat(&self) -> FeatureIncompat {
        FeatureIncompat::from_bits_truncate(self.s_feature_incompat.get())
    }

    fn ro_compat(&self) -> FeatureRoCompat {
        FeatureRoCompat::from_bits_truncate(self.s_feature_ro_compat.get())
    }

    fn flags(&self) -> ExtFlags {
        ExtFlags::from_bits_truncate(self.s_flags.get())
    }
}

fn ext_get_super(probe: &mut Probe) -> Result<ExtSuperBlock, ProbeError> {
    return probe.read_as::<ExtSuperBlock>(EXT_SB_OFFSET);
}

fn ext_get_info(probe: &mut Probe, es: &ExtSuperBlock) -> Result<(), ProbeError> {
    if es.s_volume_name[0] != 0 {
        probe.set_label(&es.s_volume_name)?;
    }
    probe.set_uuid(&es.s_uuid)?;

    if es.compat().contains(FeatureCompat::HAS_JOURNAL) {
        probe.set_uuid_as(&es.s_journal_uuid, Some("EXT_JOURNAL"))?;
    }
    probe.set_version(&format!(
        "{}.{}",
        es.s_rev_level.get(),
        es.s_minor_rev_level.get()
    ))?;
    return Ok(());
}

fn probe_ext2(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let es = ext_get_super(probe)?;

    // a journal means ext3 (or newer) owns this superblock
    if es.compat().contains(FeatureCompat::HAS_JOURNAL) {
        return Err(ProbeError::Invalid("journalled superblock is not ext2"));
    }
    if !es.ro_compat().difference(EXT2_RO_COMPAT_SUPP).is_empty()
        || !es.incompat().difference(EXT2_INCOMPAT_SUPP).is_empty()
    {
        return Err(ProbeError::Invalid("features unknown to ext2"));
    }
    return ext_get_info(probe, &es);
}

fn probe_ext3(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let es = ext_get_super(probe)?;

    if !es.compat().contains(FeatureCompat::HAS_JOURNAL) {
        return Err(ProbeError::Invalid("ext3 requires a journal"));
    }
    if !es.ro_compat().difference(EXT3_RO_COMPAT_SUPP).is_empty()
        || !es.incompat().difference(EXT3_INCOMPAT_SUPP).is_empty()
    {
        return Err(ProbeError::Invalid("features unknown to ext3"));
    }
    return ext_get_info(probe, &es);
}

fn probe_ext4(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let es = ext_get_super(probe)?;

    if es.incompat().contains(FeatureIncompat::JOURNAL_DEV) {
        return Err(ProbeError::Invalid("external journal device, not ext4"));
    }
    if es.flags().contains(ExtFlags::TEST_FILESYS) {
        return Err(ProbeError::Invalid("test filesystem belongs to ext4dev"));
    }
    // ext4 needs at least one feature ext3 does not understand
    if es.ro_compat().difference(EXT3_RO_COMPAT_SUPP).is_empty()
        && es.incompat().difference(EXT3_INCOMPAT_SUPP).is_empty()
    {
        return Err(ProbeError::Invalid("no ext4 features present"));
    }
    return ext_get_info(probe, &es);
}

fn probe_ext4dev(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let es = ext_get_super(probe)?;

    if es.incompat().contains(FeatureIncompat::JOURNAL_DEV) {
        return Err(ProbeError::Invalid("external journal device, not ext4dev"));
    }
    if !es.flags().contains(ExtFlags::TEST_FILESYS) {
        return Err(ProbeError::Invalid("TEST_FILESYS flag not set"));
    }
    return ext_get_info(probe, &es);
}

fn probe_jbd(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let es = ext_get_super(probe)?;

    if !es.incompat().contains(FeatureIncompat::JOURNAL_DEV) {
        return Err(ProbeError::Invalid("not an external journal device"));
    }
    return ext_get_info(probe, &es);
}
