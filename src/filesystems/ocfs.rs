use zerocopy::{
    byteorder::{LittleEndian, U16, U32, U64},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

pub(crate) const OCFS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "ocfs",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_ocfs),
    magics: &[ProbeMagic {
        magic: b"OracleCFS",
        kb_offset: 0,
        sb_offset: 8,
    }],
};

pub(crate) const OCFS2_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "ocfs2",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_ocfs2),
    magics: &[
        // superblock lives in the second filesystem block, one rule per
        // supported block size
        ProbeMagic {
            magic: b"OCFSV2",
            kb_offset: 1,
            sb_offset: 0,
        },
        ProbeMagic {
            magic: b"OCFSV2",
            kb_offset: 2,
            sb_offset: 0,
        },
        ProbeMagic {
            magic: b"OCFSV2",
            kb_offset: 4,
            sb_offset: 0,
        },
        ProbeMagic {
            magic: b"OCFSV2",
            kb_offset: 8,
            sb_offset: 0,
        },
    ],
};

pub(crate) const ORACLEASM_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "oracleasm",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_oracleasm),
    magics: &[ProbeMagic {
        magic: b"ORCLDISK",
        kb_offset: 0,
        sb_offset: 32,
    }],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct OcfsVolumeHeader {
    minor_version: U32<LittleEndian>,
    major_version: U32<LittleEndian>,
    signature: [u8; 128],
    mount: [u8; 128],
    mount_len: U16<LittleEndian>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct OcfsVolumeLabel {
    disk_lock: [u8; 48],
    label: [u8; 64],
    label_len: U16<LittleEndian>,
    vol_id: [u8; 16],
    vol_id_len: U16<LittleEndian>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct Ocfs2SuperBlock {
    i_signature: [u8; 8],
    i_generation: U32<LittleEndian>,
    i_suballoc_slot: U16<LittleEndian>,
    i_suballoc_bit: U16<LittleEndian>,
    i_reserved0: U32<LittleEndian>,
    i_clusters: U32<LittleEndian>,
    i_uid: U32<LittleEndian>,
    i_gid: U32<LittleEndian>,
    i_size: U64<LittleEndian>,
    i_mode: U16<LittleEndian>,
    i_links_count: U16<LittleEndian>,
    i_flags: U32<LittleEndian>,
    i_atime: U64<LittleEndian>,
    i_ctime: U64<LittleEndian>,
    i_mtime: U64<LittleEndian>,
    i_dtime: U64<LittleEndian>,
    i_blkno: U64<LittleEndian>,
    i_last_eb_blk: U64<LittleEndian>,
    i_fs_generation: U32<LittleEndian>,
    i_atime_nsec: U32<LittleEndian>,
    i_ctime_nsec: U32<LittleEndian>,
    i_mtime_nsec: U32<LittleEndian>,
    i_reserved1: [u8; 80],
    s_major_rev_level: U16<LittleEndian>,
    s_minor_rev_level: U16<LittleEndian>,
    s_mnt_count: U16<LittleEndian>,
    s_max_mnt_count: U16<LittleEndian>,
    s_state: U16<LittleEndian>,
    s_errors: U16<LittleEndian>,
    s_checkinterval: U32<LittleEndian>,
    s_lastcheck: U64<LittleEndian>,
    s_creator_os: U32<LittleEndian>,
    s_feature_compat: U32<LittleEndian>,
    s_feature_incompat: U32<LittleEndian>,
    s_feature_ro_compat: U32<LittleEndian>,
    s_root_blkno: U64<LittleEndian>,
    s_system_dir_blkno: U64<LittleEndian>,
    s_blocksize_bits: U32<LittleEndian>,
    s_clustersize_bits: U32<LittleEndian>,
    s_max_slots: U16<LittleEndian>,
    s_reserved1: U16<LittleEndian>,
    s_reserved2: U32<LittleEndian>,
    s_first_cluster_group: U64<LittleEndian>,
    s_label: [u8; 64],
    s_uuid: [u8; 16],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct OracleAsmLabel {
    dummy: [u8; 32],
    dl_tag: [u8; 8],
    dl_id: [u8; 24],
}

fn probe_ocfs(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let ohdr: OcfsVolumeHeader = probe.read_as(0)?;
    let olbl: OcfsVolumeLabel = probe.read_as(512)?;

    let len = usize::from(olbl.label_len.get()).min(olbl.label.len());
    if len > 0 {
        probe.set_label(&olbl.label[..len])?;
    }
    probe.set_uuid(&olbl.vol_id)?;
    probe.set_version(&format!(
        "{}.{}",
        ohdr.major_version.get(),
        ohdr.minor_version.get()
    ))?;
    return Ok(());
}

fn probe_ocfs2(probe: &mut Probe, mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let mag = mag.ok_or(ProbeError::Invalid("ocfs2 needs a matched magic"))?;
    let osb: Ocfs2SuperBlock = probe.read_as(mag.kb_offset << 10)?;

    if osb.s_label[0] != 0 {
        probe.set_label(&osb.s_label)?;
    }
    probe.set_uuid(&osb.s_uuid)?;
    probe.set_version(&format!(
        "{}.{}",
        osb.s_major_rev_level.get(),
        osb.s_minor_rev_level.get()
    ))?;
    return Ok(());
}

fn probe_oracleasm(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let dl: OracleAsmLabel = probe.read_as(0)?;

    if dl.dl_id[0] != 0 {
        probe.set_label(&dl.dl_id)?;
    }
    return Ok(());
}
