use zerocopy::{
    byteorder::{BigEndian, U16, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

/*
 * Plain HFS rejects volumes that merely wrap an embedded HFS+ image; the
 * hfsplus descriptor runs first in the registry and follows the wrapper
 * to the real volume header.
 */

const HFS_MDB_OFFSET: u64 = 1024;

pub(crate) const HFS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "hfs",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_hfs),
    magics: &[ProbeMagic {
        magic: b"BD",
        kb_offset: 1,
        sb_offset: 0,
    }],
};

pub(crate) const HFSPLUS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "hfsplus",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_hfsplus),
    magics: &[
        ProbeMagic {
            magic: b"H+",
            kb_offset: 1,
            sb_offset: 0,
        },
        ProbeMagic {
            magic: b"HX",
            kb_offset: 1,
            sb_offset: 0,
        },
        // HFS wrapper with an embedded HFS+ volume
        ProbeMagic {
            magic: b"BD",
            kb_offset: 1,
            sb_offset: 0,
        },
    ],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct HfsMdb {
    signature: [u8; 2],
    cr_date: U32<BigEndian>,
    ls_mod: U32<BigEndian>,
    atrb: U16<BigEndian>,
    nm_fls: U16<BigEndian>,
    vbm_st: U16<BigEndian>,
    alloc_ptr: U16<BigEndian>,
    nm_al_blks: U16<BigEndian>,
    al_blk_size: U32<BigEndian>,
    clp_size: U32<BigEndian>,
    al_bl_st: U16<BigEndian>,
    nxt_cnid: U32<BigEndian>,
    free_bks: U16<BigEndian>,
    label_len: u8,
    label: [u8; 27],
    vol_bkup: U32<BigEndian>,
    vol_seq_num: U16<BigEndian>,
    wr_cnt: U32<BigEndian>,
    xt_clump_size: U32<BigEndian>,
    ct_clump_size: U32<BigEndian>,
    num_root_dirs: U16<BigEndian>,
    file_count: U32<BigEndian>,
    dir_count: U32<BigEndian>,
    finder_info: [u8; 32],
    embed_sig: [u8; 2],
    embed_startblock: U16<BigEndian>,
    embed_blockcount: U16<BigEndian>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct HfsPlusVolHeader {
    signature: [u8; 2],
    version: U16<BigEndian>,
    attributes: U32<BigEndian>,
    last_mount_vers: U32<BigEndian>,
    reserved: U32<BigEndian>,
    create_date: U32<BigEndian>,
    modify_date: U32<BigEndian>,
    backup_date: U32<BigEndian>,
    checked_date: U32<BigEndian>,
    file_count: U32<BigEndian>,
    folder_count: U32<BigEndian>,
    blocksize: U32<BigEndian>,
    total_blocks: U32<BigEndian>,
    free_blocks: U32<BigEndian>,
    next_alloc: U32<BigEndian>,
    rsrc_clump_sz: U32<BigEndian>,
    data_clump_sz: U32<BigEndian>,
    next_cnid: U32<BigEndian>,
    write_count: U32<BigEndian>,
    encodings_bmp: [u8; 8],
    finder_info: [u8; 32],
}

fn probe_hfs(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let mdb: HfsMdb = probe.read_as(HFS_MDB_OFFSET)?;

    if &mdb.embed_sig == b"H+" || &mdb.embed_sig == b"HX" {
        return Err(ProbeError::Invalid("embedded HFS+ volume, not plain hfs"));
    }

    let len = usize::from(mdb.label_len).min(mdb.label.len());
    if len > 0 {
        probe.set_label(&mdb.label[..len])?;
    }
    return Ok(());
}

fn probe_hfsplus(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let mdb: HfsMdb = probe.read_as(HFS_MDB_OFFSET)?;

    // follow an HFS wrapper to the embedded volume
    let mut off: u64 = 0;
    if &mdb.signature == b"BD" {
        if &mdb.embed_sig != b"H+" && &mdb.embed_sig != b"HX" {
            return Err(ProbeError::Invalid("HFS wrapper without embedded HFS+"));
        }
        off = u64::from(mdb.al_bl_st.get()) * 512
            + u64::from(mdb.embed_startblock.get()) * u64::from(mdb.al_blk_size.get());
    }

    let vh: HfsPlusVolHeader = probe.read_as(off + HFS_MDB_OFFSET)?;
    let valid = match &vh.signature {
        b"H+" => vh.version.get() == 4,
        b"HX" => vh.version.get() == 5,
        _ => false,
    };
    if !valid {
        return Err(ProbeError::Invalid("bad HFS+ volume header"));
    }

    let mut serial = [0u8; 8];
    serial.copy_from_slice(&vh.finder_info[24..32]);
    probe.set_uuid_str(&serial, &format!("{:016x}", u64::from_be_bytes(serial)))?;
    return Ok(());
}
