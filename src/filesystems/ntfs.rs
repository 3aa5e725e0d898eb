use zerocopy::{
    byteorder::{LittleEndian, U16, U32, U64},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Endianness, Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};
use crate::util::is_power_2;

pub(crate) const NTFS_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "ntfs",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_ntfs),
    magics: &[ProbeMagic {
        magic: b"NTFS    ",
        kb_offset: 0,
        sb_offset: 3,
    }],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct NtfsSuperBlock {
    jump: [u8; 3],
    oem_id: [u8; 8],
    bytes_per_sector: U16<LittleEndian>,
    sectors_per_cluster: u8,
    reserved_sectors: U16<LittleEndian>,
    fats: u8,
    root_entries: U16<LittleEndian>,
    sectors: U16<LittleEndian>,
    media_type: u8,
    sectors_per_fat: U16<LittleEndian>,
    sectors_per_track: U16<LittleEndian>,
    heads: U16<LittleEndian>,
    hidden_sectors: U32<LittleEndian>,
    large_sectors: U32<LittleEndian>,
    unused: [u8; 4],
    number_of_sectors: U64<LittleEndian>,
    mft_cluster_location: U64<LittleEndian>,
    mft_mirror_cluster_location: U64<LittleEndian>,
    clusters_per_mft_record: i8,
    reserved1: [u8; 3],
    clusters_per_index_record: i8,
    reserved2: [u8; 3],
    volume_serial: [u8; 8],
    checksum: U32<LittleEndian>,
}

const MFT_RECORD_VOLUME: u64 = 3;
const MFT_RECORD_ATTR_VOLUME_NAME: u32 = 0x60;
const MFT_RECORD_ATTR_END: u32 = 0xffffffff;

fn get_u16_le(buf: &[u8], off: usize) -> Option<u16> {
    let bytes = buf.get(off..off + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn get_u32_le(buf: &[u8], off: usize) -> Option<u32> {
    let bytes = buf.get(off..off + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Pulls the volume label out of the resident VOLUME_NAME attribute of the
/// $Volume MFT record. Returns the raw UTF-16LE bytes.
fn volume_name(record: &[u8]) -> Option<Vec<u8>> {
    if record.get(0..4)? != b"FILE" {
        return None;
    }
    let mut attr_off = usize::from(get_u16_le(record, 20)?);

    loop {
        let attr_type = get_u32_le(record, attr_off)?;
        if attr_type == MFT_RECORD_ATTR_END {
            break;
        }
        let attr_len = get_u32_le(record, attr_off + 4)? as usize;
        if attr_len == 0 {
            break;
        }
        let non_resident = *record.get(attr_off + 8)?;

        if attr_type == MFT_RECORD_ATTR_VOLUME_NAME && non_resident == 0 {
            let value_len = get_u32_le(record, attr_off + 16)? as usize;
            let value_off = usize::from(get_u16_le(record, 20 + attr_off)?);
            let start = attr_off + value_off;
            return record.get(start..start + value_len).map(<[u8]>::to_vec);
        }
        attr_off += attr_len;
    }
    return None;
}

fn probe_ntfs(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let ns: NtfsSuperBlock = probe.read_as(0)?;

    // an NTFS BPB keeps all the FAT-era fields zeroed
    if ns.fats != 0
        || ns.root_entries.get() != 0
        || ns.sectors.get() != 0
        || ns.sectors_per_fat.get() != 0
        || ns.large_sectors.get() != 0
        || ns.number_of_sectors.get() == 0
    {
        return Err(ProbeError::Invalid("BPB is not NTFS-shaped"));
    }
    let sector_size = u64::from(ns.bytes_per_sector.get());
    if !is_power_2(sector_size) || !(256..=4096).contains(&sector_size) {
        return Err(ProbeError::Invalid("implausible sector size"));
    }
    if !is_power_2(u64::from(ns.sectors_per_cluster)) || ns.sectors_per_cluster > 128 {
        return Err(ProbeError::Invalid("implausible cluster size"));
    }

    let cluster_size = u64::from(ns.sectors_per_cluster) * sector_size;
    let mft_record_size: u64 = if ns.clusters_per_mft_record < 0 {
        let shift = -i32::from(ns.clusters_per_mft_record);
        if shift > 31 {
            return Err(ProbeError::Invalid("implausible MFT record size"));
        }
        1u64 << shift
    } else {
        u64::from(ns.clusters_per_mft_record as u8) * cluster_size
    };
    if !is_power_2(mft_record_size) || !(256..=65536).contains(&mft_record_size) {
        return Err(ProbeError::Invalid("implausible MFT record size"));
    }

    let volume_off =
        ns.mft_cluster_location.get() * cluster_size + MFT_RECORD_VOLUME * mft_record_size;

    // a missing or damaged $Volume record costs the label, nothing else
    let record = probe
        .get_buffer(volume_off, mft_record_size as usize)
        .map(<[u8]>::to_vec)
        .ok();
    if let Some(record) = record {
        if let Some(name) = volume_name(&record) {
            probe.set_utf8label(&name, Endianness::Little)?;
        }
    }

    probe.set_uuid_str(
        &ns.volume_serial,
        &format!("{:016X}", u64::from_le_bytes(ns.volume_serial)),
    )?;
    return Ok(());
}
