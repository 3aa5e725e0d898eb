use zerocopy::{
    byteorder::{LittleEndian, U32, U64},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

/*
 * The LABELONE label header sits in one of the first four sectors; the
 * magic rules cover all four positions and point at the type field 24
 * bytes into the header.
 */

const LVM2_LABEL_TYPE_OFFSET: u64 = 0x18;

const fn lvm2_magic(kb: u64, sb: u64) -> ProbeMagic {
    ProbeMagic {
        magic: b"LVM2 001",
        kb_offset: kb,
        sb_offset: sb,
    }
}

pub(crate) const LVM2_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "LVM2_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_lvm2),
    magics: &[
        lvm2_magic(0, 0x218),
        lvm2_magic(0, 0x018),
        lvm2_magic(1, 0x018),
        lvm2_magic(1, 0x218),
    ],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct Lvm2LabelHeader {
    id: [u8; 8],
    sector_xl: U64<LittleEndian>,
    crc_xl: U32<LittleEndian>,
    offset_xl: U32<LittleEndian>,
    label_type: [u8; 8],
    pv_uuid: [u8; 32],
}

fn probe_lvm2(probe: &mut Probe, mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let mag = mag.ok_or(ProbeError::Invalid("LVM2 needs a matched magic"))?;
    let label_off = mag.kb_offset * 1024 + mag.sb_offset - LVM2_LABEL_TYPE_OFFSET;

    let label: Lvm2LabelHeader = probe.read_as(label_off)?;
    if &label.id != b"LABELONE" {
        return Err(ProbeError::Invalid("no LABELONE header"));
    }
    if label.sector_xl.get() != label_off / 512 {
        return Err(ProbeError::Invalid("label sector number does not match"));
    }

    let uuid = std::str::from_utf8(&label.pv_uuid)
        .map_err(|_| ProbeError::Invalid("PV uuid is not ASCII"))?;
    if !uuid.is_ascii() {
        return Err(ProbeError::Invalid("PV uuid is not ASCII"));
    }

    // render the 32-character PV uuid in its 6-4-4-4-4-4-6 form
    let text = format!(
        "{}-{}-{}-{}-{}-{}-{}",
        &uuid[0..6],
        &uuid[6..10],
        &uuid[10..14],
        &uuid[14..18],
        &uuid[18..22],
        &uuid[22..26],
        &uuid[26..32]
    );
    probe.set_uuid_str(&label.pv_uuid, &text)?;
    return Ok(());
}
