use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const ISO_SUPERBLOCK_OFFSET: u64 = 0x8000;

pub(crate) const ISO9660_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "iso9660",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_iso9660),
    magics: &[
        ProbeMagic {
            magic: b"CD001",
            kb_offset: 32,
            sb_offset: 1,
        },
        // High Sierra
        ProbeMagic {
            magic: b"CDROM",
            kb_offset: 32,
            sb_offset: 9,
        },
    ],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct IsoVolumeDescriptor {
    vd_type: u8,
    vd_id: [u8; 5],
    vd_version: u8,
    flags: u8,
    system_id: [u8; 32],
    volume_id: [u8; 32],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct HighSierraVolumeDescriptor {
    foo: [u8; 8],
    vd_type: u8,
    vd_id: [u8; 5],
    vd_version: u8,
    unused1: u8,
    system_id: [u8; 32],
    volume_id: [u8; 32],
}

fn probe_iso9660(probe: &mut Probe, mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let high_sierra = mag.is_some_and(|m| m.magic == b"CDROM");

    let label = if high_sierra {
        let hs: HighSierraVolumeDescriptor = probe.read_as(ISO_SUPERBLOCK_OFFSET)?;
        hs.volume_id
    } else {
        let iso: IsoVolumeDescriptor = probe.read_as(ISO_SUPERBLOCK_OFFSET)?;
        iso.volume_id
    };

    probe.set_label(&label)?;
    return Ok(());
}
