use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

/*
 * The volume recognition sequence starts at 32 KiB in 2 KiB steps. An
 * image without an NSR02/NSR03 descriptor in the sequence is plain
 * iso9660 territory and gets rejected here.
 */

const UDF_VSD_OFFSET: u64 = 0x8000;
const UDF_VSD_STEP: u64 = 0x800;
const UDF_VSD_MAX: u64 = 64;

const fn vsd_magic(magic: &'static [u8]) -> ProbeMagic {
    ProbeMagic {
        magic,
        kb_offset: 32,
        sb_offset: 1,
    }
}

pub(crate) const UDF_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "udf",
    usage: UsageFlags::FILESYSTEM,
    probe_fn: Some(probe_udf),
    magics: &[
        vsd_magic(b"BEA01"),
        vsd_magic(b"BOOT2"),
        vsd_magic(b"CD001"),
        vsd_magic(b"CDW02"),
        vsd_magic(b"NSR02"),
        vsd_magic(b"NSR03"),
        vsd_magic(b"TEA01"),
    ],
};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
struct VolumeStructureDescriptor {
    vsd_type: u8,
    vsd_id: [u8; 5],
    vsd_version: u8,
}

fn probe_udf(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    for b in 0..UDF_VSD_MAX {
        let vsd: VolumeStructureDescriptor = probe.read_as(UDF_VSD_OFFSET + b * UDF_VSD_STEP)?;

        match &vsd.vsd_id {
            b"NSR02" | b"NSR03" => return Ok(()),
            b"BEA01" | b"BOOT2" | b"CD001" | b"CDW02" | b"TEA01" => continue,
            _ => break,
        }
    }
    return Err(ProbeError::Invalid("no NSR descriptor in the sequence"));
}
