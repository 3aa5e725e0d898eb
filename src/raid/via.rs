use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const VIA_SIGNATURE: u16 = 0xAA55;
/// Bytes covered by the trailing checksum byte.
const VIA_CHECKSUM_LEN: usize = 50;

pub(crate) const VIARAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "via_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_via),
    magics: &[],
};

fn probe_via(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < 0x10000 {
        return Err(ProbeError::Invalid("device too small for via metadata"));
    }

    let off = ((size / 0x200) - 1) * 0x200;
    let buf = probe.get_buffer(off, VIA_CHECKSUM_LEN + 1)?;

    if u16::from_le_bytes([buf[0], buf[1]]) != VIA_SIGNATURE {
        return Err(ProbeError::Invalid("no via signature"));
    }
    let version = buf[2];

    let sum = buf[..VIA_CHECKSUM_LEN]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b));
    if sum != buf[VIA_CHECKSUM_LEN] {
        return Err(ProbeError::Invalid("via checksum mismatch"));
    }

    probe.set_version(&format!("{version}"))?;
    return Ok(());
}
