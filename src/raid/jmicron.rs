use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const JM_SIGNATURE: &[u8] = b"JM";
const JM_METADATA_LEN: usize = 512;

pub(crate) const JMRAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "jmicron_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_jmicron),
    magics: &[],
};

fn probe_jmicron(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < 0x10000 {
        return Err(ProbeError::Invalid("device too small for jmicron metadata"));
    }

    let off = ((size / 0x200) - 1) * 0x200;
    let buf = probe.get_buffer(off, JM_METADATA_LEN)?;

    if &buf[..2] != JM_SIGNATURE {
        return Err(ProbeError::Invalid("no jmicron signature"));
    }
    let minor = buf[2];
    let major = buf[3];

    // the stored checksum word makes the 16-bit sum of the sector zero
    let sum = buf
        .chunks_exact(2)
        .fold(0u16, |acc, c| acc.wrapping_add(u16::from_le_bytes([c[0], c[1]])));
    if sum != 0 {
        return Err(ProbeError::Invalid("jmicron checksum mismatch"));
    }

    probe.set_version(&format!("{major}.{minor}"))?;
    return Ok(());
}
