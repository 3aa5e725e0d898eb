use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const LSI_SIGNATURE: &[u8] = b"$XIDE$";

pub(crate) const LSIRAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "lsi_mega_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_lsi),
    magics: &[],
};

fn probe_lsi(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < 0x10000 {
        return Err(ProbeError::Invalid("device too small for lsi metadata"));
    }

    let off = ((size / 0x200) - 1) * 0x200;
    let buf = probe.get_buffer(off, LSI_SIGNATURE.len())?;
    if buf != LSI_SIGNATURE {
        return Err(ProbeError::Invalid("no lsi signature"));
    }
    return Ok(());
}
