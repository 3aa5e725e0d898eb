use crate::probe::{Probe, ProbeError, ProbeIdinfo, ProbeMagic, UsageFlags};

const PDC_SIGNATURE: &[u8] = b"Promise Technology, Inc.";

/// Candidate superblock positions, in sectors back from the device end.
const PDC_SECTORS: [u64; 13] = [63, 255, 256, 16, 399, 591, 675, 735, 911, 974, 991, 951, 3087];

pub(crate) const PDCRAID_IDINFO: ProbeIdinfo = ProbeIdinfo {
    name: "promise_fasttrack_raid_member",
    usage: UsageFlags::RAID,
    probe_fn: Some(probe_promise),
    magics: &[],
};

fn probe_promise(probe: &mut Probe, _mag: Option<&ProbeMagic>) -> Result<(), ProbeError> {
    let size = probe.size();
    if size < 0x10000 {
        return Err(ProbeError::Invalid("device too small for promise metadata"));
    }

    let total_sectors = size / 0x200;
    for back in PDC_SECTORS {
        if back >= total_sectors {
            continue;
        }
        let off = (total_sectors - back) * 0x200;
        if let Ok(buf) = probe.get_buffer(off, PDC_SIGNATURE.len()) {
            if buf == PDC_SIGNATURE {
                return Ok(());
            }
        }
    }
    return Err(ProbeError::Invalid("no promise signature"));
}
