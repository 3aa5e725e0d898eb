use std::{
    fmt,
    fs::File,
    io::{Read, Seek, SeekFrom},
    mem::size_of,
};

use bitflags::bitflags;
use log::debug;
use rustix::fs::{fstat, FileType};
use thiserror::Error;
use uuid::Uuid;
use zerocopy::FromBytes;

use crate::ioctl::device_size_bytes;
use crate::util::{encode_to_utf8, is_ascii_space, read_full};
use crate::SigidError;

use crate::{
    containers::{luks::LUKS_IDINFO, lvm::LVM2_IDINFO},
    filesystems::{
        cramfs::CRAMFS_IDINFO,
        ext::{EXT2_IDINFO, EXT3_IDINFO, EXT4DEV_IDINFO, EXT4_IDINFO, JBD_IDINFO},
        gfs::{GFS2_IDINFO, GFS_IDINFO},
        hfs::{HFSPLUS_IDINFO, HFS_IDINFO},
        iso9660::ISO9660_IDINFO,
        jfs::JFS_IDINFO,
        ntfs::NTFS_IDINFO,
        ocfs::{OCFS2_IDINFO, OCFS_IDINFO, ORACLEASM_IDINFO},
        reiserfs::{REISER4_IDINFO, REISER_IDINFO},
        romfs::ROMFS_IDINFO,
        swap::{SWAP_IDINFO, SWSUSPEND_IDINFO},
        udf::UDF_IDINFO,
        vfat::VFAT_IDINFO,
        xfs::XFS_IDINFO,
    },
    raid::{
        adaptec::ADRAID_IDINFO, ddf::DDFRAID_IDINFO, isw::ISWRAID_IDINFO,
        jmicron::JMRAID_IDINFO, linux_raid::LINUXRAID_IDINFO, lsi::LSIRAID_IDINFO,
        nvidia::NVRAID_IDINFO, promise::PDCRAID_IDINFO, silicon::SILRAID_IDINFO,
        via::VIARAID_IDINFO,
    },
};

/// Size of the cached superblock window covering the start of the device.
/// Requests entirely below this boundary are served from one buffered read.
pub const SB_BUFSIZ: usize = 0x10000;

/// Upper bound on a single value payload.
pub const VALUE_BUFSIZ: usize = 128;

/// Value slots available per session.
pub const MAX_VALUES: usize = 16;

/// The signature registry. Order is part of the contract: RAID members and
/// containers come before filesystems so that a stale filesystem signature
/// on a member device never wins, and the filter bitmap indexes into this
/// exact sequence. Do not reorder.
pub static PROBES: &[ProbeIdinfo] = &[
    // RAID members and containers
    LINUXRAID_IDINFO,
    DDFRAID_IDINFO,
    ISWRAID_IDINFO,
    LSIRAID_IDINFO,
    VIARAID_IDINFO,
    SILRAID_IDINFO,
    NVRAID_IDINFO,
    PDCRAID_IDINFO,
    ADRAID_IDINFO,
    JMRAID_IDINFO,
    LVM2_IDINFO,
    LUKS_IDINFO,
    // Filesystems
    VFAT_IDINFO,
    SWSUSPEND_IDINFO,
    SWAP_IDINFO,
    XFS_IDINFO,
    EXT4DEV_IDINFO,
    EXT4_IDINFO,
    EXT3_IDINFO,
    EXT2_IDINFO,
    JBD_IDINFO,
    REISER_IDINFO,
    REISER4_IDINFO,
    JFS_IDINFO,
    UDF_IDINFO,
    ISO9660_IDINFO,
    HFSPLUS_IDINFO,
    HFS_IDINFO,
    NTFS_IDINFO,
    CRAMFS_IDINFO,
    ROMFS_IDINFO,
    GFS_IDINFO,
    GFS2_IDINFO,
    OCFS_IDINFO,
    OCFS2_IDINFO,
    ORACLEASM_IDINFO,
];

/// Returns true when `fstype` names a registry entry.
pub fn known_fstype(fstype: &str) -> bool {
    return PROBES.iter().any(|id| id.name == fstype);
}

/// Registry names, in probing order.
pub fn supported_types() -> impl Iterator<Item = &'static str> {
    return PROBES.iter().map(|id| id.name);
}

bitflags! {
    /// Attributes the caller asks a session to collect. Setters for
    /// attributes whose bit is off are no-ops.
    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
    pub struct ProbeRequest: u32 {
        /// Cooked (trimmed, transcoded) label.
        const LABEL = 1 << 1;
        /// Label bytes exactly as stored on disk.
        const LABEL_RAW = 1 << 2;
        /// Cooked lower-case hex UUID.
        const UUID = 1 << 3;
        /// UUID bytes exactly as stored on disk.
        const UUID_RAW = 1 << 4;
        /// Registry name of the matched format.
        const TYPE = 1 << 5;
        /// Usage class as text.
        const USAGE = 1 << 6;
        /// Format version.
        const VERSION = 1 << 7;
    }

    /// Coarse taxonomy of a format descriptor.
    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
    pub struct UsageFlags: u32 {
        /// Mountable filesystem.
        const FILESYSTEM = 1 << 1;
        /// RAID member superblock.
        const RAID = 1 << 2;
        /// Encrypted container.
        const CRYPTO = 1 << 3;
        /// Everything else (swap, suspend images, ..).
        const OTHER = 1 << 4;
    }
}

/// Polarity of a filter constructor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FilterMode {
    /// Probe only the named/matched descriptors.
    OnlyIn,
    /// Probe everything but the named/matched descriptors.
    NotIn,
}

/// Byte order of on-disk UTF-16 text.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Endianness {
    /// UTF-16LE.
    Little,
    /// UTF-16BE.
    Big,
}

/// A literal byte pattern at a fixed device offset. The pattern matches
/// when the bytes at `kb_offset * 1024 + sb_offset` equal `magic`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProbeMagic {
    /// Pattern to compare.
    pub magic: &'static [u8],
    /// Coarse offset in kibibytes from the device window origin.
    pub kb_offset: u64,
    /// Fine byte offset added to `kb_offset`.
    pub sb_offset: u64,
}

/// Per-format parser. Receives the session and the magic rule that matched
/// (`None` for descriptors without magics). `Ok(())` accepts the
/// descriptor, any `Err` rejects it and iteration moves on.
pub type ProbeFn = fn(&mut Probe, Option<&ProbeMagic>) -> Result<(), ProbeError>;

/// Immutable registry entry describing one on-disk format.
#[derive(Debug, Copy, Clone)]
pub struct ProbeIdinfo {
    /// Short identifier, e.g. "ext4", "LVM2_member".
    pub name: &'static str,
    /// Usage class.
    pub usage: UsageFlags,
    /// Structural validator and attribute extractor. A descriptor without
    /// one matches on magic alone.
    pub probe_fn: Option<ProbeFn>,
    /// Magic pre-checks, tried in order. Empty means the parser does its
    /// own detection.
    pub magics: &'static [ProbeMagic],
}

/// Errors surfaced to parsers. `step()` consumes them: a failing
/// descriptor is skipped, never fatal to the session.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Seek or read on the underlying device failed.
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),
    /// No device is bound to the session.
    #[error("no device bound to the probe")]
    NoDevice,
    /// The requested range reaches past the readable device window.
    #[error("read past the end of the device")]
    OutOfRange,
    /// Structural validation rejected the superblock.
    #[error("superblock rejected: {0}")]
    Invalid(&'static str),
    /// All value slots are taken.
    #[error("value slots exhausted")]
    ValuesFull,
}

/// Outcome of one iteration step.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ProbeStatus {
    /// A descriptor matched; collected values are available until the next
    /// `step()`.
    Match,
    /// No further descriptor matches.
    Exhausted,
}

/// One collected attribute: an interned name and a bounded payload.
#[derive(Clone)]
pub struct ProbeValue {
    name: &'static str,
    data: [u8; VALUE_BUFSIZ],
    len: usize,
}

impl ProbeValue {
    /// Attribute name, e.g. "TYPE", "UUID", "LABEL".
    #[inline]
    pub fn name(&self) -> &'static str {
        return self.name;
    }

    /// Meaningful payload bytes. Text values keep their terminating NUL
    /// when the producing setter counts it (see `set_label`).
    #[inline]
    pub fn data(&self) -> &[u8] {
        return &self.data[..self.len];
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        return self.len;
    }

    /// True when the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    /// Payload as UTF-8 text with any terminating NUL stripped. `None` for
    /// raw values that are not valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        let data = self.data();
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        return std::str::from_utf8(&data[..end]).ok();
    }
}

impl fmt::Debug for ProbeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeValue")
            .field("name", &self.name)
            .field("data", &self.data())
            .field("len", &self.len)
            .finish()
    }
}

/// A single probe operation: device binding, buffers, filter, request
/// mask, iteration cursor and collected values.
///
/// The session owns its buffers and filter bitmap, and the bound `File`
/// handle (dropped on rebind). It holds no other process-wide state; the
/// descriptor registry is read-only.
#[derive(Debug, Default)]
pub struct Probe {
    file: Option<File>,
    offset: u64,
    size: u64,

    sb_buf: Option<Box<[u8]>>,
    sb_len: usize,

    buf: Vec<u8>,
    buf_off: u64,
    buf_len: usize,

    filter: Option<Box<[u64]>>,
    request: ProbeRequest,
    cursor: usize,
    values: Vec<ProbeValue>,
}

impl Probe {
    /// Creates an unbound session. Without a device every `step()`
    /// exhausts immediately.
    pub fn new() -> Probe {
        return Probe::default();
    }

    /// Binds a device window: an opened file or block device, a base
    /// offset, and a size in bytes. A zero `size` is queried from the
    /// handle (`BLKGETSIZE64` for block devices, `st_size` otherwise) and
    /// left as "unknown" when the query fails. Binding clears buffers and
    /// values and restarts iteration at the first descriptor.
    pub fn set_device(&mut self, file: File, offset: u64, size: u64) {
        self.reset_buffers();
        self.values.clear();
        self.cursor = 0;
        self.offset = offset;
        self.size = if size != 0 {
            size
        } else {
            Self::query_size(&file).unwrap_or(0)
        };
        self.file = Some(file);

        // Prime the window so an unreadable device surfaces early. Not an
        // error: each magic fetch fails cleanly and the walk exhausts.
        if let Err(err) = self.get_buffer(0, 0x200) {
            debug!("device window priming failed: {err}");
        }
    }

    fn query_size(file: &File) -> Option<u64> {
        let stat = fstat(file).ok()?;
        if FileType::from_raw_mode(stat.st_mode).is_block_device() {
            return device_size_bytes(file).ok();
        }
        return u64::try_from(stat.st_size).ok();
    }

    /// Selects the attributes to collect on a match.
    pub fn set_request(&mut self, request: ProbeRequest) {
        self.request = request;
    }

    /// Current request mask.
    #[inline]
    pub fn request(&self) -> ProbeRequest {
        return self.request;
    }

    /// Base offset of the bound window.
    #[inline]
    pub fn offset(&self) -> u64 {
        return self.offset;
    }

    /// Size of the bound window in bytes; 0 when unknown.
    #[inline]
    pub fn size(&self) -> u64 {
        return self.size;
    }

    /// Clears buffers and collected values and restarts iteration. The
    /// device binding, request mask and filter are kept.
    pub fn reset(&mut self) {
        self.reset_buffers();
        self.values.clear();
        self.cursor = 0;
    }

    fn reset_buffers(&mut self) {
        self.sb_len = 0;
        self.buf_off = 0;
        self.buf_len = 0;
        if let Some(sb) = self.sb_buf.as_mut() {
            sb.fill(0);
        }
        self.buf.fill(0);
    }

    /// Fetches `len` bytes at byte offset `off` relative to the device
    /// window origin.
    ///
    /// Requests with `off + len <= SB_BUFSIZ` are served from a cached
    /// window filled once per binding; a window shorter than the request
    /// (small or unreadable device) fails the fetch. Larger requests go
    /// through an on-demand extent buffer sized to the request, refilled
    /// whenever the wanted range is not already contained; a short read
    /// there is an error. The returned slice is valid until the next
    /// `get_buffer` call with different parameters.
    pub fn get_buffer(&mut self, off: u64, len: usize) -> Result<&[u8], ProbeError> {
        let end = off
            .checked_add(len as u64)
            .ok_or(ProbeError::OutOfRange)?;
        if self.size != 0 && end > self.size {
            return Err(ProbeError::OutOfRange);
        }
        let file = self.file.as_mut().ok_or(ProbeError::NoDevice)?;

        if end <= SB_BUFSIZ as u64 {
            let sb = self
                .sb_buf
                .get_or_insert_with(|| vec![0u8; SB_BUFSIZ].into_boxed_slice());
            if self.sb_len == 0 {
                file.seek(SeekFrom::Start(self.offset))?;
                self.sb_len = read_full(file, sb)?;
            }
            if end as usize > self.sb_len {
                return Err(ProbeError::OutOfRange);
            }
            return Ok(&sb[off as usize..end as usize]);
        }

        let mut refill = false;
        if len > self.buf.len() {
            self.buf = vec![0u8; len];
            self.buf_off = 0;
            self.buf_len = 0;
            refill = true;
        }
        if refill || off < self.buf_off || end > self.buf_off + self.buf_len as u64 {
            file.seek(SeekFrom::Start(self.offset + off))?;
            file.read_exact(&mut self.buf[..len])?;
            self.buf_off = off;
            self.buf_len = len;
        }
        let start = (off - self.buf_off) as usize;
        return Ok(&self.buf[start..start + len]);
    }

    /// Reads a `#[repr(C)]` structure at `off` through `get_buffer`.
    pub(crate) fn read_as<T: FromBytes>(&mut self, off: u64) -> Result<T, ProbeError> {
        let buf = self.get_buffer(off, size_of::<T>())?;
        return T::read_from_bytes(buf).map_err(|_| ProbeError::Invalid("structure out of bounds"));
    }

    fn magic_matches(&mut self, mag: &ProbeMagic) -> bool {
        let idx = mag.kb_offset + (mag.sb_offset >> 10);
        let within = (mag.sb_offset & 0x3ff) as usize;
        match self.get_buffer(idx << 10, 1024) {
            Ok(buf) => buf
                .get(within..within + mag.magic.len())
                .is_some_and(|window| window == mag.magic),
            Err(err) => {
                debug!("magic window at {:#x} unreadable: {err}", idx << 10);
                false
            }
        }
    }

    /// Advances the iteration: walks the registry from the cursor, applies
    /// the filter, runs magic checks and parsers, and on a match collects
    /// the requested values and stops so they can be read.
    ///
    /// Calling `step()` again resumes after the matched descriptor, so
    /// co-existing signatures (e.g. a CD carrying both udf and iso9660)
    /// come out one match per call, in registry order, followed by
    /// `Exhausted`. Touching the filter or rebinding the device restarts
    /// the walk; doing so mid-iteration is a caller bug.
    pub fn step(&mut self) -> ProbeStatus {
        self.values.clear();

        while self.cursor < PROBES.len() {
            let i = self.cursor;
            self.cursor += 1;

            if self.filter_has(i) {
                continue;
            }
            let id = &PROBES[i];

            let mut hit: Option<&'static ProbeMagic> = None;
            if !id.magics.is_empty() {
                hit = id.magics.iter().find(|mag| self.magic_matches(mag));
                if hit.is_none() {
                    continue;
                }
            }

            if let Some(probe_fn) = id.probe_fn {
                if let Err(err) = probe_fn(self, hit) {
                    debug!("{} rejected: {err}", id.name);
                    continue;
                }
            }

            if self.request.contains(ProbeRequest::TYPE) {
                let _ = self.set_value_terminated("TYPE", id.name);
            }
            if self.request.contains(ProbeRequest::USAGE) {
                let _ = self.set_usage(id.usage);
            }
            debug!("matched {} at registry index {i}", id.name);
            return ProbeStatus::Match;
        }

        self.cursor = PROBES.len();
        return ProbeStatus::Exhausted;
    }

    /* filter */

    fn filter_has(&self, item: usize) -> bool {
        match &self.filter {
            Some(bmp) => bmp[item / 64] & (1u64 << (item % 64)) != 0,
            None => false,
        }
    }

    fn fresh_filter(&mut self) -> &mut [u64] {
        let words = PROBES.len().div_ceil(64);
        let bmp = self
            .filter
            .get_or_insert_with(|| vec![0u64; words].into_boxed_slice());
        bmp.fill(0);
        return bmp;
    }

    fn filter_touched(&mut self) {
        self.cursor = 0;
        self.values.clear();
    }

    /// Clears every filter bit (all descriptors probed again). Keeps the
    /// bitmap allocated. Restarts iteration.
    pub fn reset_filter(&mut self) {
        if let Some(bmp) = self.filter.as_mut() {
            bmp.fill(0);
        }
        self.filter_touched();
    }

    /// Installs a filter over descriptor names: `OnlyIn` probes only the
    /// listed names, `NotIn` probes everything else. Restarts iteration.
    pub fn filter_types(&mut self, mode: FilterMode, names: &[&str]) {
        let bmp = self.fresh_filter();
        for (i, id) in PROBES.iter().enumerate() {
            let has = names.iter().any(|n| *n == id.name);
            let skip = match mode {
                FilterMode::OnlyIn => !has,
                FilterMode::NotIn => has,
            };
            if skip {
                bmp[i / 64] |= 1 << (i % 64);
            }
        }
        self.filter_touched();
    }

    /// Installs a filter over usage classes, same polarities as
    /// `filter_types`. Restarts iteration.
    pub fn filter_usage(&mut self, mode: FilterMode, usage: UsageFlags) {
        let bmp = self.fresh_filter();
        for (i, id) in PROBES.iter().enumerate() {
            let has = id.usage.intersects(usage);
            let skip = match mode {
                FilterMode::OnlyIn => !has,
                FilterMode::NotIn => has,
            };
            if skip {
                bmp[i / 64] |= 1 << (i % 64);
            }
        }
        self.filter_touched();
    }

    /// Flips every filter bit. Fails when no filter is installed.
    /// Restarts iteration.
    pub fn invert_filter(&mut self) -> Result<(), SigidError> {
        let bmp = self
            .filter
            .as_mut()
            .ok_or(SigidError::Argument("no filter installed"))?;
        for word in bmp.iter_mut() {
            *word = !*word;
        }
        self.filter_touched();
        return Ok(());
    }

    /* value store */

    /// Number of values collected by the last `step()`.
    #[inline]
    pub fn num_values(&self) -> usize {
        return self.values.len();
    }

    /// Positional value access.
    pub fn get_value(&self, num: usize) -> Option<&ProbeValue> {
        return self.values.get(num);
    }

    /// First value with the given name.
    pub fn lookup_value(&self, name: &str) -> Option<&ProbeValue> {
        return self.values.iter().find(|v| v.name == name);
    }

    /// True when a value with the given name was collected.
    pub fn has_value(&self, name: &str) -> bool {
        return self.lookup_value(name).is_some();
    }

    /// Collected values in emission order.
    pub fn values(&self) -> impl Iterator<Item = &ProbeValue> {
        return self.values.iter();
    }

    fn assign_value(&mut self, name: &'static str) -> Result<&mut ProbeValue, ProbeError> {
        if self.values.len() >= MAX_VALUES {
            return Err(ProbeError::ValuesFull);
        }
        self.values.push(ProbeValue {
            name,
            data: [0; VALUE_BUFSIZ],
            len: 0,
        });
        let n = self.values.len() - 1;
        return Ok(&mut self.values[n]);
    }

    /// Stores raw bytes under `name`, silently truncated to
    /// [`VALUE_BUFSIZ`].
    pub fn set_value(&mut self, name: &'static str, data: &[u8]) -> Result<(), ProbeError> {
        let len = data.len().min(VALUE_BUFSIZ);
        let v = self.assign_value(name)?;
        v.data[..len].copy_from_slice(&data[..len]);
        v.len = len;
        return Ok(());
    }

    fn set_value_terminated(&mut self, name: &'static str, text: &str) -> Result<(), ProbeError> {
        let bytes = text.as_bytes();
        let len = bytes.len().min(VALUE_BUFSIZ - 1);
        let v = self.assign_value(name)?;
        v.data[..len].copy_from_slice(&bytes[..len]);
        v.data[len] = 0;
        v.len = len + 1;
        return Ok(());
    }

    fn set_usage(&mut self, usage: UsageFlags) -> Result<(), ProbeError> {
        let text = if usage.contains(UsageFlags::FILESYSTEM) {
            "filesystem"
        } else if usage.contains(UsageFlags::RAID) {
            "raid"
        } else if usage.contains(UsageFlags::CRYPTO) {
            "crypto"
        } else if usage.contains(UsageFlags::OTHER) {
            "other"
        } else {
            "unknown"
        };
        return self.set_value_terminated("USAGE", text);
    }

    /// Stores a pre-formatted VERSION value; no-op unless requested.
    pub fn set_version(&mut self, version: &str) -> Result<(), ProbeError> {
        if self.request.contains(ProbeRequest::VERSION) {
            return self.set_value_terminated("VERSION", version);
        }
        return Ok(());
    }

    /// Stores a label from raw on-disk bytes. Emits `LABEL_RAW` first when
    /// requested, then the cooked `LABEL`: NUL-terminated with trailing
    /// ASCII whitespace stripped, reported length counting the terminator.
    pub fn set_label(&mut self, label: &[u8]) -> Result<(), ProbeError> {
        if self.request.contains(ProbeRequest::LABEL_RAW) {
            self.set_value("LABEL_RAW", label)?;
        }
        if !self.request.contains(ProbeRequest::LABEL) {
            return Ok(());
        }
        let take = label.len().min(VALUE_BUFSIZ - 1);
        let v = self.assign_value("LABEL")?;
        v.data[..take].copy_from_slice(&label[..take]);
        v.data[take] = 0;

        let mut end = v.data[..take].iter().position(|&b| b == 0).unwrap_or(take);
        while end > 0 && is_ascii_space(v.data[end - 1]) {
            end -= 1;
        }
        v.data[end] = 0;
        v.len = end + 1;
        return Ok(());
    }

    /// Stores a label from on-disk UTF-16 text, transcoded to UTF-8 and
    /// trimmed of trailing ASCII whitespace. Emits `LABEL_RAW` (original
    /// bytes) first when requested. The reported length excludes the
    /// terminating NUL, unlike `set_label`.
    pub fn set_utf8label(&mut self, label: &[u8], endian: Endianness) -> Result<(), ProbeError> {
        if self.request.contains(ProbeRequest::LABEL_RAW) {
            self.set_value("LABEL_RAW", label)?;
        }
        if !self.request.contains(ProbeRequest::LABEL) {
            return Ok(());
        }
        let v = self.assign_value("LABEL")?;
        let mut n = encode_to_utf8(endian, &mut v.data, label);
        while n > 0 && is_ascii_space(v.data[n - 1]) {
            n -= 1;
        }
        v.data[n] = 0;
        v.len = n;
        return Ok(());
    }

    /// Stores a DCE UUID in canonical 8-4-4-4-12 lower-case hex form, with
    /// `UUID_RAW` (the 16 raw bytes) first when requested. An all-zero
    /// UUID stores nothing.
    pub fn set_uuid(&mut self, uuid: &[u8; 16]) -> Result<(), ProbeError> {
        return self.set_uuid_as(uuid, None);
    }

    /// Like `set_uuid`, but an explicit `name` (e.g. "EXT_JOURNAL") stores
    /// the value under that name unconditionally, bypassing the request
    /// mask and the raw variant.
    pub fn set_uuid_as(
        &mut self,
        uuid: &[u8; 16],
        name: Option<&'static str>,
    ) -> Result<(), ProbeError> {
        if uuid.iter().all(|&b| b == 0) {
            return Ok(());
        }
        let name = match name {
            Some(n) => n,
            None => {
                if self.request.contains(ProbeRequest::UUID_RAW) {
                    self.set_value("UUID_RAW", uuid)?;
                }
                if !self.request.contains(ProbeRequest::UUID) {
                    return Ok(());
                }
                "UUID"
            }
        };
        return self.set_value_terminated(name, &Uuid::from_bytes(*uuid).to_string());
    }

    /// Stores a non-DCE UUID (e.g. a FAT or NTFS serial) from its raw
    /// bytes and a pre-formatted rendering. `A`-`F` in the rendering are
    /// lower-cased in place; all-zero raw bytes store nothing.
    pub fn set_uuid_str(&mut self, raw: &[u8], formatted: &str) -> Result<(), ProbeError> {
        if raw.iter().all(|&b| b == 0) {
            return Ok(());
        }
        if self.request.contains(ProbeRequest::UUID_RAW) {
            self.set_value("UUID_RAW", raw)?;
        }
        if !self.request.contains(ProbeRequest::UUID) {
            return Ok(());
        }
        self.set_value_terminated("UUID", formatted)?;
        let n = self.values.len() - 1;
        let v = &mut self.values[n];
        for b in v.data[..v.len].iter_mut() {
            if matches!(*b, b'A'..=b'F') {
                *b = *b - b'A' + b'a';
            }
        }
        return Ok(());
    }
}
