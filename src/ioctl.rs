use std::os::fd::AsFd;

/// Total size in bytes of a block device, `BLKGETSIZE64`.
#[cfg(target_os = "linux")]
#[inline]
pub(crate) fn device_size_bytes<Fd: AsFd>(fd: Fd) -> rustix::io::Result<u64> {
    use linux_raw_sys::ioctl::BLKGETSIZE64;
    use rustix::ioctl::{ioctl, Getter};

    unsafe {
        let ctl = Getter::<{ BLKGETSIZE64 }, u64>::new();
        ioctl(fd, ctl)
    }
}

#[cfg(not(target_os = "linux"))]
#[inline]
pub(crate) fn device_size_bytes<Fd: AsFd>(_fd: Fd) -> rustix::io::Result<u64> {
    Err(rustix::io::Errno::NOTSUP)
}
