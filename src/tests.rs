use std::io::{Seek, SeekFrom, Write};

use crate::{
    known_fstype, supported_types, Endianness, FilterMode, Probe, ProbeRequest, ProbeStatus,
    UsageFlags, MAX_VALUES, PROBES,
};

fn image_probe(data: &[u8], request: ProbeRequest) -> Probe {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(data).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let mut probe = Probe::new();
    probe.set_device(file, 0, 0);
    probe.set_request(request);
    probe
}

fn match_sequence(probe: &mut Probe) -> Vec<String> {
    let mut types = Vec::new();
    while probe.step() == ProbeStatus::Match {
        let t = probe.lookup_value("TYPE").unwrap().text().unwrap().to_string();
        types.push(t);
    }
    types
}

fn put(image: &mut [u8], off: usize, bytes: &[u8]) {
    image[off..off + bytes.len()].copy_from_slice(bytes);
}

/// 32 KiB FAT16 image with a structurally valid BPB, an empty root
/// directory, a BPB label and a serial number.
fn fat16_image() -> Vec<u8> {
    let mut img = vec![0u8; 32 * 1024];
    put(&mut img, 3, b"MSDOS5.0"); // oem id
    put(&mut img, 11, &512u16.to_le_bytes()); // sector size
    img[13] = 4; // sectors per cluster
    put(&mut img, 14, &1u16.to_le_bytes()); // reserved sectors
    img[16] = 2; // fat count
    put(&mut img, 17, &512u16.to_le_bytes()); // root dir entries
    put(&mut img, 19, &64u16.to_le_bytes()); // total sectors
    img[21] = 0xF8; // media byte
    put(&mut img, 22, &1u16.to_le_bytes()); // sectors per fat
    img[38] = 0x29; // ext boot signature
    put(&mut img, 39, &[0x12, 0x34, 0x56, 0x78]); // serial
    put(&mut img, 43, b"TESTLABEL  ");
    put(&mut img, 0x36, b"FAT16   ");
    put(&mut img, 0x1fe, &[0x55, 0xAA]);
    img
}

/// 16 KiB image with an ext4 superblock at byte 1024.
fn ext4_image() -> Vec<u8> {
    let mut img = vec![0u8; 16 * 1024];
    let sb = 1024;
    put(&mut img, sb + 0x38, &[0x53, 0xEF]); // magic
    put(&mut img, sb + 0x3e, &0u16.to_le_bytes()); // minor rev
    put(&mut img, sb + 0x4c, &1u32.to_le_bytes()); // rev level
    put(&mut img, sb + 0x5c, &0x0004u32.to_le_bytes()); // compat: has_journal
    put(&mut img, sb + 0x60, &0x0042u32.to_le_bytes()); // incompat: filetype | extents
    put(&mut img, sb + 0x64, &0u32.to_le_bytes()); // ro_compat
    put(
        &mut img,
        sb + 0x68,
        &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16],
    );
    put(&mut img, sb + 0x78, b"extvol");
    img
}

/// 40 KiB CD image carrying a udf recognition sequence and an iso9660
/// primary volume descriptor at the same 32 KiB anchor.
fn cd_image() -> Vec<u8> {
    let mut img = vec![0u8; 40 * 1024];
    // PVD doubling as the first VSD of the udf sequence
    img[0x8000] = 0x01;
    put(&mut img, 0x8001, b"CD001");
    img[0x8006] = 0x01;
    put(&mut img, 0x8028, b"UDFDISC                         ");
    // NSR anchor and terminator
    put(&mut img, 0x8801, b"NSR02");
    put(&mut img, 0x9001, b"TEA01");
    img
}

/// 4 KiB LUKS1 header image.
fn luks_image() -> Vec<u8> {
    let mut img = vec![0u8; 4 * 1024];
    put(&mut img, 0, b"LUKS\xba\xbe");
    put(&mut img, 6, &1u16.to_be_bytes());
    put(&mut img, 8, b"aes");
    put(&mut img, 168, b"A1b2C3d4-0000-4444-8888-deadbeef0001");
    img
}

/// 16 KiB swap v1 image for a 4 KiB page size.
fn swap_image() -> Vec<u8> {
    let mut img = vec![0u8; 16 * 1024];
    put(&mut img, 4096 - 10, b"SWAPSPACE2");
    put(&mut img, 1024, &1u32.to_le_bytes()); // version
    put(&mut img, 1028, &3u32.to_le_bytes()); // last page
    put(
        &mut img,
        1036,
        &[0xAA, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 0xBB],
    );
    put(&mut img, 1052, b"swaplab");
    img
}

#[test]
fn empty_image_exhausts() {
    let mut probe = image_probe(&vec![0u8; 1024 * 1024], ProbeRequest::all());
    assert_eq!(probe.step(), ProbeStatus::Exhausted);
    assert_eq!(probe.num_values(), 0);
    // exhaustion is stable
    assert_eq!(probe.step(), ProbeStatus::Exhausted);
}

#[test]
fn vfat_type_label_and_serial() {
    let request = ProbeRequest::TYPE | ProbeRequest::LABEL | ProbeRequest::UUID;
    let mut probe = image_probe(&fat16_image(), request);

    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("TYPE").unwrap().text(), Some("vfat"));
    assert_eq!(probe.lookup_value("LABEL").unwrap().text(), Some("TESTLABEL"));
    assert_eq!(probe.lookup_value("UUID").unwrap().text(), Some("7856-3412"));
    assert_eq!(probe.num_values(), 3);
    assert_eq!(probe.step(), ProbeStatus::Exhausted);
}

#[test]
fn vfat_serial_is_lower_case() {
    let request = ProbeRequest::UUID;
    let mut probe = image_probe(&fat16_image(), request);

    assert_eq!(probe.step(), ProbeStatus::Match);
    let uuid = probe.lookup_value("UUID").unwrap();
    assert!(!uuid.data().iter().any(|b| (b'A'..=b'F').contains(b)));
}

#[test]
fn utf16le_label_trims_cooked_keeps_raw() {
    let mut probe = Probe::new();
    probe.set_request(ProbeRequest::LABEL | ProbeRequest::LABEL_RAW);

    let raw = [b'F', 0, b'O', 0, b'O', 0, b' ', 0, b' ', 0, 0, 0];
    probe.set_utf8label(&raw, Endianness::Little).unwrap();

    // raw variant comes first and carries the original bytes
    assert_eq!(probe.get_value(0).unwrap().name(), "LABEL_RAW");
    assert_eq!(probe.get_value(0).unwrap().data(), &raw);

    let label = probe.lookup_value("LABEL").unwrap();
    assert_eq!(label.text(), Some("FOO"));
    // utf8 labels report their length without the terminator
    assert_eq!(label.len(), 3);
}

#[test]
fn ascii_label_trims_and_counts_terminator() {
    let mut probe = Probe::new();
    probe.set_request(ProbeRequest::LABEL);

    probe.set_label(b"disk \t\r\n").unwrap();
    let label = probe.lookup_value("LABEL").unwrap();
    assert_eq!(label.text(), Some("disk"));
    assert_eq!(label.len(), 5);
    assert_eq!(label.data()[4], 0);
}

#[test]
fn filter_exclude_then_invert() {
    let request = ProbeRequest::TYPE;
    let mut probe = image_probe(&ext4_image(), request);

    probe.filter_types(FilterMode::NotIn, &["ext4"]);
    assert_eq!(probe.step(), ProbeStatus::Exhausted);

    probe.invert_filter().unwrap();
    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("TYPE").unwrap().text(), Some("ext4"));
}

#[test]
fn filter_symmetry() {
    let img = ext4_image();

    let mut a = image_probe(&img, ProbeRequest::TYPE);
    a.filter_types(FilterMode::OnlyIn, &["ext4"]);
    a.invert_filter().unwrap();
    let seq_a = match_sequence(&mut a);

    let mut b = image_probe(&img, ProbeRequest::TYPE);
    b.filter_types(FilterMode::NotIn, &["ext4"]);
    let seq_b = match_sequence(&mut b);

    assert_eq!(seq_a, seq_b);

    // and the opposite polarity pair actually matches
    let mut c = image_probe(&img, ProbeRequest::TYPE);
    c.filter_types(FilterMode::NotIn, &["ext4"]);
    c.invert_filter().unwrap();
    let seq_c = match_sequence(&mut c);

    let mut d = image_probe(&img, ProbeRequest::TYPE);
    d.filter_types(FilterMode::OnlyIn, &["ext4"]);
    let seq_d = match_sequence(&mut d);

    assert_eq!(seq_c, vec!["ext4".to_string()]);
    assert_eq!(seq_c, seq_d);
}

#[test]
fn filter_usage_by_class() {
    let mut probe = image_probe(&ext4_image(), ProbeRequest::TYPE | ProbeRequest::USAGE);

    probe.filter_usage(FilterMode::NotIn, UsageFlags::FILESYSTEM);
    assert_eq!(probe.step(), ProbeStatus::Exhausted);

    probe.filter_usage(FilterMode::OnlyIn, UsageFlags::FILESYSTEM);
    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("USAGE").unwrap().text(), Some("filesystem"));
}

#[test]
fn cursor_resumes_across_coexisting_signatures() {
    let mut probe = image_probe(&cd_image(), ProbeRequest::TYPE | ProbeRequest::LABEL);

    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("TYPE").unwrap().text(), Some("udf"));

    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("TYPE").unwrap().text(), Some("iso9660"));
    assert_eq!(probe.lookup_value("LABEL").unwrap().text(), Some("UDFDISC"));

    assert_eq!(probe.step(), ProbeStatus::Exhausted);
}

#[test]
fn reset_restarts_iteration() {
    let mut probe = image_probe(&cd_image(), ProbeRequest::TYPE);

    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("TYPE").unwrap().text(), Some("udf"));

    probe.reset();
    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("TYPE").unwrap().text(), Some("udf"));
}

#[test]
fn touching_the_filter_restarts_iteration() {
    let mut probe = image_probe(&cd_image(), ProbeRequest::TYPE);

    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.step(), ProbeStatus::Match);

    probe.reset_filter();
    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("TYPE").unwrap().text(), Some("udf"));
}

#[test]
fn short_device_exhausts_cleanly() {
    let mut probe = image_probe(&[0u8; 256], ProbeRequest::all());
    assert_eq!(probe.step(), ProbeStatus::Exhausted);
    assert_eq!(probe.num_values(), 0);
}

/// Plants an otherwise valid md 1.x superblock at `off`: magic, major
/// version 1, a non-zero uuid and a consistent super_offset.
fn put_md1_superblock(image: &mut [u8], off: usize) {
    put(image, off, &0xa92b4efcu32.to_le_bytes());
    put(image, off + 4, &1u32.to_le_bytes());
    put(image, off + 16, &[0xAB; 16]);
    put(image, off + 144, &((off as u64) >> 9).to_le_bytes());
}

#[test]
fn small_device_is_never_a_raid_member() {
    // md superblocks only count on devices of at least 64 KiB; plant
    // convincing 1.1/1.2/1.0 superblocks on a 32 KiB image at every
    // offset the parser would try
    let mut img = vec![0u8; 32 * 1024];
    put_md1_superblock(&mut img, 0);
    put_md1_superblock(&mut img, 0x1000);
    put_md1_superblock(&mut img, 32 * 1024 - 0x2000);

    let mut probe = image_probe(&img, ProbeRequest::all());
    assert_eq!(probe.step(), ProbeStatus::Exhausted);
    assert_eq!(probe.num_values(), 0);
}

#[test]
fn determinism_across_sessions() {
    let img = cd_image();
    let mut a = image_probe(&img, ProbeRequest::TYPE);
    let mut b = image_probe(&img, ProbeRequest::TYPE);
    assert_eq!(match_sequence(&mut a), match_sequence(&mut b));
}

#[test]
fn luks_header_yields_uuid_version_and_usage() {
    let request = ProbeRequest::TYPE | ProbeRequest::USAGE | ProbeRequest::UUID
        | ProbeRequest::VERSION;
    let mut probe = image_probe(&luks_image(), request);

    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("TYPE").unwrap().text(), Some("crypto_LUKS"));
    assert_eq!(probe.lookup_value("USAGE").unwrap().text(), Some("crypto"));
    assert_eq!(probe.lookup_value("VERSION").unwrap().text(), Some("1"));
    // hex digits are folded to lower case
    assert_eq!(
        probe.lookup_value("UUID").unwrap().text(),
        Some("a1b2c3d4-0000-4444-8888-deadbeef0001")
    );
}

#[test]
fn swap_v1_header() {
    let request =
        ProbeRequest::TYPE | ProbeRequest::LABEL | ProbeRequest::UUID | ProbeRequest::VERSION;
    let mut probe = image_probe(&swap_image(), request);

    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.lookup_value("TYPE").unwrap().text(), Some("swap"));
    assert_eq!(probe.lookup_value("LABEL").unwrap().text(), Some("swaplab"));
    assert_eq!(probe.lookup_value("VERSION").unwrap().text(), Some("1"));
    assert!(probe.has_value("UUID"));
}

#[test]
fn request_mask_is_respected() {
    let mut probe = image_probe(&fat16_image(), ProbeRequest::empty());
    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.num_values(), 0);

    let mut probe = image_probe(&fat16_image(), ProbeRequest::TYPE);
    assert_eq!(probe.step(), ProbeStatus::Match);
    assert_eq!(probe.num_values(), 1);
    assert!(probe.has_value("TYPE"));
    assert!(!probe.has_value("LABEL"));
    assert!(!probe.has_value("UUID"));
    assert!(!probe.has_value("USAGE"));
}

#[test]
fn empty_uuid_sets_nothing() {
    let mut probe = Probe::new();
    probe.set_request(ProbeRequest::UUID | ProbeRequest::UUID_RAW);

    probe.set_uuid(&[0u8; 16]).unwrap();
    probe.set_uuid_str(&[0u8; 4], "0000-0000").unwrap();
    assert_eq!(probe.num_values(), 0);
}

#[test]
fn uuid_raw_precedes_cooked() {
    let mut probe = Probe::new();
    probe.set_request(ProbeRequest::UUID | ProbeRequest::UUID_RAW);

    let uuid: [u8; 16] = [
        0xd6, 0x5b, 0x25, 0x5e, 0xb2, 0x33, 0x43, 0x3c, 0x82, 0x22, 0xfa, 0x3c, 0xa6, 0x55,
        0xa4, 0xbf,
    ];
    probe.set_uuid(&uuid).unwrap();

    assert_eq!(probe.get_value(0).unwrap().name(), "UUID_RAW");
    assert_eq!(probe.get_value(0).unwrap().data(), &uuid);
    assert_eq!(
        probe.get_value(1).unwrap().text(),
        Some("d65b255e-b233-433c-8222-fa3ca655a4bf")
    );
}

#[test]
fn explicit_name_bypasses_request_mask() {
    let mut probe = Probe::new();
    probe.set_request(ProbeRequest::empty());

    probe.set_uuid_as(&[1u8; 16], Some("EXT_JOURNAL")).unwrap();
    assert!(probe.has_value("EXT_JOURNAL"));
    assert!(!probe.has_value("UUID"));
    assert!(!probe.has_value("UUID_RAW"));
}

#[test]
fn value_store_is_bounded() {
    let mut probe = Probe::new();

    for i in 0..MAX_VALUES {
        assert!(probe.set_value("X", &[i as u8]).is_ok());
    }
    assert!(probe.set_value("X", &[0xFF]).is_err());
    assert_eq!(probe.num_values(), MAX_VALUES);
}

#[test]
fn values_truncate_silently() {
    let mut probe = Probe::new();
    probe.set_value("BIG", &[0xAB; 4096]).unwrap();
    assert_eq!(probe.get_value(0).unwrap().len(), crate::VALUE_BUFSIZ);
}

#[test]
fn registry_order_is_stable() {
    let names: Vec<&str> = supported_types().collect();
    assert_eq!(names.len(), 36);
    assert_eq!(names[0], "linux_raid_member");
    assert_eq!(names[10], "LVM2_member");
    assert_eq!(names[11], "crypto_LUKS");
    assert_eq!(names[12], "vfat");
    assert_eq!(names[24], "udf");
    assert_eq!(names[25], "iso9660");
    assert_eq!(names[35], "oracleasm");

    assert_eq!(PROBES.len(), names.len());
}

#[test]
fn known_fstype_scans_the_registry() {
    assert!(known_fstype("ext4"));
    assert!(known_fstype("linux_raid_member"));
    assert!(!known_fstype("ext5"));
    assert!(!known_fstype(""));
}

#[test]
fn get_buffer_regimes() {
    let mut img = vec![0u8; 128 * 1024];
    for (i, b) in img.iter_mut().enumerate() {
        *b = (i % 251) as u8;
    }
    let mut probe = image_probe(&img, ProbeRequest::empty());

    // superblock window
    let got = probe.get_buffer(100, 32).unwrap().to_vec();
    assert_eq!(got, img[100..132]);

    // extent regime past the window, then a contained re-request
    let got = probe.get_buffer(70_000, 1000).unwrap().to_vec();
    assert_eq!(got, img[70_000..71_000]);
    let got = probe.get_buffer(70_100, 200).unwrap().to_vec();
    assert_eq!(got, img[70_100..70_300]);

    // reads past the device fail
    assert!(probe.get_buffer(128 * 1024 - 10, 64).is_err());
}
