pub(crate) mod luks;
pub(crate) mod lvm;
