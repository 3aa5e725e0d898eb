pub(crate) mod adaptec;
pub(crate) mod ddf;
pub(crate) mod isw;
pub(crate) mod jmicron;
pub(crate) mod linux_raid;
pub(crate) mod lsi;
pub(crate) mod nvidia;
pub(crate) mod promise;
pub(crate) mod silicon;
pub(crate) mod via;
