pub(crate) mod export;
pub(crate) mod harvest;
pub(crate) mod limits;
pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod records;
pub(crate) mod shared;
