pub(crate) mod health;
pub(crate) mod sessions;
pub(crate) mod themes;
