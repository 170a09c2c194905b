pub mod data;
pub(crate) mod util;
