pub mod error;
pub mod i18n;
pub mod locale_map;
pub mod codes;
