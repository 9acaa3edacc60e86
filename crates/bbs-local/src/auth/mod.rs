pub mod be;
pub mod donguri;
pub mod uplift;
