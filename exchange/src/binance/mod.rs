pub mod consts;
pub mod spot;
