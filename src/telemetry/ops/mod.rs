pub mod extract;
pub mod init;
pub mod product;
pub mod sweep;
