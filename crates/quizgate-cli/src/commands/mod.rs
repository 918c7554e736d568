pub mod decode;
pub mod init;
pub mod play;
pub mod record;
pub mod validate;
