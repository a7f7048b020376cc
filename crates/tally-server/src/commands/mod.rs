pub mod dispatch;
pub mod hosts;
pub mod init_db;
pub mod serve;
