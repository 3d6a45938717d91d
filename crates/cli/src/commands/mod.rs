pub mod config_cmd;
pub mod split;
