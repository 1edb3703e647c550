pub mod config_port;
