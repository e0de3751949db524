pub mod field_server;
