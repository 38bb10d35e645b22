// Library for tests to access modules

pub mod alerts;
pub mod config;
pub mod docker_repo;
pub mod host;
pub mod integrations;
pub mod models;
pub mod port_scanner;
pub mod routes;
pub mod shell;
pub mod sysinfo_repo;
pub mod telemetry;
pub mod version;
pub mod worker;
