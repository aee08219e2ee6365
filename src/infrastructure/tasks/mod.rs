mod dhcp_server;
mod dns_server;
mod http_server;
mod restart;
mod status;

pub use dhcp_server::dhcp_server_task;
pub use dns_server::dns_server_task;
pub use http_server::http_server_task;
pub use restart::restart_task;
pub use status::run_status_indicator;
