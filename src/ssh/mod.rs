// SSH模块入口
pub mod client;
pub mod session;
pub mod transport;

pub use client::SshClient;
pub use session::{AuthMethod, SshConnector};
pub use transport::{CommandTransport, Connector, ExecOutput, FileTransport, Transport};
