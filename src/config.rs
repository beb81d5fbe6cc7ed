use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Where and how [`launch`](crate::server::launch) listens.
///
/// Starts from `127.0.0.1:8000` with a five second keep-alive and is
/// adjusted through its chained setters:
///
/// ```rust
/// use waypoint::ServerConfig;
///
/// let config = ServerConfig::builder().port(3000).keep_alive(None);
/// assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
  pub(crate) address: IpAddr,
  pub(crate) port: u16,
  // seconds; `None` turns keep-alive off for both protocols
  pub(crate) keep_alive: Option<u64>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      address: Ipv4Addr::LOCALHOST.into(),
      port: 8000,
      keep_alive: Some(5),
    }
  }
}

impl ServerConfig {
  /// The default listener settings, ready to be adjusted.
  pub fn builder() -> Self {
    Self::default()
  }

  /// How long, in seconds, idle connections are kept open. `None` disables
  /// HTTP/1 keep-alive and HTTP/2 keep-alive pings.
  pub fn keep_alive(mut self, seconds: impl Into<Option<u64>>) -> Self {
    self.keep_alive = seconds.into();
    self
  }

  pub fn port(mut self, port: u16) -> Self {
    self.port = port;
    self
  }

  /// The interface to bind, ex: `Ipv4Addr::UNSPECIFIED` for every interface.
  pub fn address(mut self, addr: impl Into<IpAddr>) -> Self {
    self.address = addr.into();
    self
  }

  /// The socket address the router is served on.
  pub fn socket_addr(&self) -> SocketAddr {
    SocketAddr::new(self.address, self.port)
  }
}
