use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

pub mod buffer;
pub mod connection;
pub mod error;
pub mod helpers;
pub mod parser;
pub mod request;
pub mod routes;
pub mod verify;

pub use buffer::{Buffer, DEFAULT_BUFFER_SIZE};
pub use connection::Connection;
pub use error::{ConnectionError, ParseError};
pub use helpers::traits::http_request::RequestUtils;
pub use helpers::traits::http_stream::StreamHttp;
pub use parser::{ParseState, RequestParser};
pub use request::{HttpCode, Request};
pub use routes::{RouteTable, RouteTag};
pub use verify::{MemoryUserStore, UserVerifier};

pub mod external {
    pub use async_trait;
    #[cfg(feature = "env")]
    pub use dotenv;
    pub use http;
    pub use tokio;
}

#[macro_export]
macro_rules! dev_print {
    ($($rest:tt)*) => {
        if cfg!(feature = "debug") {
            println!($($rest)*)
        }
    };
}

use tokio::net::{TcpListener, TcpStream};

pub type SendableError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Options {
    pub no_delay: bool,
    pub read_timeout_milliseconds: u64,
    pub read_buffer_size: usize,
    pub write_buffer_size: usize,
    /// Accumulate request bodies until `Content-Length` bytes arrived.
    pub strict_body_length: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl Options {
    pub fn new() -> Options {
        let mut _options = Options {
            no_delay: true,
            read_timeout_milliseconds: 3000,
            read_buffer_size: DEFAULT_BUFFER_SIZE,
            write_buffer_size: DEFAULT_BUFFER_SIZE,
            strict_body_length: false,
        };

        #[cfg(feature = "env")]
        {
            use std::env;
            if let Ok(data) = env::var("NO_DELAY") {
                // true, false
                if let Ok(data) = data.parse::<bool>() {
                    _options.no_delay = data;
                }
            }

            if let Ok(data) = env::var("READ_TIMEOUT_MILLISECONDS") {
                if let Ok(data) = data.parse::<u64>() {
                    _options.read_timeout_milliseconds = data;
                }
            }

            if let Ok(data) = env::var("READ_BUFFER_SIZE") {
                if let Ok(data) = data.parse::<usize>() {
                    _options.read_buffer_size = data;
                }
            }

            if let Ok(data) = env::var("WRITE_BUFFER_SIZE") {
                if let Ok(data) = data.parse::<usize>() {
                    _options.write_buffer_size = data;
                }
            }

            if let Ok(data) = env::var("STRICT_BODY_LENGTH") {
                if let Ok(data) = data.parse::<bool>() {
                    _options.strict_body_length = data;
                }
            }
        }

        _options
    }
}

pub struct Server {
    pub listener: TcpListener,
    pub options: Options,
    pub routes: Arc<RouteTable>,
    pub verifier: Arc<dyn UserVerifier>,
}

impl Server {
    pub async fn new(address: &str) -> Result<Server, SendableError> {
        Self::with_options(address, Options::new()).await
    }

    pub async fn with_options(address: &str, options: Options) -> Result<Server, SendableError> {
        dev_print!("✅ Server initialized on {}", address);

        Ok(Server {
            listener: TcpListener::bind(address).await?,
            options,
            routes: Arc::new(RouteTable::default()),
            verifier: Arc::new(MemoryUserStore::new()),
        })
    }

    pub fn set_routes(&mut self, routes: RouteTable) {
        self.routes = Arc::new(routes);
    }

    pub fn set_verifier<V: UserVerifier + 'static>(&mut self, verifier: V) {
        self.verifier = Arc::new(verifier);
    }

    pub fn set_no_delay(&mut self, no_delay: bool) {
        self.options.no_delay = no_delay;
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn accept(&mut self) -> Result<Accept, SendableError> {
        let (stream, addr) = match self.listener.accept().await {
            Ok(data) => data,
            Err(e) => {
                dev_print!("Accept Error: {:?}", e);
                return Err(e.into());
            }
        };
        stream.set_nodelay(self.options.no_delay)?;
        dev_print!("accepted connection from {}", addr);

        Ok(Accept {
            tcp_stream: stream,
            addr,
            option: self.options.clone(),
            routes: self.routes.clone(),
            verifier: self.verifier.clone(),
        })
    }
}

pub struct Accept {
    pub tcp_stream: TcpStream,
    pub addr: SocketAddr,
    pub option: Options,
    routes: Arc<RouteTable>,
    verifier: Arc<dyn UserVerifier>,
}

impl Accept {
    pub fn get_request_ip(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn into_connection(self) -> Connection {
        let parser = RequestParser::new(self.routes, self.verifier);
        Connection::with_addr(self.tcp_stream, Some(self.addr), parser, &self.option)
    }
}

/// Request body handed to handlers built on `http::Request`.
#[derive(Debug, Clone, Default)]
pub struct Body {
    pub bytes: Vec<u8>,
    pub len: usize,
    /// Decoded `application/x-www-form-urlencoded` fields.
    pub form: HashMap<String, String>,
    /// Peer address of the connection the request arrived on.
    pub ip: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = Options::default();
        assert!(options.no_delay);
        assert_eq!(options.read_buffer_size, 1024);
        assert_eq!(options.write_buffer_size, 1024);
        assert!(!options.strict_body_length);
    }

    #[tokio::test]
    async fn server_creation_with_options() -> Result<(), SendableError> {
        let mut options = Options::new();
        options.read_buffer_size = 4096;
        let mut server = Server::with_options("127.0.0.1:0", options).await?;
        server.set_verifier(|_: &str, _: &str, _: bool| false);

        assert_eq!(server.options.read_buffer_size, 4096);
        assert!(server.local_addr()?.port() > 0);
        Ok(())
    }

    #[tokio::test]
    async fn accept_carries_peer_address() -> Result<(), SendableError> {
        let mut server = Server::new("127.0.0.1:0").await?;
        let client = TcpStream::connect(server.local_addr()?).await?;
        let client_addr = client.local_addr()?;

        let accept = server.accept().await?;
        assert_eq!(accept.addr, client_addr);
        assert_eq!(accept.get_request_ip(), "127.0.0.1");

        let conn = accept.into_connection();
        assert_eq!(conn.peer_addr(), Some(client_addr));
        assert_eq!(conn.request().remote_addr(), Some(client_addr));
        Ok(())
    }
}
