use json_dns_infrastructure::dns::{DnsServerHandler, Transport};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncReadExt, AsyncWriteExt, Interest};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const UDP_RECV_BUFFER: usize = 4096;

#[derive(Debug, Clone, Copy)]
pub struct ListenerOptions {
    pub num_workers: usize,
    pub tcp_idle_timeout: Duration,
}

pub async fn start_dns_server(
    bind_addr: String,
    handler: DnsServerHandler,
    options: ListenerOptions,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let socket_addr: SocketAddr = bind_addr.parse()?;
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let num_workers = options.num_workers.max(1);

    info!(bind_address = %socket_addr, num_workers, "Starting DNS server with SO_REUSEPORT");

    let handler = Arc::new(handler);
    let mut join_set: JoinSet<()> = JoinSet::new();

    for i in 0..num_workers {
        let udp_socket = Arc::new(create_udp_socket(domain, socket_addr)?);
        let handler_udp = handler.clone();
        let shutdown_udp = shutdown.clone();
        join_set.spawn(async move {
            run_udp_worker(udp_socket, handler_udp, i, shutdown_udp).await;
        });
    }

    let tcp_listener = create_tcp_listener(domain, socket_addr)?;
    let handler_tcp = handler.clone();
    let shutdown_tcp = shutdown.clone();
    join_set.spawn(async move {
        run_tcp_listener(tcp_listener, handler_tcp, options.tcp_idle_timeout, shutdown_tcp).await;
    });

    info!("DNS server ready, {} UDP workers on {}", num_workers, socket_addr);

    while join_set.join_next().await.is_some() {}
    Ok(())
}

async fn run_udp_worker(
    socket: Arc<AsyncFd<std::net::UdpSocket>>,
    handler: Arc<DnsServerHandler>,
    worker_id: usize,
    shutdown: CancellationToken,
) {
    let mut recv_buf = [0u8; UDP_RECV_BUFFER];

    loop {
        let mut guard = tokio::select! {
            _ = shutdown.cancelled() => break,
            ready = socket.readable() => match ready {
                Ok(g) => g,
                Err(_) => break,
            },
        };

        loop {
            match socket.get_ref().recv_from(&mut recv_buf) {
                Ok((n, from)) => {
                    let handler = handler.clone();
                    let socket = socket.clone();
                    let shutdown = shutdown.clone();
                    let owned_buf: Arc<[u8]> = Arc::from(&recv_buf[..n]);
                    tokio::spawn(async move {
                        let response = tokio::select! {
                            _ = shutdown.cancelled() => return,
                            response = handler.handle_raw(&owned_buf, Transport::Udp) => response,
                        };
                        if let Some(response) = response {
                            if let Err(e) = socket.get_ref().send_to(&response, from) {
                                debug!(client = %from, error = %e, "UDP send failed");
                            }
                        }
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    guard.clear_ready();
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(worker = worker_id, error = %e, "UDP recv error");
                    guard.clear_ready();
                    break;
                }
            }
        }
    }

    debug!(worker = worker_id, "UDP worker stopped");
}

async fn run_tcp_listener(
    listener: TcpListener,
    handler: Arc<DnsServerHandler>,
    idle_timeout: Duration,
    shutdown: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => {
                let handler = handler.clone();
                let shutdown = shutdown.child_token();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = shutdown.cancelled() => {}
                        result = serve_tcp_connection(stream, &handler, idle_timeout) => {
                            if let Err(e) = result {
                                debug!(client = %peer, error = %e, "TCP connection closed with error");
                            }
                        }
                    }
                });
            }
            Err(e) => warn!(error = %e, "TCP accept failed"),
        }
    }

    debug!("TCP listener stopped");
}

/// Serves length-prefixed messages until the client goes quiet or hangs up.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    handler: &DnsServerHandler,
    idle_timeout: Duration,
) -> io::Result<()> {
    loop {
        let mut len_buf = [0u8; 2];
        match tokio::time::timeout(idle_timeout, stream.read_exact(&mut len_buf)).await {
            Err(_) => return Ok(()),
            Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Ok(Err(e)) => return Err(e),
            Ok(Ok(_)) => {}
        }

        let len = usize::from(u16::from_be_bytes(len_buf));
        let mut query = vec![0u8; len];
        tokio::time::timeout(idle_timeout, stream.read_exact(&mut query))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "partial message"))??;

        let response = tokio::select! {
            response = handler.handle_raw(&query, Transport::Tcp) => response,
            hangup = wait_for_hangup(&stream) => {
                debug!("TCP client hung up, abandoning in-flight query");
                return hangup;
            }
        };
        let Some(response) = response else {
            continue;
        };
        let Ok(response_len) = u16::try_from(response.len()) else {
            warn!(size = response.len(), "Response exceeds TCP frame limit, dropping");
            continue;
        };

        let mut frame = Vec::with_capacity(2 + response.len());
        frame.extend_from_slice(&response_len.to_be_bytes());
        frame.extend_from_slice(&response);
        stream.write_all(&frame).await?;
    }
}

/// Resolves when the peer closes or resets the connection. Stays pending
/// once the client has pipelined more data.
async fn wait_for_hangup(stream: &TcpStream) -> io::Result<()> {
    let mut byte = [0u8; 1];
    match stream.peek(&mut byte).await {
        Ok(0) => Ok(()),
        Ok(_) => std::future::pending().await,
        Err(e) => Err(e),
    }
}

fn create_udp_socket(
    domain: Domain,
    socket_addr: SocketAddr,
) -> anyhow::Result<AsyncFd<std::net::UdpSocket>> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(AsyncFd::with_interest(std_socket, Interest::READABLE)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use json_dns_application::ports::DnsBackend;
    use json_dns_application::services::QueryClassifier;
    use json_dns_application::use_cases::HandleDnsQueryUseCase;
    use json_dns_domain::{BackendOutcome, DomainError};
    use json_dns_infrastructure::dns::{AuthorityCatalog, ResponseSynthesizer};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Never answers; flags when its lookup is dropped.
    struct StalledBackend {
        started: Arc<Notify>,
        abandoned: Arc<AtomicBool>,
    }

    #[async_trait]
    impl DnsBackend for StalledBackend {
        async fn lookup(&self, _name: &str, _record_type: u16) -> Result<BackendOutcome, DomainError> {
            let _guard = SetOnDrop(Arc::clone(&self.abandoned));
            self.started.notify_one();
            std::future::pending().await
        }
    }

    struct NotFoundBackend;

    #[async_trait]
    impl DnsBackend for NotFoundBackend {
        async fn lookup(&self, _name: &str, _record_type: u16) -> Result<BackendOutcome, DomainError> {
            Ok(BackendOutcome::NotFound)
        }
    }

    fn handler_with(backend: Arc<dyn DnsBackend>) -> DnsServerHandler {
        let use_case = Arc::new(HandleDnsQueryUseCase::new(
            QueryClassifier::new(false, false),
            backend,
        ));
        let synthesizer = Arc::new(ResponseSynthesizer::new(
            false,
            Arc::new(AuthorityCatalog::empty()),
        ));
        DnsServerHandler::new(use_case, synthesizer)
    }

    fn framed_a_query() -> Vec<u8> {
        let mut query = vec![0x12, 0x34, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
        for label in ["example", "com"] {
            query.push(label.len() as u8);
            query.extend_from_slice(label.as_bytes());
        }
        query.extend_from_slice(&[0, 0, 1, 0, 1]);

        let mut frame = (query.len() as u16).to_be_bytes().to_vec();
        frame.extend_from_slice(&query);
        frame
    }

    async fn serve_one(
        handler: DnsServerHandler,
    ) -> (SocketAddr, tokio::task::JoinHandle<io::Result<()>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            serve_tcp_connection(stream, &handler, Duration::from_secs(30)).await
        });
        (addr, task)
    }

    #[tokio::test]
    async fn test_tcp_hangup_abandons_backend_lookup() {
        let started = Arc::new(Notify::new());
        let abandoned = Arc::new(AtomicBool::new(false));
        let backend = Arc::new(StalledBackend {
            started: Arc::clone(&started),
            abandoned: Arc::clone(&abandoned),
        });
        let (addr, task) = serve_one(handler_with(backend)).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(&framed_a_query()).await.unwrap();
        started.notified().await;
        drop(client);

        let result = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("connection task should end once the client is gone")
            .unwrap();
        assert!(result.is_ok());
        assert!(abandoned.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_tcp_query_answered_while_connection_open() {
        let (addr, task) = serve_one(handler_with(Arc::new(NotFoundBackend))).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(&framed_a_query()).await.unwrap();

        let mut len_buf = [0u8; 2];
        client.read_exact(&mut len_buf).await.unwrap();
        let mut response = vec![0u8; usize::from(u16::from_be_bytes(len_buf))];
        client.read_exact(&mut response).await.unwrap();

        assert_eq!(&response[..2], &[0x12, 0x34]);
        assert_eq!(response[2] & 0x80, 0x80);
        assert_eq!(response[3] & 0x0F, 0);

        drop(client);
        assert!(task.await.unwrap().is_ok());
    }
}
