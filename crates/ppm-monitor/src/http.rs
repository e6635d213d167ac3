//! TCP front end for the reading publisher.
//!
//! One short-lived task per connection: read the request head, answer,
//! close. Connections that stall are dropped after [`CONNECTION_TIMEOUT`].

use std::io;
use std::net::SocketAddr;

use embassy_time::{Duration, with_timeout};
use log::{debug, info, warn};
use ppm_core::{ReadingPublisher, Response, Shutdown, Status, request_head_complete};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Largest request head accepted
const MAX_REQUEST_HEAD: usize = 1024;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept connections until shutdown is requested.
pub async fn serve(
    listener: TcpListener,
    publisher: ReadingPublisher<'static>,
    shutdown: &'static Shutdown,
) {
    match listener.local_addr() {
        Ok(addr) => info!("HTTP listening on {}", addr),
        Err(e) => warn!("HTTP listening on unknown address: {}", e),
    }

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(answer(stream, peer, publisher));
                }
                Err(e) => warn!("HTTP accept failed: {}", e),
            },
        }
    }

    info!("HTTP listener stopped");
}

async fn answer(stream: TcpStream, peer: SocketAddr, publisher: ReadingPublisher<'static>) {
    match with_timeout(CONNECTION_TIMEOUT, exchange(stream, publisher)).await {
        Ok(Ok(status)) => debug!("{} -> {}", peer, status.code()),
        Ok(Err(e)) => debug!("{}: connection error: {}", peer, e),
        Err(_) => debug!("{}: timed out", peer),
    }
}

async fn exchange(mut stream: TcpStream, publisher: ReadingPublisher<'_>) -> io::Result<Status> {
    let mut head = [0u8; MAX_REQUEST_HEAD];
    let mut filled = 0;

    let response = loop {
        let n = stream.read(&mut head[filled..]).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        filled += n;

        if request_head_complete(&head[..filled]) {
            break publisher.handle(&head[..filled]);
        }
        if filled == head.len() {
            break Response::error(Status::BadRequest);
        }
    };

    stream.write_all(&response.encode()).await?;
    stream.shutdown().await?;
    Ok(response.status)
}
