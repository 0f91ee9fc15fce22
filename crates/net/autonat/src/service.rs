//! Registration of both autonat protocols with the host.

use std::{future::Future, sync::Arc};

use futures::StreamExt;
use libp2p::Multiaddr;
use parking_lot::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::{
    AutoNatError,
    client::{Client, VerificationReport},
    config::Config,
    server::Server,
    traits::{Connection, ConnectionManager, IncomingStream, IncomingStreams, Registrar},
};

/// Serves the verifier and requester roles on a [`Registrar`].
pub struct AutoNatService<R, M> {
    registrar: Arc<R>,
    server: Arc<Server<M>>,
    client: Arc<Client>,
    config: Arc<Config>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<R: Registrar, M: ConnectionManager> AutoNatService<R, M> {
    pub fn new(registrar: Arc<R>, connections: Arc<M>, config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            registrar,
            server: Arc::new(Server::new(connections, config.clone())),
            client: Arc::new(Client::new(config.clone())),
            config,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Use a preconfigured server, e.g. one with a seeded RNG.
    pub fn with_server(mut self, server: Server<M>) -> Self {
        self.server = Arc::new(server);
        self
    }

    pub fn server(&self) -> &Arc<Server<M>> {
        &self.server
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn is_started(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Register both protocols and start accepting streams. Calling it again
    /// while started does nothing.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&self) -> Result<(), AutoNatError> {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            return Ok(());
        }

        let limits = self.config.stream_limits();
        let dial_requests = self
            .registrar
            .handle(self.config.dial_request_protocol.clone(), limits)?;
        let dial_backs = match self
            .registrar
            .handle(self.config.dial_back_protocol.clone(), limits)
        {
            Ok(streams) => streams,
            Err(e) => {
                self.registrar.unhandle(&self.config.dial_request_protocol);
                return Err(e.into());
            }
        };

        let server = self.server.clone();
        tasks.push(tokio::spawn(accept_loop(
            "dial-request",
            dial_requests,
            move |incoming| {
                let server = server.clone();
                async move { server.handle_incoming(incoming).await }
            },
        )));

        let client = self.client.clone();
        tasks.push(tokio::spawn(accept_loop(
            "dial-back",
            dial_backs,
            move |incoming| {
                let client = client.clone();
                async move { client.handle_incoming(incoming).await }
            },
        )));

        info!(
            dial_request = %self.config.dial_request_protocol,
            dial_back = %self.config.dial_back_protocol,
            "AutoNAT service started"
        );
        Ok(())
    }

    /// Unregister both protocols and abort every running exchange.
    pub fn stop(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        if tasks.is_empty() {
            return;
        }

        self.registrar.unhandle(&self.config.dial_request_protocol);
        self.registrar.unhandle(&self.config.dial_back_protocol);
        for task in tasks {
            task.abort();
        }
        info!("AutoNAT service stopped");
    }

    /// Ask the verifier on `connection` to dial back `addrs`.
    pub async fn verify<C: Connection>(
        &self,
        connection: &mut C,
        addrs: Vec<Multiaddr>,
    ) -> Result<VerificationReport, AutoNatError> {
        self.client.verify(connection, addrs).await
    }
}

impl<R, M> Drop for AutoNatService<R, M> {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

/// Accept streams until the registrar ends the stream of streams, handling
/// each on its own task. Dropping the loop aborts every handler it spawned.
async fn accept_loop<S, F, Fut>(protocol: &'static str, mut incoming: IncomingStreams<S>, handler: F)
where
    S: Send + 'static,
    F: Fn(IncomingStream<S>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut in_flight = JoinSet::new();
    loop {
        tokio::select! {
            next = incoming.next() => match next {
                Some(stream) => {
                    debug!(protocol, remote_addr = %stream.remote_addr, "Accepted stream");
                    in_flight.spawn(handler(stream));
                }
                None => break,
            },
            Some(joined) = in_flight.join_next() => {
                if let Err(e) = joined {
                    warn!(protocol, error = %e, "Stream handler failed");
                }
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            warn!(protocol, error = %e, "Stream handler failed");
        }
    }
    debug!(protocol, "Accept loop finished");
}
