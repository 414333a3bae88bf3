//! Connection lifecycle controller.
//!
//! A [`Session`] owns the transport, the [`LinkPhase`], the session
//! registry and the termination signal. [`Session::run`] drives three
//! activities until the signal fires:
//!
//! - **inbound**: transport events → frame assembler → envelope → render
//! - **input**: user lines → command translator → local action or send
//! - **heartbeat**: a ping every period; failures are swallowed
//!
//! Remote close, transport failure, `quit`, end of input and external
//! shutdown all end in the same place: one `Termination::fire`.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at, timeout};
use tracing::{debug, info, warn};

use juicy_core::{
    Action, ChatConnection, EndCause, Envelope, FrameAssembler, InboundEvents, JuicyError,
    LinkPhase, NORMAL_CLOSURE, SessionRegistry, Termination, Transport, TransportEvent, translate,
};

use crate::config::TermConfig;
use crate::render::Renderer;

/// Close reason sent by the `quit` command.
pub const QUIT_REASON: &str = "bye";
/// Close reason sent on external shutdown (Ctrl-C).
pub const SHUTDOWN_REASON: &str = "shutdown";

/// Timing knobs for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub heartbeat_interval: Duration,
    pub heartbeat_payload: Vec<u8>,
    /// How long to wait for the peer to confirm a close we started.
    pub close_grace: Duration,
}

impl From<&TermConfig> for SessionOptions {
    fn from(config: &TermConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat.interval(),
            heartbeat_payload: config.heartbeat.payload.clone(),
            close_grace: config.network.close_grace(),
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnd {
    pub cause: EndCause,
    pub phase: LinkPhase,
}

/// Text of the final status line.
pub fn end_message(cause: &EndCause) -> String {
    format!("JUICY TERMINAL SHUTDOWN COMPLETE ({cause})")
}

// ── Shared state ─────────────────────────────────────────────────

struct Shared<T> {
    transport: T,
    phase: Mutex<LinkPhase>,
    signal: Termination,
    registry: Arc<SessionRegistry>,
    renderer: Arc<Renderer>,
    options: SessionOptions,
}

impl<T: Transport> Shared<T> {
    fn phase(&self) -> MutexGuard<'_, LinkPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn link_up(&self) {
        self.renderer.status(
            "LINK UP",
            &format!("CONNECTED TO {}", self.transport.remote()),
        );
        self.renderer.help_hint();
    }

    /// Classify, register and render one complete payload.
    fn deliver(&self, payload: &str) {
        let env = Envelope::read(payload);
        for user in env.users() {
            self.registry.add_user(user);
        }
        if let Some(room) = env.room() {
            self.registry.add_room(room);
        }
        self.renderer.incoming(&env);
    }

    fn on_closed(&self, code: u16, reason: String) {
        self.renderer.status(
            "LINK DOWN",
            &format!("DISCONNECTED (code={code}, reason={reason})"),
        );
        {
            let mut phase = self.phase();
            info!(code, open_for = ?phase.open_duration(), "link down");
            phase.settle();
        }
        self.signal.fire(EndCause::RemoteClose { code, reason });
    }

    fn on_failed(&self, cause: String) {
        self.renderer.error(&format!("CONNECTION ERROR: {cause}"));
        {
            let mut phase = self.phase();
            warn!(open_for = ?phase.open_duration(), "link failed");
            if let Err(e) = phase.fail() {
                debug!(error = %e, "failure reported after the link ended");
            }
            phase.settle();
        }
        self.signal.fire(EndCause::TransportError(cause));
    }

    /// Start the close handshake and wait up to the grace period for the
    /// transport to confirm it.
    async fn close_and_wait(&self, reason: &str) {
        let began = self.phase().begin_close();
        if let Err(e) = began {
            debug!(error = %e, "close requested while not open");
            return;
        }
        if let Err(e) = self.transport.close(NORMAL_CLOSURE, reason.to_owned()).await {
            debug!(error = %e, "close frame not sent");
        }
        if timeout(self.options.close_grace, self.signal.fired())
            .await
            .is_err()
        {
            warn!(grace = ?self.options.close_grace, "close handshake not confirmed");
            self.phase().settle();
            self.signal.fire(EndCause::LocalClose {
                reason: reason.to_owned(),
            });
        }
    }

    async fn dispatch(&self, line: &str) -> bool {
        match translate(line) {
            Action::Ignore => {}
            Action::Quit => {
                self.close_and_wait(QUIT_REASON).await;
                return false;
            }
            Action::Clear => {
                self.renderer.clear();
                self.renderer.boot(self.transport.remote());
                self.link_up();
            }
            Action::List(mode) => self.renderer.list(&mode, &self.registry.snapshot()),
            Action::Forward(command) => match self.transport.send_text(command.clone()).await {
                Ok(()) => self.renderer.outgoing(&command),
                Err(e) => self.renderer.error(&format!("SEND FAILED: {e}")),
            },
        }
        true
    }
}

// ── Activities ───────────────────────────────────────────────────

async fn inbound_loop<T: Transport>(shared: Arc<Shared<T>>, mut events: InboundEvents) {
    let mut assembler = FrameAssembler::new();
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Chunk { data, last } => {
                if let Some(payload) = assembler.push(&data, last) {
                    shared.deliver(&payload);
                }
            }
            TransportEvent::Closed { code, reason } => {
                discard_partial(&assembler);
                shared.on_closed(code, reason);
                return;
            }
            TransportEvent::Failed(cause) => {
                discard_partial(&assembler);
                shared.on_failed(cause);
                return;
            }
        }
    }
    discard_partial(&assembler);
    shared.on_failed("event stream ended unexpectedly".into());
}

fn discard_partial(assembler: &FrameAssembler) {
    let pending = assembler.pending_len();
    if pending > 0 {
        debug!(pending, "link ended mid-message; partial payload dropped");
    }
}

async fn input_loop<T: Transport>(shared: Arc<Shared<T>>, mut input: mpsc::UnboundedReceiver<String>) {
    loop {
        let line = tokio::select! {
            _ = shared.signal.fired() => return,
            line = input.recv() => line,
        };
        let Some(line) = line else {
            debug!("end of input");
            shared.close_and_wait("").await;
            return;
        };
        if !shared.dispatch(&line).await {
            return;
        }
    }
}

async fn heartbeat_loop<T: Transport>(shared: Arc<Shared<T>>) {
    let period = shared.options.heartbeat_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = shared.signal.fired() => return,
            _ = ticker.tick() => {
                if !shared.phase().is_open() {
                    continue;
                }
                let payload = shared.options.heartbeat_payload.clone();
                if let Err(e) = shared.transport.send_ping(payload).await {
                    debug!(error = %e, "heartbeat not sent");
                }
            }
        }
    }
}

// ── Session ──────────────────────────────────────────────────────

/// One connection's worth of chat session.
pub struct Session<T> {
    shared: Arc<Shared<T>>,
    events: InboundEvents,
}

impl<T: Transport + 'static> Session<T> {
    /// Wrap a transport whose opening handshake just succeeded.
    pub fn new(
        transport: T,
        events: InboundEvents,
        renderer: Arc<Renderer>,
        options: SessionOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                phase: Mutex::new(LinkPhase::Connecting),
                signal: Termination::new(),
                registry: Arc::new(SessionRegistry::new()),
                renderer,
                options,
            }),
            events,
        }
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.shared.registry.clone()
    }

    pub fn termination(&self) -> Termination {
        self.shared.signal.clone()
    }

    /// Run until the termination signal fires.
    ///
    /// `input` yields user lines; its end counts as `quit`. `shutdown`
    /// resolving closes the session with reason `shutdown`.
    pub async fn run<S>(self, input: mpsc::UnboundedReceiver<String>, shutdown: S) -> SessionEnd
    where
        S: Future<Output = ()>,
    {
        let Session { shared, events } = self;

        if let Err(e) = shared.phase().open() {
            warn!(error = %e, "session started twice");
        }
        info!(remote = shared.transport.remote(), "link up");
        shared.link_up();

        let inbound = tokio::spawn(inbound_loop(shared.clone(), events));
        let heartbeat = tokio::spawn(heartbeat_loop(shared.clone()));
        // Never joined: it exits on the signal, and the stdin thread
        // behind it is abandoned at process exit.
        tokio::spawn(input_loop(shared.clone(), input));

        tokio::select! {
            _ = shared.signal.fired() => {}
            _ = shutdown => {
                info!("shutdown requested");
                shared.close_and_wait(SHUTDOWN_REASON).await;
            }
        }
        shared.signal.fired().await;

        heartbeat.abort();
        inbound.abort();

        let cause = shared
            .signal
            .cause()
            .cloned()
            .unwrap_or_else(|| EndCause::TransportError("unknown".into()));
        let phase = shared.phase().clone();
        info!(
            %cause,
            %phase,
            users = shared.registry.user_count(),
            rooms = shared.registry.room_count(),
            "session ended"
        );
        shared.renderer.status("SESSION END", &end_message(&cause));
        SessionEnd { cause, phase }
    }
}

/// Connect to the configured endpoint and run a session on it.
///
/// A failed handshake is rendered like any other transport error and
/// still produces a `SessionEnd`.
pub async fn start<S>(
    config: &TermConfig,
    renderer: Arc<Renderer>,
    input: mpsc::UnboundedReceiver<String>,
    shutdown: S,
) -> SessionEnd
where
    S: Future<Output = ()>,
{
    let endpoint = config.network.endpoint.as_str();
    let limit = config.network.connect_timeout();
    info!(endpoint, "connecting");

    let connected = match timeout(limit, ChatConnection::connect(endpoint)).await {
        Ok(result) => result,
        Err(_) => Err(JuicyError::Timeout(limit)),
    };

    match connected {
        Ok((conn, events)) => {
            Session::new(conn, events, renderer, SessionOptions::from(config))
                .run(input, shutdown)
                .await
        }
        Err(e) => {
            warn!(endpoint, error = %e, "connect failed");
            renderer.error(&format!("CONNECTION ERROR: {e}"));
            let mut phase = LinkPhase::Connecting;
            phase.settle();
            let cause = EndCause::TransportError(e.to_string());
            renderer.status("SESSION END", &end_message(&cause));
            SessionEnd { cause, phase }
        }
    }
}
