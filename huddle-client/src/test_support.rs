use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use huddle_core::{IceCandidate, ParticipantId, SdpType, SessionDescription, SignalMessage};
use tokio::sync::mpsc;

use crate::error::ClientError;
use crate::signaling::SignalingOutput;
use crate::transport::{MediaTransport, MediaTransportFactory, TransportEvent};

/// Captures everything the session sends to the hub.
#[derive(Clone)]
pub struct MockSignaling {
    tx: mpsc::UnboundedSender<SignalMessage>,
}

impl MockSignaling {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl SignalingOutput for MockSignaling {
    async fn send_signal(&self, msg: SignalMessage) -> Result<(), ClientError> {
        self.tx.send(msg).map_err(|_| ClientError::SignalingClosed)
    }
}

type CallLog = Arc<Mutex<Vec<String>>>;

/// Records every operation; fails the one named in `fail_on`.
pub struct MockTransport {
    calls: CallLog,
    fail_on: Option<String>,
    close_delay: Option<Duration>,
}

impl MockTransport {
    fn record(&self, call: String) -> Result<()> {
        let failing = self.fail_on.as_deref() == Some(call.split(':').next().unwrap_or(""));
        self.calls.lock().unwrap().push(call.clone());
        if failing {
            bail!("mock failure in {}", call);
        }
        Ok(())
    }
}

fn kind_name(kind: SdpType) -> &'static str {
    match kind {
        SdpType::Offer => "offer",
        SdpType::Answer => "answer",
        SdpType::Pranswer => "pranswer",
        SdpType::Rollback => "rollback",
    }
}

#[async_trait]
impl MediaTransport for MockTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record("create_offer".to_owned())?;
        Ok(SessionDescription::offer("v=0\r\ns=mock-offer\r\n"))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record("create_answer".to_owned())?;
        Ok(SessionDescription::answer("v=0\r\ns=mock-answer\r\n"))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(format!("set_local:{}", kind_name(desc.kind)))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(format!("set_remote:{}", kind_name(desc.kind)))
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(format!("candidate:{}", candidate.candidate))
    }

    async fn close(&self) -> Result<()> {
        if let Some(delay) = self.close_delay {
            tokio::time::sleep(delay).await;
        }
        self.record("close".to_owned())
    }
}

#[derive(Default)]
struct FactoryState {
    calls: HashMap<ParticipantId, CallLog>,
    events: HashMap<ParticipantId, mpsc::Sender<TransportEvent>>,
    fail_on: Option<String>,
    close_delay: Option<Duration>,
}

/// Hands out [`MockTransport`]s and keeps their call logs and event senders.
#[derive(Clone, Default)]
pub struct MockFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every transport fail `op`; `"create"` fails the factory itself.
    pub fn fail_on(&self, op: &str) {
        self.state.lock().unwrap().fail_on = Some(op.to_owned());
    }

    /// Makes every transport take `delay` to close.
    pub fn delay_close(&self, delay: Duration) {
        self.state.lock().unwrap().close_delay = Some(delay);
    }

    pub fn calls(&self, remote: &ParticipantId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(remote)
            .map(|log| log.lock().unwrap().clone())
            .unwrap_or_default()
    }

    pub fn created(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// The event sender given to the transport for `remote`.
    pub fn events(&self, remote: &ParticipantId) -> Option<mpsc::Sender<TransportEvent>> {
        self.state.lock().unwrap().events.get(remote).cloned()
    }
}

#[async_trait]
impl MediaTransportFactory for MockFactory {
    async fn create(
        &self,
        remote: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on.as_deref() == Some("create") {
            bail!("mock factory refused {}", remote);
        }

        let calls = CallLog::default();
        state.calls.insert(remote, calls.clone());
        state.events.insert(remote, events);

        Ok(Arc::new(MockTransport {
            calls,
            fail_on: state.fail_on.clone(),
            close_delay: state.close_delay,
        }))
    }
}
