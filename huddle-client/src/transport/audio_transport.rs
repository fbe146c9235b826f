use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use huddle_core::{IceCandidate, ParticipantId, SdpType, SessionDescription};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;

use crate::transport::{MediaTransport, MediaTransportFactory, TransportEvent, TransportState};

/// A webrtc peer connection carrying one bidirectional audio stream.
pub struct AudioTransport {
    peer_connection: Arc<RTCPeerConnection>,
}

impl AudioTransport {
    /// Builds the peer connection and wires its callbacks to `events`.
    pub async fn new(
        remote: ParticipantId,
        ice_servers: Vec<String>,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if ice_servers.is_empty() {
            vec![]
        } else {
            vec![RTCIceServer {
                urls: ice_servers,
                credential: String::new(),
                username: String::new(),
            }]
        };

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        peer_connection
            .add_transceiver_from_kind(RTPCodecType::Audio, None)
            .await?;

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection to {} is now {}", remote, s);
                    let state = match s {
                        RTCPeerConnectionState::New | RTCPeerConnectionState::Unspecified => {
                            TransportState::New
                        }
                        RTCPeerConnectionState::Connecting => TransportState::Connecting,
                        RTCPeerConnectionState::Connected => TransportState::Connected,
                        RTCPeerConnectionState::Disconnected => TransportState::Disconnected,
                        RTCPeerConnectionState::Failed => TransportState::Failed,
                        RTCPeerConnectionState::Closed => TransportState::Closed,
                    };
                    let _ = tx.send(TransportEvent::StateChanged { remote, state }).await;
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                // None marks the end of gathering
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Failed to encode local candidate for {}: {}", remote, e);
                        return;
                    }
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx
                    .send(TransportEvent::LocalCandidate { remote, candidate })
                    .await;
            })
        }));

        let negotiation_tx = events;
        peer_connection.on_negotiation_needed(Box::new(move || {
            let tx = negotiation_tx.clone();

            Box::pin(async move {
                debug!("Negotiation needed with {}", remote);
                let _ = tx.send(TransportEvent::NegotiationNeeded { remote }).await;
            })
        }));

        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            Box::pin(async move {
                info!("Receiving {} track from {}", track.kind(), remote);
            })
        }));

        Ok(Self { peer_connection })
    }
}

fn to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.kind {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp)?,
        other => bail!("unsupported description type {:?}", other),
    };
    Ok(rtc)
}

fn from_rtc(desc: RTCSessionDescription) -> Result<SessionDescription> {
    match desc.sdp_type {
        RTCSdpType::Offer => Ok(SessionDescription::offer(desc.sdp)),
        RTCSdpType::Answer => Ok(SessionDescription::answer(desc.sdp)),
        other => bail!("unsupported description type {}", other),
    }
}

#[async_trait]
impl MediaTransport for AudioTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        from_rtc(self.peer_connection.create_offer(None).await?)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        from_rtc(self.peer_connection.create_answer(None).await?)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(desc)?)
            .await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates an [`AudioTransport`] per remote participant.
#[derive(Clone)]
pub struct AudioTransportFactory {
    ice_servers: Vec<String>,
}

impl AudioTransportFactory {
    pub fn new(ice_servers: Vec<String>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl MediaTransportFactory for AudioTransportFactory {
    async fn create(
        &self,
        remote: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>> {
        let transport = AudioTransport::new(remote, self.ice_servers.clone(), events).await?;
        Ok(Arc::new(transport))
    }
}
