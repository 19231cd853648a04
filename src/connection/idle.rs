//! IDLE support (RFC 2177).
//!
//! IDLE lets the server push folder changes over an otherwise quiescent
//! connection. Entering IDLE parks the connection's command machinery:
//! the only legal exits are [`Connection::done`] and stream death.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::client::{Connection, ConnectionState};
use crate::command::Command;
use crate::response::{Response, Status, Unsolicited, text_of};
use crate::{Error, Result};

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Enters IDLE on the selected folder.
    ///
    /// Returns once the server acknowledges with a continuation. After
    /// that, drain pushes with [`Connection::poll`] or
    /// [`Connection::next_notification`] and leave with
    /// [`Connection::done`].
    pub async fn idle(&mut self) -> Result<()> {
        let folder = match &self.state {
            ConnectionState::Selected(folder) => folder.clone(),
            _ => return Err(Error::State("IDLE requires a selected folder".to_string())),
        };

        let tag = self.tags.next();
        let line = Command::new("IDLE").encode(&tag).remove(0);
        self.write_line(&line.bytes).await?;

        loop {
            let frame = self.read_frame().await?;
            match Response::classify(frame)? {
                Response::Continuation(_) => break,
                // Pushes may race the continuation; keep them.
                Response::Untagged(values) => {
                    self.notifications.push_back(Unsolicited::classify(values));
                }
                Response::Tagged {
                    tag: t,
                    status,
                    values,
                } if t == tag => {
                    return Err(match status {
                        Status::Ok => {
                            Error::Protocol("IDLE completed without continuation".to_string())
                        }
                        status => Error::Server {
                            status,
                            text: text_of(&values),
                        },
                    });
                }
                Response::Tagged { tag: t, .. } => {
                    return Err(Error::Protocol(format!("response for unknown tag {t}")));
                }
            }
        }

        self.idle_tag = Some(tag);
        self.state = ConnectionState::Idle(folder);
        tracing::debug!("idling");
        Ok(())
    }

    /// Blocks until the next server push arrives.
    ///
    /// Queued notifications are delivered first. The read timeout
    /// applies: callers that want periodic wakeups set one and treat
    /// [`Error::Timeout`] as "loop and retry".
    pub async fn next_notification(&mut self) -> Result<Unsolicited> {
        if let Some(event) = self.notifications.pop_front() {
            return Ok(event);
        }
        if !matches!(self.state, ConnectionState::Idle(_)) {
            return Err(Error::State(
                "no queued notifications and connection is not idling".to_string(),
            ));
        }

        let frame = self.read_frame().await?;
        match Response::classify(frame)? {
            Response::Untagged(values) => {
                let event = Unsolicited::classify(values);
                tracing::trace!(?event, "push");
                Ok(event)
            }
            _ => Err(Error::Protocol("unexpected frame during IDLE".to_string())),
        }
    }

    /// Drains available notifications without blocking.
    ///
    /// Returns queued events plus whatever the server has already
    /// delivered; an empty vector means nothing is pending.
    pub async fn poll(&mut self) -> Result<Vec<Unsolicited>> {
        let mut events: Vec<Unsolicited> = self.notifications.drain(..).collect();

        if matches!(self.state, ConnectionState::Idle(_)) {
            loop {
                match tokio::time::timeout(Duration::ZERO, self.parser.read_frame()).await {
                    Ok(Ok(frame)) => match Response::classify(frame)? {
                        Response::Untagged(values) => {
                            events.push(Unsolicited::classify(values));
                        }
                        _ => {
                            return Err(Error::Protocol(
                                "unexpected frame during IDLE".to_string(),
                            ));
                        }
                    },
                    Ok(Err(e)) => {
                        if e.is_connection_dead() {
                            self.state = ConnectionState::Disconnected;
                        }
                        return Err(e);
                    }
                    Err(_) => break,
                }
            }
        }

        Ok(events)
    }

    /// Exits IDLE by sending DONE and waiting for the tagged OK.
    ///
    /// Untagged frames received while draining are returned: servers
    /// commonly interleave EXISTS/EXPUNGE with the DONE exchange and
    /// those events must not be lost.
    pub async fn done(&mut self) -> Result<Vec<Unsolicited>> {
        let folder = match &self.state {
            ConnectionState::Idle(folder) => folder.clone(),
            _ => return Err(Error::State("DONE is only valid while idling".to_string())),
        };
        let Some(tag) = self.idle_tag.take() else {
            return Err(Error::State("no IDLE tag outstanding".to_string()));
        };

        self.write_line(b"DONE\r\n").await?;

        let mut events = Vec::new();
        loop {
            let frame = self.read_frame().await?;
            match Response::classify(frame)? {
                Response::Untagged(values) => {
                    events.push(Unsolicited::classify(values));
                }
                Response::Tagged {
                    tag: t,
                    status,
                    values,
                } if t == tag => {
                    return match status {
                        Status::Ok => {
                            self.state = ConnectionState::Selected(folder);
                            tracing::debug!(events = events.len(), "idle terminated");
                            Ok(events)
                        }
                        status => Err(Error::Server {
                            status,
                            text: text_of(&values),
                        }),
                    };
                }
                _ => {
                    return Err(Error::Protocol("unexpected frame after DONE".to_string()));
                }
            }
        }
    }
}
