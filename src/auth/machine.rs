//! Table-driven line protocol handshakes.
//!
//! A handshake is a list of `Transition` rows. Each row optionally reads one
//! reply and checks its code, then optionally sends one command line. Any
//! deviation lands in the machine's rejected state; nothing here returns an
//! error to the caller. A rendered command holding CR or LF is never sent.

use crate::banner::sanitize_banner;
use crate::error::ProtocolRejection;
use crate::scanner::connect;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use tracing::{debug, trace};

/// Upper bound on the bytes of a single (possibly multi-line) reply.
pub const MAX_REPLY_BYTES: usize = 4096;

/// One row of a handshake table.
#[derive(Debug)]
pub struct Transition<S: 'static, C: 'static> {
    pub from: S,
    /// Reply codes that allow this transition. `None` skips the read.
    pub expect: Option<&'static [u16]>,
    /// Command written after the reply is accepted.
    pub send: Option<C>,
    pub to: S,
}

/// A handshake: its table plus the distinguished states.
#[derive(Debug)]
pub struct StateMachine<S: 'static, C: 'static> {
    pub start: S,
    pub accepted: S,
    pub rejected: S,
    pub table: &'static [Transition<S, C>],
}

/// A parsed server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

/// Where a handshake ended and what the server said first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineRun<S> {
    pub final_state: S,
    pub greeting: Option<String>,
    pub rejection: Option<ProtocolRejection>,
}

/// Result of one credential exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOutcome {
    pub succeeded: bool,
    pub banner: Option<String>,
    pub final_state: String,
    pub rejection: Option<ProtocolRejection>,
}

impl<S: Copy + fmt::Debug + PartialEq, C> StateMachine<S, C> {
    /// Outcome for an exchange that ended before anything was sent.
    pub fn refusal(&self, rejection: ProtocolRejection) -> ExchangeOutcome {
        MachineRun {
            final_state: self.rejected,
            greeting: None,
            rejection: Some(rejection),
        }
        .into_outcome(&self.accepted)
    }
}

impl<S: fmt::Debug + PartialEq> MachineRun<S> {
    fn into_outcome(self, accepted: &S) -> ExchangeOutcome {
        ExchangeOutcome {
            succeeded: self.final_state == *accepted,
            banner: self.greeting,
            final_state: format!("{:?}", self.final_state),
            rejection: self.rejection,
        }
    }
}

fn parse_code(line: &str) -> Result<u16, ProtocolRejection> {
    line.get(..3)
        .filter(|code| code.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| ProtocolRejection::MalformedReply(line.chars().take(64).collect()))
}

/// Read one reply, following `NNN-` continuation lines to the final `NNN ` line.
pub async fn read_reply<R>(reader: &mut R, limit: Duration) -> Result<Reply, ProtocolRejection>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines: Vec<String> = Vec::new();
    let mut budget = MAX_REPLY_BYTES;

    loop {
        if budget == 0 {
            return Err(ProtocolRejection::MalformedReply("reply too long".to_string()));
        }

        let mut raw = Vec::new();
        let read = timeout(limit, (&mut *reader).take(budget as u64).read_until(b'\n', &mut raw))
            .await
            .map_err(|_| ProtocolRejection::Timeout)?
            .map_err(|e| ProtocolRejection::Io(e.to_string()))?;
        if read == 0 {
            return Err(ProtocolRejection::Closed);
        }
        budget = budget.saturating_sub(read);

        let line = String::from_utf8_lossy(&raw)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        let code = parse_code(&line)?;
        let continued = line.as_bytes().get(3) == Some(&b'-');
        lines.push(line);

        if !continued {
            return Ok(Reply {
                code,
                text: lines.join("\n"),
            });
        }
    }
}

fn breaks_line(line: &str) -> bool {
    line.contains(['\r', '\n'])
}

async fn send_line<W>(writer: &mut W, line: &str, limit: Duration) -> Result<(), ProtocolRejection>
where
    W: AsyncWrite + Unpin,
{
    let payload = format!("{}\r\n", line);
    let write = async {
        writer.write_all(payload.as_bytes()).await?;
        writer.flush().await
    };
    timeout(limit, write)
        .await
        .map_err(|_| ProtocolRejection::Timeout)?
        .map_err(|e| ProtocolRejection::Io(e.to_string()))
}

/// Run a handshake over an established stream.
///
/// `render` turns a table command into the line to send. Every read and
/// write is bounded by `io_timeout`.
pub async fn drive<S, C, T, F>(
    machine: &StateMachine<S, C>,
    stream: &mut T,
    io_timeout: Duration,
    render: F,
) -> MachineRun<S>
where
    S: Copy + PartialEq + fmt::Debug,
    T: AsyncRead + AsyncWrite + Unpin,
    F: Fn(&C) -> String,
{
    let mut reader = BufReader::new(stream);
    let mut state = machine.start;
    let mut greeting = None;

    let reject = |greeting, rejection| MachineRun {
        final_state: machine.rejected,
        greeting,
        rejection: Some(rejection),
    };

    while state != machine.accepted {
        let Some(row) = machine.table.iter().find(|row| row.from == state) else {
            return reject(greeting, ProtocolRejection::NoTransition(format!("{:?}", state)));
        };

        if let Some(expected) = row.expect {
            let reply = match read_reply(&mut reader, io_timeout).await {
                Ok(reply) => reply,
                Err(rejection) => return reject(greeting, rejection),
            };
            if greeting.is_none() {
                greeting = Some(sanitize_banner(reply.text.as_bytes()));
            }
            if !expected.contains(&reply.code) {
                debug!(state = ?state, code = reply.code, "unexpected reply");
                return reject(greeting, ProtocolRejection::UnexpectedReply { code: reply.code });
            }
        }

        if let Some(command) = &row.send {
            let line = render(command);
            if breaks_line(&line) {
                return reject(greeting, ProtocolRejection::LineBreak);
            }
            if let Err(rejection) = send_line(&mut reader, &line, io_timeout).await {
                return reject(greeting, rejection);
            }
        }

        trace!(from = ?state, to = ?row.to, "transition");
        state = row.to;
    }

    MachineRun {
        final_state: state,
        greeting,
        rejection: None,
    }
}

/// Connect to `addr` and run a handshake, converting everything into an outcome.
pub async fn exchange_over_tcp<S, C, F>(
    machine: &StateMachine<S, C>,
    addr: SocketAddr,
    io_timeout: Duration,
    render: F,
) -> ExchangeOutcome
where
    S: Copy + PartialEq + fmt::Debug,
    F: Fn(&C) -> String,
{
    // Checked before connecting so the target never sees a partial exchange.
    let unsendable = machine
        .table
        .iter()
        .filter_map(|row| row.send.as_ref())
        .any(|command| breaks_line(&render(command)));
    if unsendable {
        debug!(%addr, "command line would break, exchange skipped");
        return machine.refusal(ProtocolRejection::LineBreak);
    }

    match connect(addr, io_timeout).await {
        Ok(mut stream) => drive(machine, &mut stream, io_timeout, render)
            .await
            .into_outcome(&machine.accepted),
        Err(failure) => {
            trace!(%addr, %failure, "exchange connect failed");
            machine.refusal(ProtocolRejection::Connect(failure))
        }
    }
}
