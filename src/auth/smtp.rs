//! SMTP AUTH LOGIN.
//!
//! Usernames and passwords go over the wire base64-encoded after the
//! server's `334` prompts. The EHLO reply must be `250`; servers that refuse
//! EHLO or AUTH LOGIN end the exchange as rejected.

use super::machine::{exchange_over_tcp, ExchangeOutcome, StateMachine, Transition};
use super::{CredentialExchange, Protocol};
use crate::error::ProtocolRejection;
use crate::types::Credential;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::net::SocketAddr;
use std::time::Duration;

/// Name sent with EHLO unless configured otherwise.
pub const DEFAULT_HELO: &str = "localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpState {
    Connected,
    GreetingRead,
    EhloSent,
    AuthLoginRequested,
    UsernameSent,
    PasswordSent,
    Authenticated,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpCommand {
    Ehlo,
    AuthLogin,
    Username,
    Password,
}

const TABLE: &[Transition<SmtpState, SmtpCommand>] = &[
    Transition {
        from: SmtpState::Connected,
        expect: Some(&[220]),
        send: None,
        to: SmtpState::GreetingRead,
    },
    Transition {
        from: SmtpState::GreetingRead,
        expect: None,
        send: Some(SmtpCommand::Ehlo),
        to: SmtpState::EhloSent,
    },
    Transition {
        from: SmtpState::EhloSent,
        expect: Some(&[250]),
        send: Some(SmtpCommand::AuthLogin),
        to: SmtpState::AuthLoginRequested,
    },
    Transition {
        from: SmtpState::AuthLoginRequested,
        expect: Some(&[334]),
        send: Some(SmtpCommand::Username),
        to: SmtpState::UsernameSent,
    },
    Transition {
        from: SmtpState::UsernameSent,
        expect: Some(&[334]),
        send: Some(SmtpCommand::Password),
        to: SmtpState::PasswordSent,
    },
    Transition {
        from: SmtpState::PasswordSent,
        expect: Some(&[235]),
        send: None,
        to: SmtpState::Authenticated,
    },
];

pub const SMTP_MACHINE: StateMachine<SmtpState, SmtpCommand> = StateMachine {
    start: SmtpState::Connected,
    accepted: SmtpState::Authenticated,
    rejected: SmtpState::Rejected,
    table: TABLE,
};

/// SMTP AUTH LOGIN credential exchange.
#[derive(Debug, Clone)]
pub struct SmtpExchange {
    timeout: Duration,
    helo: String,
}

impl SmtpExchange {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            helo: DEFAULT_HELO.to_string(),
        }
    }

    /// Use a different EHLO name.
    pub fn with_helo(mut self, helo: impl Into<String>) -> Self {
        self.helo = helo.into();
        self
    }

    fn render(&self, command: &SmtpCommand, credential: &Credential) -> String {
        match command {
            SmtpCommand::Ehlo => format!("EHLO {}", self.helo),
            SmtpCommand::AuthLogin => "AUTH LOGIN".to_string(),
            SmtpCommand::Username => STANDARD.encode(credential.username()),
            SmtpCommand::Password => STANDARD.encode(credential.password()),
        }
    }
}

#[async_trait]
impl CredentialExchange for SmtpExchange {
    fn protocol(&self) -> Protocol {
        Protocol::Smtp
    }

    async fn attempt(&self, addr: SocketAddr, credential: &Credential) -> ExchangeOutcome {
        // Base64 hides line breaks; check the raw pair.
        if !credential.is_line_safe() {
            return SMTP_MACHINE.refusal(ProtocolRejection::LineBreak);
        }
        exchange_over_tcp(&SMTP_MACHINE, addr, self.timeout, |command| {
            self.render(command, credential)
        })
        .await
    }
}
