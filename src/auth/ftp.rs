//! FTP USER/PASS login.

use super::machine::{exchange_over_tcp, ExchangeOutcome, StateMachine, Transition};
use super::{CredentialExchange, Protocol};
use crate::types::Credential;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;

/// Handshake states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpState {
    Connected,
    UserSent,
    PasswordRequested,
    Authenticated,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpCommand {
    User,
    Pass,
}

const TABLE: &[Transition<FtpState, FtpCommand>] = &[
    Transition {
        from: FtpState::Connected,
        expect: Some(&[220]),
        send: Some(FtpCommand::User),
        to: FtpState::UserSent,
    },
    Transition {
        from: FtpState::UserSent,
        expect: Some(&[331]),
        send: Some(FtpCommand::Pass),
        to: FtpState::PasswordRequested,
    },
    Transition {
        from: FtpState::PasswordRequested,
        expect: Some(&[230]),
        send: None,
        to: FtpState::Authenticated,
    },
];

pub const FTP_MACHINE: StateMachine<FtpState, FtpCommand> = StateMachine {
    start: FtpState::Connected,
    accepted: FtpState::Authenticated,
    rejected: FtpState::Rejected,
    table: TABLE,
};

fn render(command: &FtpCommand, credential: &Credential) -> String {
    match command {
        FtpCommand::User => format!("USER {}", credential.username()),
        FtpCommand::Pass => format!("PASS {}", credential.password()),
    }
}

/// FTP credential exchange.
#[derive(Debug, Clone)]
pub struct FtpExchange {
    timeout: Duration,
}

impl FtpExchange {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CredentialExchange for FtpExchange {
    fn protocol(&self) -> Protocol {
        Protocol::Ftp
    }

    async fn attempt(&self, addr: SocketAddr, credential: &Credential) -> ExchangeOutcome {
        exchange_over_tcp(&FTP_MACHINE, addr, self.timeout, |command| {
            render(command, credential)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::spawn_ftp_stub;
    use crate::error::ProtocolRejection;

    #[tokio::test]
    async fn test_only_matching_pair_succeeds() {
        let stub = spawn_ftp_stub("admin", "secret").await;
        let exchange = FtpExchange::new(Duration::from_secs(1));

        let users = ["admin", "root", "guest"];
        let passwords = ["secret", "admin", "123456"];
        for user in users {
            for pass in passwords {
                let outcome = exchange.attempt(stub.addr, &Credential::new(user, pass)).await;
                let expected = user == "admin" && pass == "secret";
                assert_eq!(outcome.succeeded, expected, "{}:{}", user, pass);
            }
        }
    }

    #[tokio::test]
    async fn test_success_reports_banner_and_state() {
        let stub = spawn_ftp_stub("admin", "secret").await;
        let exchange = FtpExchange::new(Duration::from_secs(1));

        let outcome = exchange
            .attempt(stub.addr, &Credential::new("admin", "secret"))
            .await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.final_state, "Authenticated");
        assert_eq!(outcome.banner.as_deref(), Some("220 stub FTP ready"));
        assert!(outcome.rejection.is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected_with_code() {
        let stub = spawn_ftp_stub("admin", "secret").await;
        let exchange = FtpExchange::new(Duration::from_secs(1));

        let outcome = exchange
            .attempt(stub.addr, &Credential::new("admin", "nope"))
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.final_state, "Rejected");
        assert_eq!(outcome.rejection, Some(ProtocolRejection::UnexpectedReply { code: 530 }));
    }

    #[test]
    fn test_commands_render() {
        let cred = Credential::new("anonymous", "guest@");
        assert_eq!(render(&FtpCommand::User, &cred), "USER anonymous");
        assert_eq!(render(&FtpCommand::Pass, &cred), "PASS guest@");
    }

    #[tokio::test]
    async fn test_injected_command_is_not_sent() {
        let stub = spawn_ftp_stub("admin", "secret").await;
        let exchange = FtpExchange::new(Duration::from_secs(1));

        let outcome = exchange
            .attempt(stub.addr, &Credential::new("admin", "x\r\nDELE important.txt"))
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.final_state, "Rejected");
        assert_eq!(outcome.rejection, Some(ProtocolRejection::LineBreak));
        assert!(outcome.banner.is_none());
    }
}
