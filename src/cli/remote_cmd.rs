//! Remote and send command handlers

use std::path::PathBuf;

use crate::domain::command::DatagramCommand;
use crate::infrastructure::{send_datagram, RemoteError, StationClient};

use super::args::RemoteAction;
use super::presenter::{format_bytes, Presenter};

/// Handle remote subcommand
pub async fn handle_remote_command(
    host: &str,
    action: RemoteAction,
    presenter: &Presenter,
) -> Result<(), RemoteError> {
    let client = StationClient::new(host);

    match action {
        RemoteAction::List => {
            let names = client.list().await?;
            if names.is_empty() {
                presenter.info("No files stored");
            }
            for name in names {
                presenter.output(&name);
            }
        }
        RemoteAction::Start => {
            let status = client.start().await?;
            presenter.station_status(&status.status);
        }
        RemoteAction::Stop => {
            let status = client.stop().await?;
            presenter.station_status(&status.status);
        }
        RemoteAction::Download { name, output } => {
            let dest = output.unwrap_or_else(|| default_destination(&name));
            let bar = presenter.transfer_progress(&name, None);
            let result = client.download(&name, &dest, |n| bar.set_position(n)).await;
            bar.finish_and_clear();

            let written = result?;
            presenter.success(&format!(
                "Saved {} to {} ({})",
                name,
                dest.display(),
                format_bytes(written)
            ));
        }
    }

    Ok(())
}

/// Handle send subcommand
pub async fn handle_send(payload: &str, to: &str, presenter: &Presenter) -> Result<(), RemoteError> {
    if let DatagramCommand::Unknown(token) = DatagramCommand::parse(payload.as_bytes()) {
        presenter.warn(&format!(
            "'{}' is not a station command; known: {}, {}, {}",
            token,
            DatagramCommand::START_TOKEN,
            DatagramCommand::STOP_TOKEN,
            DatagramCommand::ERASE_TOKEN
        ));
    }

    let sent = send_datagram(to, payload.as_bytes()).await?;
    presenter.success(&format!("Sent {} bytes to {}", sent, to));
    Ok(())
}

/// Last path component of a listed name, so downloads land in the working directory
fn default_destination(name: &str) -> PathBuf {
    let base = name.rsplit('/').find(|part| !part.is_empty()).unwrap_or(name);
    PathBuf::from(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UdpSocket;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn destination_is_base_name() {
        assert_eq!(default_destination("unit_1.bin"), PathBuf::from("unit_1.bin"));
        assert_eq!(default_destination("/logs/a.txt"), PathBuf::from("a.txt"));
    }

    #[tokio::test]
    async fn download_to_explicit_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/unit_5.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 3000]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("copy.bin");
        handle_remote_command(
            &server.uri(),
            RemoteAction::Download {
                name: "unit_5.bin".to_string(),
                output: Some(dest.clone()),
            },
            &Presenter::new(),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(dest).unwrap(), vec![7u8; 3000]);
    }

    #[tokio::test]
    async fn stop_propagates_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stop"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = handle_remote_command(&server.uri(), RemoteAction::Stop, &Presenter::new()).await;
        assert!(matches!(
            result,
            Err(RemoteError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn send_delivers_unknown_payload_too() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap().to_string();

        handle_send("PING", &addr, &Presenter::new()).await.unwrap();

        let mut buf = [0u8; 16];
        let (n, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"PING");
    }
}
