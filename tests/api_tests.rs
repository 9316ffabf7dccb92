// tests/api_tests.rs
use easysetup_http_socket::connection::api::{self, ApiError, SEND_RECV_ERROR};
use easysetup_http_socket::connection::{ConnectionHandle, ListenerConfig};
use std::io::Write;
use std::net::{Ipv4Addr, TcpStream};

fn loopback_listener() -> ListenerConfig {
    ListenerConfig {
        bind_address: Ipv4Addr::LOCALHOST,
        ..ListenerConfig::with_port(0)
    }
}

#[test]
fn missing_handle_is_invalid_argument() {
    assert!(matches!(
        api::initialize_listener(None, &loopback_listener()),
        Err(ApiError::InvalidArgument)
    ));
    assert!(matches!(api::accept_client(None), Err(ApiError::InvalidArgument)));
    assert_eq!(api::configure_client_socket(None).attempted(), 0);
    api::cleanup_client(None);
    api::cleanup_all(None);
}

#[test]
fn transfers_on_uninitialized_handle_return_minus_one() {
    let handle = ConnectionHandle::new();
    let mut buf = [0u8; 8];
    assert_eq!(api::send(&handle, Some(b"data")), SEND_RECV_ERROR);
    assert_eq!(api::receive(&handle, Some(&mut buf), 0), SEND_RECV_ERROR);
}

#[test]
fn accept_on_unbound_handle_is_connect_failed() {
    let mut handle = ConnectionHandle::new();
    assert!(matches!(
        api::accept_client(Some(&mut handle)),
        Err(ApiError::ConnectFailed(_))
    ));
}

#[test]
fn provisioning_exchange_through_status_codes() {
    let mut handle = ConnectionHandle::new();
    api::initialize_listener(Some(&mut handle), &loopback_listener()).unwrap();
    let addr = handle.local_addr().unwrap();

    let mut peer = TcpStream::connect(addr).unwrap();
    api::accept_client(Some(&mut handle)).unwrap();
    assert_eq!(api::configure_client_socket(Some(&handle)).attempted(), 5);

    // missing buffers are rejected even on a live connection
    assert_eq!(api::send(&handle, None), SEND_RECV_ERROR);
    assert_eq!(api::receive(&handle, None, 0), SEND_RECV_ERROR);

    peer.write_all(b"0123456789").unwrap();
    drop(peer);

    let mut buf = [0u8; 32];
    let mut received = 0usize;
    loop {
        let read = api::receive(&handle, Some(&mut buf), received);
        assert!(read >= 0);
        if read == 0 {
            break;
        }
        received += read as usize;
    }
    assert_eq!(received, 10);

    // offset past the buffer
    assert_eq!(api::receive(&handle, Some(&mut buf), 32), SEND_RECV_ERROR);

    api::cleanup_client(Some(&mut handle));
    assert!(handle.is_listening());
    assert_eq!(api::send(&handle, Some(b"late")), SEND_RECV_ERROR);

    api::cleanup_all(Some(&mut handle));
    api::cleanup_all(Some(&mut handle));
    assert!(!handle.is_listening());
}
