// tests/receive_window_properties.rs
use easysetup_http_socket::connection::{ConnectionError, ConnectionHandle, ListenerConfig};
use proptest::prelude::*;
use std::io::Write;
use std::net::{Ipv4Addr, TcpStream};

const FILL: u8 = 0x11;
const PAYLOAD: u8 = 0xEE;

fn connected_pair() -> (ConnectionHandle, TcpStream) {
    let mut handle = ConnectionHandle::new();
    handle
        .initialize_listener(&ListenerConfig {
            bind_address: Ipv4Addr::LOCALHOST,
            ..ListenerConfig::with_port(0)
        })
        .unwrap();
    let peer = TcpStream::connect(handle.local_addr().unwrap()).unwrap();
    handle.accept_client().unwrap();
    (handle, peer)
}

fn capacity_and_offset() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|capacity| (Just(capacity), 0..capacity))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn receive_stays_inside_window(
        (capacity, offset) in capacity_and_offset(),
        payload_len in 1usize..128,
    ) {
        let (handle, mut peer) = connected_pair();
        peer.write_all(&vec![PAYLOAD; payload_len]).unwrap();
        drop(peer);

        let mut buf = vec![FILL; capacity];
        let mut received = offset;

        if offset == capacity - 1 {
            prop_assert!(matches!(
                handle.receive(&mut buf, offset),
                Err(ConnectionError::BufferFull)
            ));
        } else {
            while received < capacity - 1 {
                let read = handle.receive(&mut buf, received).unwrap();
                if read == 0 {
                    break;
                }
                received += read;
            }
            let expected = payload_len.min(capacity - 1 - offset);
            prop_assert_eq!(received - offset, expected);
            prop_assert!(buf[offset..received].iter().all(|&b| b == PAYLOAD));
        }

        prop_assert!(buf[..offset].iter().all(|&b| b == FILL));
        prop_assert!(buf[received..].iter().all(|&b| b == FILL));
        prop_assert_eq!(buf[capacity - 1], FILL);
    }
}
