// src/server/handler.rs

/// Produces the reply for one provisioning exchange.
///
/// `respond` sees every byte received so far and returns `None` while it
/// still needs more. Bytes are opaque at this layer.
pub trait Responder {
    fn respond(&mut self, request: &[u8]) -> Option<Vec<u8>>;
}

impl<F> Responder for F
where
    F: FnMut(&[u8]) -> Option<Vec<u8>>,
{
    fn respond(&mut self, request: &[u8]) -> Option<Vec<u8>> {
        self(request)
    }
}

/// Sends back whatever the first read delivered.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoResponder;

impl Responder for EchoResponder {
    fn respond(&mut self, request: &[u8]) -> Option<Vec<u8>> {
        Some(request.to_vec())
    }
}
