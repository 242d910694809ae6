//! Scripted transport for driving the sampling engine in tests.

use crate::{Error, Result, Transport};
use embedded_hal::i2c::ErrorKind;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum Reply {
    Bytes(Vec<u8>),
    SendError,
    ReceiveError,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    sent: Vec<Vec<u8>>,
}

/// Transport answering each command from a queue of canned replies.
///
/// Clones share the script, so a test can keep a handle after moving one into
/// the device.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response with raw bytes.
    pub fn push_bytes(&self, bytes: &[u8]) -> &Self {
        self.push(Reply::Bytes(bytes.to_vec()))
    }

    /// Queues a big-endian measurement code.
    pub fn push_code(&self, code: u16) -> &Self {
        self.push_bytes(&code.to_be_bytes())
    }

    /// Queues an identification response carrying `chip_id`.
    pub fn push_identity(&self, chip_id: u8) -> &Self {
        self.push_bytes(&[chip_id, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF])
    }

    /// Makes the next command fail on send.
    pub fn push_send_error(&self) -> &Self {
        self.push(Reply::SendError)
    }

    /// Makes the next command fail on receive.
    pub fn push_receive_error(&self) -> &Self {
        self.push(Reply::ReceiveError)
    }

    /// Commands sent so far, including failed ones.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.script.lock().unwrap().sent.clone()
    }

    /// Number of commands sent so far.
    pub fn transactions(&self) -> usize {
        self.script.lock().unwrap().sent.len()
    }

    fn push(&self, reply: Reply) -> &Self {
        self.script.lock().unwrap().replies.push_back(reply);
        self
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut script = self.script.lock().unwrap();
        script.sent.push(bytes.to_vec());
        if matches!(script.replies.front(), Some(Reply::SendError)) {
            script.replies.pop_front();
            return Err(Error::Bus(ErrorKind::ArbitrationLoss));
        }
        Ok(bytes.len())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        match script.replies.pop_front() {
            Some(Reply::Bytes(bytes)) => {
                buf.copy_from_slice(&bytes[..buf.len()]);
                Ok(())
            }
            Some(Reply::ReceiveError) | Some(Reply::SendError) | None => {
                Err(Error::Bus(ErrorKind::Bus))
            }
        }
    }
}
