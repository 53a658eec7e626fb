//! Shared recording sink for scenario tests

use std::sync::Arc;

use parking_lot::Mutex;

use lumen_artnet::LightSet;

/// Records every sink call; clones share the same buffers
#[derive(Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<SinkLog>>,
}

#[derive(Default)]
pub struct SinkLog {
    pub frames: Vec<(usize, Vec<u8>)>,
    pub started: Vec<usize>,
    pub stopped: Vec<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    pub fn frames(&self) -> Vec<(usize, Vec<u8>)> {
        self.inner.lock().frames.clone()
    }

    pub fn last_frame(&self, port: usize) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .frames
            .iter()
            .rev()
            .find(|(p, _)| *p == port)
            .map(|(_, data)| data.clone())
    }

    pub fn started(&self) -> Vec<usize> {
        self.inner.lock().started.clone()
    }

    pub fn stopped(&self) -> Vec<usize> {
        self.inner.lock().stopped.clone()
    }
}

impl LightSet for RecordingSink {
    fn start(&mut self, port: usize) {
        self.inner.lock().started.push(port);
    }

    fn stop(&mut self, port: usize) {
        self.inner.lock().stopped.push(port);
    }

    fn set_data(&mut self, port: usize, data: &[u8]) {
        self.inner.lock().frames.push((port, data.to_vec()));
    }
}
