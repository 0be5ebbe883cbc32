//! MemoryReceiver - keeps sources in memory

use std::sync::{Mutex, MutexGuard};

use contracts::{ContractError, Source, SourceReceiver};

/// Receiver that collects every source it is handed
#[derive(Default)]
pub struct MemoryReceiver {
    name: String,
    sources: Mutex<Vec<Source>>,
}

impl MemoryReceiver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Copy of the received sources, in arrival order
    pub fn snapshot(&self) -> Vec<Source> {
        self.lock().clone()
    }

    /// Drain the received sources
    pub fn take(&self) -> Vec<Source> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while pushing cannot leave the Vec half-written
    fn lock(&self) -> MutexGuard<'_, Vec<Source>> {
        self.sources.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SourceReceiver for MemoryReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self, source: Source) -> Result<(), ContractError> {
        self.lock().push(source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ServiceInstanceUpdate;

    fn update(name: &str) -> Source {
        Source::ServiceInstanceUpdate(ServiceInstanceUpdate {
            service_id: "Y2F0YWxvZw==.0".to_string(),
            name: name.to_string(),
            time_bucket: 1,
        })
    }

    #[test]
    fn test_collects_in_order() {
        let receiver = MemoryReceiver::new("mem");
        receiver.receive(update("a")).unwrap();
        receiver.receive(update("b")).unwrap();

        let sources = receiver.snapshot();
        assert_eq!(sources, vec![update("a"), update("b")]);
        assert_eq!(receiver.len(), 2);
    }

    #[test]
    fn test_take_drains() {
        let receiver = MemoryReceiver::new("mem");
        receiver.receive(update("a")).unwrap();

        assert_eq!(receiver.take().len(), 1);
        assert!(receiver.is_empty());
    }
}
