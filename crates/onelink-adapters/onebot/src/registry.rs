//! Listener bindings: which bots share one webhook path.
//!
//! A binding is created the first time a bot listens on a path and lives for
//! the adapter's lifetime. Its bot set may grow and shrink; lookups always
//! scan the current set.

use std::sync::Arc;

use parking_lot::RwLock;

use onelink_core::{AdapterError, AdapterResult, BotInstance};

/// The ordered set of bots registered on one listening path.
#[derive(Debug)]
pub struct ListenerBinding {
    path: String,
    bots: RwLock<Vec<Arc<BotInstance>>>,
}

impl ListenerBinding {
    /// Creates an empty binding for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bots: RwLock::new(Vec::new()),
        }
    }

    /// The listening path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Adds `bot` to the binding.
    ///
    /// # Errors
    /// [`AdapterError::DuplicateSelfId`] if a bot with the same self ID is
    /// already bound here.
    pub fn insert(&self, bot: Arc<BotInstance>) -> AdapterResult<()> {
        let mut bots = self.bots.write();
        if bots.iter().any(|b| b.self_id() == bot.self_id()) {
            return Err(AdapterError::DuplicateSelfId {
                self_id: bot.self_id().to_string(),
                path: self.path.clone(),
            });
        }
        bots.push(bot);
        Ok(())
    }

    /// Removes and returns the bot with `self_id`.
    pub fn remove(&self, self_id: &str) -> Option<Arc<BotInstance>> {
        let mut bots = self.bots.write();
        let index = bots.iter().position(|b| b.self_id() == self_id)?;
        Some(bots.remove(index))
    }

    /// Finds the bot whose self ID equals `self_id` exactly.
    pub fn find(&self, self_id: &str) -> Option<Arc<BotInstance>> {
        self.bots
            .read()
            .iter()
            .find(|b| b.self_id() == self_id)
            .cloned()
    }

    /// Self IDs in registration order.
    pub fn self_ids(&self) -> Vec<String> {
        self.bots
            .read()
            .iter()
            .map(|b| b.self_id().to_string())
            .collect()
    }

    /// Number of bound bots.
    pub fn len(&self) -> usize {
        self.bots.read().len()
    }

    /// Returns `true` if no bot is bound.
    pub fn is_empty(&self) -> bool {
        self.bots.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onelink_core::TransportConfig;

    fn bot(id: &str) -> Arc<BotInstance> {
        BotInstance::new(id, TransportConfig::default())
    }

    #[test]
    fn test_find_exact_match() {
        let binding = ListenerBinding::new("/onebot");
        binding.insert(bot("10001")).unwrap();
        binding.insert(bot("10002")).unwrap();

        assert_eq!(binding.find("10002").unwrap().self_id(), "10002");
        assert!(binding.find("1000").is_none());
        assert!(binding.find("100010").is_none());
        assert!(binding.find("").is_none());
    }

    #[test]
    fn test_find_is_case_sensitive() {
        let binding = ListenerBinding::new("/onebot");
        binding.insert(bot("AliceBot")).unwrap();

        assert!(binding.find("AliceBot").is_some());
        assert!(binding.find("alicebot").is_none());
        assert!(binding.find("ALICEBOT").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let binding = ListenerBinding::new("/onebot");
        binding.insert(bot("10001")).unwrap();
        let err = binding.insert(bot("10001")).unwrap_err();
        assert!(matches!(err, AdapterError::DuplicateSelfId { .. }));
        assert_eq!(binding.len(), 1);
    }

    #[test]
    fn test_remove_keeps_order() {
        let binding = ListenerBinding::new("/onebot");
        for id in ["1", "2", "3"] {
            binding.insert(bot(id)).unwrap();
        }
        assert_eq!(binding.remove("2").unwrap().self_id(), "2");
        assert!(binding.remove("2").is_none());
        assert_eq!(binding.self_ids(), vec!["1", "3"]);
        assert!(binding.find("2").is_none());
    }
}
