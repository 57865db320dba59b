//! Aggregation of commands contributed by independently-lived components.
//!
//! Components keep ownership of their commands. They register an
//! `Arc<impl CommandProvider>` and the registry only keeps a weak handle, so
//! a component that goes away without unregistering simply drops out of the
//! next snapshot.

use std::sync::{Arc, Weak};

use crate::command::{Command, CommandProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(u64);

#[derive(Default)]
pub struct CommandRegistry {
    providers: Vec<(ProviderId, Weak<dyn CommandProvider>)>,
    next_id: u64,
    generation: u64,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: CommandProvider + 'static>(&mut self, provider: &Arc<P>) -> ProviderId {
        let id = ProviderId(self.next_id);
        self.next_id += 1;
        let weak: Weak<dyn CommandProvider> = Arc::downgrade(provider) as Weak<dyn CommandProvider>;
        self.providers.push((id, weak));
        self.generation += 1;
        log::debug!("registered command provider {id:?}");
        id
    }

    /// Returns whether `id` was registered.
    pub fn unregister(&mut self, id: ProviderId) -> bool {
        let before = self.providers.len();
        self.providers.retain(|(pid, _)| *pid != id);
        let removed = self.providers.len() != before;
        if removed {
            self.generation += 1;
        }
        removed
    }

    /// Bumped whenever the set of providers changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Live providers, in registration order.
    pub fn snapshot(&mut self) -> CommandSet {
        let mut providers = Vec::with_capacity(self.providers.len());
        let before = self.providers.len();
        self.providers.retain(|(_, weak)| match weak.upgrade() {
            Some(provider) => {
                providers.push(provider);
                true
            }
            None => false,
        });
        if self.providers.len() != before {
            log::debug!("pruned {} dropped command providers", before - self.providers.len());
            self.generation += 1;
        }
        CommandSet {
            providers,
            generation: self.generation,
        }
    }
}

/// A point-in-time view of every registered provider, indexed as one
/// concatenated list.
#[derive(Clone, Default)]
pub struct CommandSet {
    providers: Vec<Arc<dyn CommandProvider>>,
    generation: u64,
}

impl CommandSet {
    /// A set over explicit providers, outside any registry.
    pub fn from_providers(providers: Vec<Arc<dyn CommandProvider>>) -> Self {
        Self {
            providers,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.providers.iter().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, mut idx: usize) -> Option<&Command> {
        for provider in &self.providers {
            let len = provider.len();
            if idx < len {
                return provider.command(idx);
            }
            idx -= len;
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> + '_ {
        self.providers
            .iter()
            .flat_map(|p| (0..p.len()).filter_map(move |i| p.command(i)))
    }
}

impl CommandProvider for CommandSet {
    fn len(&self) -> usize {
        CommandSet::len(self)
    }

    fn command(&self, idx: usize) -> Option<&Command> {
        self.get(idx)
    }
}
