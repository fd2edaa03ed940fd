//! In-memory holder for the most recently fetched resource list.

use std::sync::Arc;

use fileselect_types::ResourceDescriptor;

/// What the widget currently knows about the backend's resource list.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ListState {
    /// No successful fetch has completed yet.
    #[default]
    NotLoaded,
    /// A fetch returned at least one resource.
    Loaded(Arc<[ResourceDescriptor]>),
    /// A fetch returned zero resources.
    LoadedEmpty,
}

impl ListState {
    pub fn is_loaded(&self) -> bool {
        !matches!(self, Self::NotLoaded)
    }

    /// Resources in backend order; empty unless `Loaded`.
    pub fn items(&self) -> &[ResourceDescriptor] {
        match self {
            Self::Loaded(items) => items,
            Self::NotLoaded | Self::LoadedEmpty => &[],
        }
    }
}

/// Reference to one entry of a specific list snapshot.
///
/// Tokens are only handed out by [`ResourceListCache::token_at`], so a choice
/// can never name a descriptor that was not offered. A token taken before a
/// replacement carries the old revision and is rejected afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChoiceToken {
    revision: u64,
    index: usize,
}

impl ChoiceToken {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Wholesale-replaced list snapshot with a revision counter.
#[derive(Clone, Debug, Default)]
pub struct ResourceListCache {
    state: ListState,
    revision: u64,
}

impl ResourceListCache {
    /// Swap in a freshly fetched list. Returns the new revision.
    pub fn replace(&mut self, items: Vec<ResourceDescriptor>) -> u64 {
        self.state = if items.is_empty() {
            ListState::LoadedEmpty
        } else {
            ListState::Loaded(Arc::from(items))
        };
        self.revision += 1;
        self.revision
    }

    /// Forget the snapshot. Every token handed out so far goes stale.
    pub fn invalidate(&mut self) {
        self.state = ListState::NotLoaded;
        self.revision += 1;
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn token_at(&self, index: usize) -> Option<ChoiceToken> {
        (index < self.state.items().len()).then_some(ChoiceToken {
            revision: self.revision,
            index,
        })
    }

    /// Resolve a token against the current snapshot; `None` when stale.
    pub fn resolve(&self, token: ChoiceToken) -> Option<&ResourceDescriptor> {
        if token.revision != self.revision {
            return None;
        }
        self.state.items().get(token.index)
    }

    pub fn tokens(&self) -> impl Iterator<Item = (ChoiceToken, &ResourceDescriptor)> {
        let revision = self.revision;
        self.state
            .items()
            .iter()
            .enumerate()
            .map(move |(index, descriptor)| (ChoiceToken { revision, index }, descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named(name: &str) -> ResourceDescriptor {
        ResourceDescriptor::from_value(json!({ "name": name })).unwrap()
    }

    #[test]
    fn starts_not_loaded() {
        let cache = ResourceListCache::default();
        assert_eq!(cache.state(), &ListState::NotLoaded);
        assert!(cache.token_at(0).is_none());
    }

    #[test]
    fn empty_response_is_loaded_empty() {
        let mut cache = ResourceListCache::default();
        cache.replace(Vec::new());
        assert_eq!(cache.state(), &ListState::LoadedEmpty);
        assert!(cache.state().is_loaded());
        assert!(cache.token_at(0).is_none());
    }

    #[test]
    fn tokens_go_stale_after_replace() {
        let mut cache = ResourceListCache::default();
        cache.replace(vec![named("a.csv"), named("b.csv")]);
        let token = cache.token_at(1).expect("token");
        assert_eq!(cache.resolve(token).map(ResourceDescriptor::name), Some("b.csv"));

        cache.replace(vec![named("a.csv"), named("b.csv")]);
        assert!(cache.resolve(token).is_none());
        assert_eq!(cache.tokens().count(), 2);
    }

    #[test]
    fn invalidate_drops_snapshot_and_tokens() {
        let mut cache = ResourceListCache::default();
        cache.replace(vec![named("a.csv")]);
        let token = cache.token_at(0).expect("token");

        cache.invalidate();
        assert_eq!(cache.state(), &ListState::NotLoaded);
        assert!(cache.resolve(token).is_none());
        assert_eq!(cache.tokens().count(), 0);

        // a refill must not revive tokens from before the invalidation
        cache.replace(vec![named("a.csv")]);
        assert!(cache.resolve(token).is_none());
    }
}
