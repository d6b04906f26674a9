//! Named map of logical sources plus the listener pose.

use crate::listener::Listener;
use crate::source::Source;
use std::collections::HashMap;

/// All caller-visible engine state: sources keyed by name and the
/// listener. Lives behind one RwLock; the dispatcher worker takes write,
/// facade queries take read.
#[derive(Default)]
pub struct Registry {
    sources: HashMap<String, Source>,
    listener: Listener,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            listener: Listener::new(),
        }
    }

    pub fn insert(&mut self, source: Source) {
        self.sources.insert(source.name.clone(), source);
    }

    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Source> {
        self.sources.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Source> {
        self.sources.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Source> {
        self.sources.values_mut()
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut Listener {
        &mut self.listener
    }

    /// Recomputes gain and distance for every source after a listener or
    /// master-volume change.
    pub fn recompute_all(&mut self, master_gain: f32) {
        let listener = self.listener;
        for source in self.sources.values_mut() {
            source.recompute(&listener, master_gain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attenuation::Attenuation;
    use crate::math::Vec3;
    use crate::source::SourceDesc;

    fn desc(name: &str, x: f32) -> SourceDesc {
        SourceDesc {
            priority: false,
            streaming: false,
            looping: false,
            name: name.into(),
            file: "f.wav".into(),
            position: Vec3::new(x, 0.0, 0.0),
            attenuation: Attenuation::Linear,
            dist_or_roll: 100.0,
            temporary: false,
        }
    }

    #[test]
    fn sourcename_is_unique() {
        let mut registry = Registry::new();
        registry.insert(Source::new(desc("a", 10.0)));
        registry.insert(Source::new(desc("a", 20.0)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().position.x, 20.0);
    }

    #[test]
    fn recompute_all_tracks_listener() {
        let mut registry = Registry::new();
        registry.insert(Source::new(desc("near", 10.0)));
        registry.insert(Source::new(desc("far", 90.0)));
        registry.recompute_all(1.0);
        let near = registry.get("near").unwrap().computed_gain;
        let far = registry.get("far").unwrap().computed_gain;
        assert!(near > far);

        // Move the listener next to the far source; gains swap order.
        registry
            .listener_mut()
            .set_position(Vec3::new(90.0, 0.0, 0.0))
            .unwrap();
        registry.recompute_all(1.0);
        let near = registry.get("near").unwrap().computed_gain;
        let far = registry.get("far").unwrap().computed_gain;
        assert!(far > near);
    }

    #[test]
    fn recompute_all_applies_master() {
        let mut registry = Registry::new();
        registry.insert(Source::new(desc("a", 0.0)));
        registry.insert(Source::new(desc("b", 50.0)));
        registry.recompute_all(0.0);
        assert!(registry.iter().all(|s| s.computed_gain == 0.0));
    }
}
