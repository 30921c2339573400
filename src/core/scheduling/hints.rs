//! Placement hints carried between scheduling passes.

use std::collections::HashMap;

use crate::core::pod::Pod;

/// Pods managed by one controller are interchangeable for hinting purposes,
/// so the controller uid keys them all. Standalone pods key by namespaced
/// name.
pub fn hint_key(pod: &Pod) -> String {
    match pod.controller_ref() {
        Some(controller) => controller.uid.clone(),
        None => format!("{}/{}", pod.metadata.namespace, pod.metadata.name),
    }
}

/// Two-generation hint store. Fresh hints land in `current`; `drop_old`
/// retires the previous generation so keys unused for two passes disappear
/// instead of accumulating forever.
#[derive(Debug, Default)]
pub struct Hints {
    current: HashMap<String, String>,
    old: HashMap<String, String>,
}

impl Hints {
    pub fn new() -> Self {
        Default::default()
    }

    /// Hinted node for the pod. A hit found in the old generation is
    /// promoted, keeping actively used hints alive across `drop_old`.
    pub fn get(&mut self, pod: &Pod) -> Option<String> {
        let key = hint_key(pod);
        if let Some(node_name) = self.current.get(&key) {
            return Some(node_name.clone());
        }
        if let Some(node_name) = self.old.remove(&key) {
            self.current.insert(key, node_name.clone());
            return Some(node_name);
        }
        None
    }

    pub fn set(&mut self, pod: &Pod, node_name: String) {
        self.current.insert(hint_key(pod), node_name);
    }

    /// Ages the store: current hints become old, old ones are dropped.
    pub fn drop_old(&mut self) {
        self.old = std::mem::take(&mut self.current);
    }

    pub fn len(&self) -> usize {
        self.current.len() + self.old.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.old.is_empty()
    }
}
