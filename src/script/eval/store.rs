use std::collections::VecDeque;

use crate::common::*;
use super::value::{Object, Value};

/// Fewest live objects at which a collection is considered.
const MIN_COLLECT_THRESHOLD: usize = 64;

/// Mapping from variable name to value for one lexical level.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    variables: HashMap<String, Value>,
}

#[derive(Debug)]
pub(crate) struct Store {
    // Scope stack, the global scope is always at index 0 and is never popped
    pub(crate) scopes: Vec<Scope>,
    // Object slots, `None` for slots that were reclaimed and are listed in
    // `free_regions`
    pub(crate) heap_regions: Vec<Option<Object>>,
    pub(crate) free_regions: VecDeque<HeapPos>,
    // Values the evaluator holds outside of any scope, such as the evaluated
    // arguments of a call that is still evaluating its later arguments
    pub(crate) temporaries: Vec<Value>,
    live_objects: usize,
    collect_threshold: usize,
}

impl Store {
    pub(crate) fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            heap_regions: Vec::new(),
            free_regions: VecDeque::new(),
            temporaries: Vec::new(),
            live_objects: 0,
            collect_threshold: MIN_COLLECT_THRESHOLD,
        }
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub(crate) fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "popping the global scope");
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Resolves a name, searching from the innermost to the outermost scope.
    pub(crate) fn read(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.variables.get(name))
    }

    pub(crate) fn read_global(&self, name: &str) -> Option<&Value> {
        self.scopes[0].variables.get(name)
    }

    /// Writes into the innermost scope, regardless of which scope the name
    /// was previously bound in.
    pub(crate) fn write(&mut self, name: &str, value: Value) {
        let last_idx = self.scopes.len() - 1;
        self.scopes[last_idx].variables.insert(name.to_string(), value);
    }

    pub(crate) fn write_global(&mut self, name: &str, value: Value) {
        self.scopes[0].variables.insert(name.to_string(), value);
    }

    pub(crate) fn alloc_object(&mut self, object: Object) -> Value {
        self.live_objects += 1;
        match self.free_regions.pop_back() {
            Some(heap_pos) => {
                self.heap_regions[heap_pos as usize] = Some(object);
                Value::Object(heap_pos)
            },
            None => {
                let heap_pos = self.heap_regions.len() as HeapPos;
                self.heap_regions.push(Some(object));
                Value::Object(heap_pos)
            },
        }
    }

    /// Object at `heap_pos`, or `None` if the position was never allocated or
    /// has been reclaimed.
    pub(crate) fn get_object(&self, heap_pos: HeapPos) -> Option<&Object> {
        self.heap_regions.get(heap_pos as usize).and_then(|slot| slot.as_ref())
    }

    /// Object behind a value produced by the running evaluation. Such values
    /// are always reachable, so their slot is never reclaimed.
    pub(crate) fn object(&self, heap_pos: HeapPos) -> &Object {
        match &self.heap_regions[heap_pos as usize] {
            Some(object) => object,
            None => unreachable!("object at {} was reclaimed while in use", heap_pos),
        }
    }

    pub(crate) fn object_mut(&mut self, heap_pos: HeapPos) -> &mut Object {
        match &mut self.heap_regions[heap_pos as usize] {
            Some(object) => object,
            None => unreachable!("object at {} was reclaimed while in use", heap_pos),
        }
    }

    /// Collects garbage once the number of live objects has doubled since the
    /// previous collection.
    pub(crate) fn maybe_collect(&mut self) -> Option<usize> {
        if self.live_objects < self.collect_threshold {
            return None;
        }
        let reclaimed = self.collect_garbage();
        self.collect_threshold = MIN_COLLECT_THRESHOLD.max(2 * self.live_objects);
        Some(reclaimed)
    }

    /// Marks every object reachable from the scopes and the temporaries, then
    /// reclaims the rest. Returns the number of reclaimed objects.
    pub(crate) fn collect_garbage(&mut self) -> usize {
        let mut marked = vec![false; self.heap_regions.len()];
        let mut pending: Vec<HeapPos> = self.scopes.iter()
            .flat_map(|scope| scope.variables.values())
            .chain(self.temporaries.iter())
            .filter_map(object_pos)
            .collect();

        while let Some(heap_pos) = pending.pop() {
            let idx = heap_pos as usize;
            if marked[idx] {
                continue;
            }
            marked[idx] = true;
            match &self.heap_regions[idx] {
                Some(Object::Array(values)) => pending.extend(values.iter().filter_map(object_pos)),
                Some(Object::PlainObject(properties)) => pending.extend(properties.values().filter_map(object_pos)),
                _ => {},
            }
        }

        let mut reclaimed = 0;
        for (idx, slot) in self.heap_regions.iter_mut().enumerate() {
            if slot.is_some() && !marked[idx] {
                *slot = None;
                self.free_regions.push_back(idx as HeapPos);
                reclaimed += 1;
            }
        }
        self.live_objects -= reclaimed;
        reclaimed
    }
}

fn object_pos(value: &Value) -> Option<HeapPos> {
    match value {
        Value::Object(heap_pos) => Some(*heap_pos),
        _ => None,
    }
}
