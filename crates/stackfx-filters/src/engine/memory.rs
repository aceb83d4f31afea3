//! In-process media engine.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{EngineError, FilterHandle, LiveFilter, Producer, same_filter};

/// Filter whose properties are kept in memory.
#[derive(Debug)]
pub struct MemoryFilter {
    service: String,
    properties: RefCell<BTreeMap<String, String>>,
}

impl MemoryFilter {
    /// Creates a filter for the given backend service.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            properties: RefCell::new(BTreeMap::new()),
        }
    }

    /// Sets a property before the filter is handed to a producer.
    #[must_use]
    pub fn with_property(self, name: &str, value: &str) -> Self {
        self.set_property(name, value);
        self
    }
}

impl LiveFilter for MemoryFilter {
    fn service(&self) -> &str {
        self.service.as_str()
    }

    fn property(&self, name: &str) -> Option<String> {
        self.properties.borrow().get(name).cloned()
    }

    fn set_property(&self, name: &str, value: &str) {
        self.properties
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }
}

/// Producer whose filter chain lives in memory.
///
/// Clones share the same chain, mirroring how engine handles refer to one
/// underlying media object.
///
/// # Example
///
/// ```
/// use stackfx_filters::engine::{MemoryFilter, MemoryProducer, Producer};
///
/// let producer = MemoryProducer::new().with_filter(MemoryFilter::new("boxblur"));
/// assert_eq!(producer.services(), vec![String::from("boxblur")]);
/// assert_eq!(producer.filters().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProducer {
    chain: Rc<RefCell<Vec<FilterHandle>>>,
}

impl MemoryProducer {
    /// Creates a producer with no filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter at the pipeline level.
    #[must_use]
    pub fn with_filter(self, filter: MemoryFilter) -> Self {
        self.chain.borrow_mut().push(Rc::new(filter));
        self
    }

    /// Returns the backend services of the chain, in processing order.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        self.chain
            .borrow()
            .iter()
            .map(|filter| filter.service().to_owned())
            .collect()
    }

    /// Returns the number of filters in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.borrow().len()
    }

    /// Returns `true` when the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.borrow().is_empty()
    }
}

impl Producer for MemoryProducer {
    fn filters(&self) -> Vec<FilterHandle> {
        self.chain.borrow().clone()
    }

    fn attach_filter(
        &mut self,
        service: &str,
        position: usize,
    ) -> Result<FilterHandle, EngineError> {
        let mut chain = self.chain.borrow_mut();
        if position > chain.len() {
            return Err(EngineError::new(format!(
                "position {position} exceeds chain length {}",
                chain.len()
            )));
        }
        let filter: FilterHandle = Rc::new(MemoryFilter::new(service));
        chain.insert(position, Rc::clone(&filter));
        Ok(filter)
    }

    fn detach_filter(&mut self, filter: &FilterHandle) -> Result<(), EngineError> {
        let mut chain = self.chain.borrow_mut();
        let position = chain
            .iter()
            .position(|candidate| same_filter(candidate, filter))
            .ok_or_else(|| EngineError::new("filter is not attached to this producer"))?;
        chain.remove(position);
        Ok(())
    }
}
