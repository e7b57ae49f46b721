//! Event handler system
//!
//! Provides a registry for event handlers that project board events into
//! entity updates. Each handler receives a [`ProjectionContext`] and stages
//! its writes there; the registry turns one decoded event into one
//! [`ChangeSet`].
//!
//! # Example
//!
//! ```no_run
//! use betboard::prelude::*;
//! use betboard::{EventHandler, EventHandlerRegistry, ProjectionContext};
//!
//! // Log every created bet without touching the projection
//! struct AuditHandler;
//!
//! impl EventHandler for AuditHandler {
//!     fn event_type(&self) -> &str {
//!         "BetCreated"
//!     }
//!
//!     fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
//!         tracing::info!(sender = %ctx.sender(), "{:?}", event);
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = EventHandlerRegistry::new();
//! registry.register(Box::new(AuditHandler));
//! ```

use crate::context::ProjectionContext;
use crate::handlers::{
    BetCreatedHandler, BetPlacedHandler, BetRefundHandler, BetStateChangedHandler,
    BetVotedOnHandler, DisputeHandler, EvidenceHandler, MetaEvidenceHandler, RulingHandler,
};
use betboard_core::{
    BoardError, ChangeSet, ContractReader, ContractSnapshot, DecodedEvent, EntityStore,
    GambleEvent, Result,
};
use std::collections::HashMap;

/// Event handler trait
///
/// Implement this to define how one event type changes the projection.
/// Handlers must stage every write through the context and must not assume
/// anything reaches the store unless the whole event succeeds.
pub trait EventHandler: Send + Sync {
    /// The event type this handler processes (e.g. "BetCreated")
    fn event_type(&self) -> &str;

    /// Handle a single event, staging entity writes in `ctx`
    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()>;
}

/// Event handler registry
///
/// Routes decoded events to the handler registered for their name.
pub struct EventHandlerRegistry {
    handlers: HashMap<String, Box<dyn EventHandler>>,
}

impl EventHandlerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the full gamble board handler set.
    pub fn gamble_board() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BetCreatedHandler));
        registry.register(Box::new(BetPlacedHandler));
        registry.register(Box::new(BetStateChangedHandler));
        registry.register(Box::new(BetRefundHandler));
        registry.register(Box::new(BetVotedOnHandler));
        registry.register(Box::new(DisputeHandler));
        registry.register(Box::new(EvidenceHandler));
        registry.register(Box::new(RulingHandler));
        registry.register(Box::new(MetaEvidenceHandler));
        registry
    }

    /// Register an event handler
    ///
    /// Panics if a handler for the same event type is already registered.
    pub fn register(&mut self, handler: Box<dyn EventHandler>) {
        let event_type = handler.event_type().to_string();
        if self.handlers.contains_key(&event_type) {
            panic!("Handler for event type '{}' already registered", event_type);
        }
        self.handlers.insert(event_type, handler);
    }

    /// Try to register a handler, returning error if already registered
    pub fn try_register(&mut self, handler: Box<dyn EventHandler>) -> Result<()> {
        let event_type = handler.event_type().to_string();
        if self.handlers.contains_key(&event_type) {
            return Err(BoardError::InvalidState(format!(
                "Handler for event type '{}' already registered",
                event_type
            )));
        }
        self.handlers.insert(event_type, handler);
        Ok(())
    }

    /// Get a handler by event type
    pub fn get(&self, event_type: &str) -> Option<&dyn EventHandler> {
        self.handlers.get(event_type).map(|h| h.as_ref())
    }

    /// Run the handler for `decoded` and return the writes it staged.
    ///
    /// Contract reads are frozen at the event's block. The store is only
    /// read here; see [`apply`](Self::apply) to commit.
    pub fn project(
        &self,
        store: &dyn EntityStore,
        reader: &dyn ContractReader,
        decoded: &DecodedEvent,
    ) -> Result<ChangeSet> {
        let event_type = decoded.event.name();
        let handler = self.get(event_type).ok_or_else(|| {
            BoardError::Decode(format!("No handler for event type '{}'", event_type))
        })?;

        let snapshot = ContractSnapshot::new(reader, decoded.envelope.block_number());
        let mut ctx = ProjectionContext::new(store, snapshot, &decoded.envelope);
        handler.handle(&mut ctx, &decoded.event)?;
        Ok(ctx.into_changes())
    }

    /// Project `decoded` and commit its writes together with its position.
    pub fn apply(
        &self,
        store: &dyn EntityStore,
        reader: &dyn ContractReader,
        decoded: &DecodedEvent,
    ) -> Result<ChangeSet> {
        let changes = self.project(store, reader, decoded)?;
        store.commit(changes.clone())?;
        Ok(changes)
    }

    /// List all registered event types, sorted
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        types.sort_unstable();
        types
    }
}

impl Default for EventHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
