use crate::handlers::{
    FileHandler, JavaHandler, PythonHandler, RHandler, SasHandler, StataHandler,
};
use crate::node::{AssetKind, AssetNode, HandlerId};
use crate::Result;

/// A scanner stage that attaches one kind of metadata to assets.
///
/// Implementations must be idempotent: a node that already carries a record
/// with this handler's id is returned unchanged.
pub trait AssetHandler: Send + Sync {
    fn id(&self) -> HandlerId;

    fn scan(&self, node: AssetNode) -> AssetNode;
}

/// Rebuild a directory node with every child passed through `f`
pub(crate) fn map_children(mut node: AssetNode, f: impl Fn(AssetNode) -> AssetNode) -> AssetNode {
    if let AssetKind::Directory { children } = &mut node.kind {
        let scanned = std::mem::take(children).into_iter().map(f).collect();
        *children = scanned;
    }
    node
}

/// Ordered chain of handlers folded over every node
pub struct HandlerPipeline {
    handlers: Vec<Box<dyn AssetHandler>>,
}

impl HandlerPipeline {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// File stats, then one handler per language in `HandlerId::ALL` order
    pub fn standard() -> Self {
        Self::new()
            .with_handler(FileHandler::default())
            .with_handler(PythonHandler)
            .with_handler(RHandler)
            .with_handler(SasHandler)
            .with_handler(StataHandler)
            .with_handler(JavaHandler)
    }

    /// Build a pipeline from configured handler ids, keeping their order.
    /// `hidden` feeds the file handler's include flag.
    pub fn from_ids(ids: &[HandlerId], hidden: &[String]) -> Result<Self> {
        let mut pipeline = Self::new();
        for id in ids {
            if pipeline.handler_ids().contains(id) {
                log::warn!("Handler {} configured twice, keeping the first", id.as_str());
                continue;
            }
            pipeline = match id {
                HandlerId::File => pipeline.with_handler(FileHandler::with_patterns(hidden)?),
                HandlerId::Python => pipeline.with_handler(PythonHandler),
                HandlerId::R => pipeline.with_handler(RHandler),
                HandlerId::Sas => pipeline.with_handler(SasHandler),
                HandlerId::Stata => pipeline.with_handler(StataHandler),
                HandlerId::Java => pipeline.with_handler(JavaHandler),
            };
        }
        Ok(pipeline)
    }

    pub fn with_handler(mut self, handler: impl AssetHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn handler_ids(&self) -> Vec<HandlerId> {
        self.handlers.iter().map(|handler| handler.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Fold the node through every handler in order. Each handler recurses
    /// into directory children on its own.
    pub fn apply(&self, node: AssetNode) -> AssetNode {
        self.handlers.iter().fold(node, |node, handler| {
            log::debug!("Applying {} to {}", handler.id().as_str(), node.key);
            handler.scan(node)
        })
    }
}

impl Default for HandlerPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
