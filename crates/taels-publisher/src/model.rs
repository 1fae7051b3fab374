//! Drives the consumer chain from the root to a fixpoint.

use tracing::debug;

use crate::TRAVERSAL_TARGET;
use crate::component::Node;
use crate::consumer::ConsumerChain;
use crate::error::PublishError;
use crate::path::Stack;
use crate::request::Request;

/// Deepest node reached plus the segments nothing could consume.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The node traversal stopped on.
    pub model: Node,
    /// Unconsumed segments, in path order.
    pub leftover: Stack,
}

/// Walks the object graph one segment at a time.
#[derive(Debug, Clone, Default)]
pub struct ModelResolver {
    chain: ConsumerChain,
}

impl ModelResolver {
    /// Creates a resolver over `chain`.
    #[must_use]
    pub const fn new(chain: ConsumerChain) -> Self {
        Self { chain }
    }

    /// The consumers this resolver drives.
    #[must_use]
    pub const fn chain(&self) -> &ConsumerChain {
        &self.chain
    }

    /// Consumes segments from `stack` starting at `root`.
    ///
    /// Stops when the stack is empty or a full pass over the applicable
    /// consumers declines. Leftover segments are not an error here.
    ///
    /// # Errors
    ///
    /// Only cancellation and errors raised by consumers themselves.
    pub async fn resolve(
        &self,
        request: &Request,
        root: Node,
        mut stack: Stack,
    ) -> Result<Resolution, PublishError> {
        let mut current = root;
        while let Some(segment) = stack.front() {
            let Some(next) = self.chain.advance(request, &current, &stack).await? else {
                debug!(
                    target: TRAVERSAL_TARGET,
                    node = current.type_name(),
                    segment = %segment,
                    leftover = stack.len(),
                    "traversal stalled"
                );
                break;
            };
            debug!(
                target: TRAVERSAL_TARGET,
                from = current.type_name(),
                to = next.type_name(),
                segment = %segment,
                "segment consumed"
            );
            stack.pop_front();
            current = next;
        }
        Ok(Resolution {
            model: current,
            leftover: stack,
        })
    }
}
