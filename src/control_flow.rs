//! The per-thread stack of resumption points.
//!
//! Every active try region (and every boundary driver) owns one
//! `ControlFlowNode` that lives in its own stack frame. `push` links the
//! node in as the thread's head and hands back a `Guard` that borrows it;
//! dropping the guard pops it again. Because the guard borrows the node, the
//! node can neither move nor die while it is linked, and because guards drop
//! in reverse order, popping is always LIFO, including while unwinding.
//!
//! Linking nodes is private to the crate: a leaked guard would leave the head
//! pointing into a dead frame. Only [`head`] and [`depth`] are public.
//!
//! ```compile_fail
//! use uwucatch::control_flow::{push, ControlFlowNode, NodeKind};
//!
//! let node = ControlFlowNode::new(NodeKind::Region);
//! std::mem::forget(push(&node));
//! ```
//!
//! The head pointer is thread local, so threads never see each other's
//! nodes.


use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::num::NonZeroU64;
use core::ptr;

/// Identifies one capture of "where to resume", unique on its thread for the
/// lifetime of the thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResumptionPoint(NonZeroU64);

impl ResumptionPoint {
    fn next() -> Self {
        NEXT_POINT.with(|next| {
            let point = next.get();
            next.set(point.saturating_add(1));
            ResumptionPoint(point)
        })
    }
}

impl fmt::Display for ResumptionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of code is waiting at a resumption point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A try region, which dispatches to its catch handlers.
    Region,
    /// A top-level driver, which receives uncaught exceptions as a terminal
    /// outcome.
    Boundary,
}

#[derive(Debug)]
pub(crate) struct ControlFlowNode {
    resumption_point: ResumptionPoint,
    kind: NodeKind,
    /// The enclosing node, only meaningful while this node is linked.
    next: Cell<*const ControlFlowNode>,
}

impl ControlFlowNode {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            resumption_point: ResumptionPoint::next(),
            kind,
            next: Cell::new(ptr::null()),
        }
    }

    pub(crate) fn resumption_point(&self) -> ResumptionPoint {
        self.resumption_point
    }
}

/// The parts of the head node that control transfer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub resumption_point: ResumptionPoint,
    pub kind: NodeKind,
}

thread_local! {
    static HEAD: Cell<*const ControlFlowNode> = const { Cell::new(ptr::null()) };
    static NEXT_POINT: Cell<NonZeroU64> = const { Cell::new(NonZeroU64::MIN) };
}

/// Keeps a node linked as the head of the calling thread's stack. Dropping it
/// is the region-exit hook.
#[must_use = "the node is popped as soon as the guard is dropped"]
pub(crate) struct Guard<'node> {
    node: &'node ControlFlowNode,
    // The stack is per thread, so the guard must not leave the thread.
    _not_send: PhantomData<*const ()>,
}

impl Guard<'_> {
    #[cfg(test)]
    pub(crate) fn resumption_point(&self) -> ResumptionPoint {
        self.node.resumption_point
    }
}

impl Drop for Guard<'_> {
    fn drop(&mut self) {
        let popped = pop();
        debug_assert_eq!(
            popped,
            Some(self.node.resumption_point),
            "control flow stack popped out of order"
        );
    }
}

/// Links `node` as the new head of the calling thread's stack.
pub(crate) fn push(node: &ControlFlowNode) -> Guard<'_> {
    HEAD.with(|head| {
        debug_assert!(!ptr::eq(head.get(), node), "node pushed twice");
        node.next.set(head.get());
        head.set(node as *const ControlFlowNode);
    });
    trace!(point = %node.resumption_point, kind = ?node.kind, "push");
    Guard {
        node,
        _not_send: PhantomData,
    }
}

/// Unlinks the head, returning its resumption point, or `None` when the
/// stack is empty. The node itself stays owned by its region.
fn pop() -> Option<ResumptionPoint> {
    // May run from a guard dropped during thread teardown.
    HEAD.try_with(|head| {
        let top = head.get();
        if top.is_null() {
            return None;
        }
        // SAFETY: linked nodes are kept alive by their guard, which is the
        // only thing that pops them.
        let top = unsafe { &*top };
        head.set(top.next.replace(ptr::null()));
        trace!(point = %top.resumption_point, "pop");
        Some(top.resumption_point)
    })
    .ok()
    .flatten()
}

/// Returns the head of the calling thread's stack, or `None` when no region
/// or boundary is active.
pub fn head() -> Option<Head> {
    HEAD.with(|head| {
        let top = head.get();
        // SAFETY: see `pop`.
        unsafe { top.as_ref() }.map(|node| Head {
            resumption_point: node.resumption_point,
            kind: node.kind,
        })
    })
}

/// The number of nodes linked on the calling thread.
pub fn depth() -> usize {
    HEAD.with(|head| {
        let mut depth = 0;
        let mut node = head.get();
        // SAFETY: see `pop`.
        while let Some(current) = unsafe { node.as_ref() } {
            depth += 1;
            node = current.next.get();
        }
        depth
    })
}
