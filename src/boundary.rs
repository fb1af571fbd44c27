use std::fmt;

use tracing::{error, warn};

use crate::error::{Error, Result};
use crate::vector::Vector2;

/// The grid edge an out-of-range access crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Edge::Top => "top",
            Edge::Bottom => "bottom",
            Edge::Left => "left",
            Edge::Right => "right",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::Read => "read",
            Access::Write => "write",
        })
    }
}

/// Callbacks invoked by the grid when an access falls outside it.
///
/// Returning `Ok` lets the access continue with its edge behaviour (a blank
/// for reads, growth or a skipped write for writes). Returning `Err` aborts
/// the step before anything is mutated.
pub trait BoundaryHooks {
    fn on_read(&mut self, edge: Edge, position: Vector2) -> Result<()>;
    fn on_write(&mut self, edge: Edge, position: Vector2) -> Result<()>;
}

/// What an [`EdgePolicy`] does for one edge and access kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeAction {
    /// Abort the step with [`Error::Boundary`].
    Fatal,
    /// Log a warning and continue.
    Warn,
    /// Continue silently.
    Permit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeHook {
    pub read: EdgeAction,
    pub write: EdgeAction,
}

/// A table-driven policy with an independent hook per edge.
///
/// The default lets a program extend the grid downward and rightward but
/// never upward or leftward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgePolicy {
    pub top: EdgeHook,
    pub bottom: EdgeHook,
    pub left: EdgeHook,
    pub right: EdgeHook,
}

impl Default for EdgePolicy {
    fn default() -> Self {
        let fatal = EdgeHook {
            read: EdgeAction::Fatal,
            write: EdgeAction::Fatal,
        };
        let elastic = EdgeHook {
            read: EdgeAction::Warn,
            write: EdgeAction::Permit,
        };
        Self {
            top: fatal,
            bottom: elastic,
            left: fatal,
            right: elastic,
        }
    }
}

impl EdgePolicy {
    /// A policy that never aborts: every edge warns on read and permits writes.
    pub fn permissive() -> Self {
        let hook = EdgeHook {
            read: EdgeAction::Warn,
            write: EdgeAction::Permit,
        };
        Self {
            top: hook,
            bottom: hook,
            left: hook,
            right: hook,
        }
    }

    fn hook(&self, edge: Edge) -> EdgeHook {
        match edge {
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
            Edge::Left => self.left,
            Edge::Right => self.right,
        }
    }

    fn apply(&self, edge: Edge, access: Access, position: Vector2) -> Result<()> {
        let hook = self.hook(edge);
        let action = match access {
            Access::Read => hook.read,
            Access::Write => hook.write,
        };
        match action {
            EdgeAction::Fatal => {
                error!(%position, "cannot {} past {} of grid", access, edge);
                Err(Error::Boundary {
                    edge,
                    access,
                    position,
                })
            }
            EdgeAction::Warn => {
                warn!(%position, "{}", warning(edge, access));
                Ok(())
            }
            EdgeAction::Permit => Ok(()),
        }
    }
}

fn warning(edge: Edge, access: Access) -> &'static str {
    match (edge, access) {
        (Edge::Bottom, Access::Read) => "reading below bottom-most character",
        (Edge::Right, Access::Read) => "reading right of right-most character",
        (Edge::Top, Access::Read) => "reading above top-most character",
        (Edge::Left, Access::Read) => "reading left of left-most character",
        (Edge::Bottom, Access::Write) => "writing below bottom-most character",
        (Edge::Right, Access::Write) => "writing right of right-most character",
        (Edge::Top, Access::Write) => "writing above top-most character",
        (Edge::Left, Access::Write) => "writing left of left-most character",
    }
}

impl BoundaryHooks for EdgePolicy {
    fn on_read(&mut self, edge: Edge, position: Vector2) -> Result<()> {
        self.apply(edge, Access::Read, position)
    }

    fn on_write(&mut self, edge: Edge, position: Vector2) -> Result<()> {
        self.apply(edge, Access::Write, position)
    }
}

/// One out-of-range access observed by [`RecordingHooks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub edge: Edge,
    pub access: Access,
    pub position: Vector2,
}

/// Hooks that collect every violation and never abort.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    pub violations: Vec<Violation>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BoundaryHooks for RecordingHooks {
    fn on_read(&mut self, edge: Edge, position: Vector2) -> Result<()> {
        self.violations.push(Violation {
            edge,
            access: Access::Read,
            position,
        });
        Ok(())
    }

    fn on_write(&mut self, edge: Edge, position: Vector2) -> Result<()> {
        self.violations.push(Violation {
            edge,
            access: Access::Write,
            position,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_top_and_left_are_fatal() {
        let mut policy = EdgePolicy::default();
        let at = Vector2::new(-1, 0);
        for edge in [Edge::Top, Edge::Left] {
            assert!(matches!(
                policy.on_read(edge, at),
                Err(Error::Boundary { access: Access::Read, .. })
            ));
            assert!(matches!(
                policy.on_write(edge, at),
                Err(Error::Boundary { access: Access::Write, .. })
            ));
        }
    }

    #[test]
    fn default_bottom_and_right_continue() {
        let mut policy = EdgePolicy::default();
        let at = Vector2::new(100, 100);
        for edge in [Edge::Bottom, Edge::Right] {
            assert!(policy.on_read(edge, at).is_ok());
            assert!(policy.on_write(edge, at).is_ok());
        }
    }

    #[test]
    fn permissive_never_fails() {
        let mut policy = EdgePolicy::permissive();
        for edge in [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right] {
            assert!(policy.on_read(edge, Vector2::ZERO).is_ok());
            assert!(policy.on_write(edge, Vector2::ZERO).is_ok());
        }
    }

    #[test]
    fn recording_hooks_collect_in_order() {
        let mut hooks = RecordingHooks::new();
        hooks.on_read(Edge::Left, Vector2::new(-1, 2)).unwrap();
        hooks.on_write(Edge::Bottom, Vector2::new(0, 9)).unwrap();
        assert_eq!(
            hooks.violations,
            vec![
                Violation {
                    edge: Edge::Left,
                    access: Access::Read,
                    position: Vector2::new(-1, 2),
                },
                Violation {
                    edge: Edge::Bottom,
                    access: Access::Write,
                    position: Vector2::new(0, 9),
                },
            ]
        );
    }

    #[test]
    fn boundary_error_message() {
        let err = EdgePolicy::default()
            .on_write(Edge::Top, Vector2::new(0, -1))
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot write past top of grid at {x: 0, y: -1}");
    }
}
